//! Raw audio format description and parsing.
//!
//! [`AudioInfo`] is the parsed, fixed form of a format [`ParamObject`]. The node
//! stores exactly one `AudioInfo` for all of its ports once negotiation starts.

use crate::error::{NodeError, Result};
use crate::params::ParamType;
use crate::pod::{Key, ObjectType, ParamObject, Value};

macro_rules! id_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $id:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Wire id of this value.
            pub const fn id(self) -> u32 {
                match self {
                    $(Self::$variant => $id),+
                }
            }

            /// Looks up a value by wire id.
            pub const fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

id_enum! {
    /// Top-level media type.
    MediaType {
        /// Audio data.
        Audio = 1,
        /// Video data.
        Video = 2,
    }
}

id_enum! {
    /// Media subtype.
    MediaSubtype {
        /// Uncompressed samples.
        Raw = 1,
        /// Encoded bitstream.
        Compressed = 2,
    }
}

id_enum! {
    /// Sample representation.
    AudioFormat {
        /// Unrecognized sample format.
        Unknown = 0,
        /// Signed 16-bit integer.
        S16 = 1,
        /// Signed 32-bit integer.
        S32 = 2,
        /// 32-bit IEEE float.
        F32 = 3,
        /// 64-bit IEEE float.
        F64 = 4,
    }
}

id_enum! {
    /// Channel sample arrangement.
    AudioLayout {
        /// Samples of all channels alternate within one block.
        Interleaved = 0,
        /// Each channel lives in its own block.
        NonInterleaved = 1,
    }
}

impl AudioFormat {
    /// Size of one sample in bytes, or 0 if unknown.
    pub const fn sample_size(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// A fully fixed raw audio format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    /// Sample representation.
    pub format: AudioFormat,
    /// Sample arrangement.
    pub layout: AudioLayout,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Number of channels.
    pub channels: u32,
}

impl AudioInfo {
    /// Creates a format description.
    pub const fn new(format: AudioFormat, layout: AudioLayout, rate: u32, channels: u32) -> Self {
        Self {
            format,
            layout,
            rate,
            channels,
        }
    }

    /// Parses a format object.
    ///
    /// Fails with [`NodeError::NotRawAudio`] if the media type or subtype is not
    /// raw audio, and with [`NodeError::MalformedFormat`] if a required field is
    /// missing or not fixed. A missing layout defaults to interleaved; an
    /// unrecognized sample format id parses as [`AudioFormat::Unknown`].
    pub fn parse(object: &ParamObject) -> Result<Self> {
        let media_type = object
            .id_value(Key::MediaType)
            .ok_or(NodeError::MalformedFormat("media type"))?;
        let media_subtype = object
            .id_value(Key::MediaSubtype)
            .ok_or(NodeError::MalformedFormat("media subtype"))?;
        if MediaType::from_id(media_type) != Some(MediaType::Audio)
            || MediaSubtype::from_id(media_subtype) != Some(MediaSubtype::Raw)
        {
            return Err(NodeError::NotRawAudio);
        }

        let format = object
            .id_value(Key::AudioFormat)
            .map(|id| AudioFormat::from_id(id).unwrap_or(AudioFormat::Unknown))
            .ok_or(NodeError::MalformedFormat("sample format"))?;
        let layout = match object.get(Key::AudioLayout) {
            None => AudioLayout::Interleaved,
            Some(Value::Id(id)) => {
                AudioLayout::from_id(id).ok_or(NodeError::MalformedFormat("layout"))?
            }
            Some(_) => return Err(NodeError::MalformedFormat("layout")),
        };
        let rate = fixed_unsigned(object, Key::AudioRate, "rate")?;
        let channels = fixed_unsigned(object, Key::AudioChannels, "channels")?;

        Ok(Self {
            format,
            layout,
            rate,
            channels,
        })
    }

    /// Encodes this format as an object answering parameter `id`.
    pub fn to_object(&self, id: ParamType) -> ParamObject {
        ParamObject::new(ObjectType::Format, id)
            .with(Key::MediaType, Value::Id(MediaType::Audio.id()))
            .with(Key::MediaSubtype, Value::Id(MediaSubtype::Raw.id()))
            .with(Key::AudioFormat, Value::Id(self.format.id()))
            .with(Key::AudioLayout, Value::Id(self.layout.id()))
            .with(Key::AudioRate, Value::Int(saturate(self.rate)))
            .with(Key::AudioChannels, Value::Int(saturate(self.channels)))
    }

    /// Encodes this format as a proposal for [`ParamType::Format`].
    pub fn to_format(&self) -> ParamObject {
        self.to_object(ParamType::Format)
    }

    /// Bytes between consecutive samples of one channel.
    pub const fn stride(&self) -> usize {
        self.format.sample_size()
    }
}

/// The format proposed when nothing has been negotiated yet: 32-bit float,
/// non-interleaved, any rate and channel count from 1 upwards.
pub fn default_enum_format() -> ParamObject {
    ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
        .with(Key::MediaType, Value::Id(MediaType::Audio.id()))
        .with(Key::MediaSubtype, Value::Id(MediaSubtype::Raw.id()))
        .with(Key::AudioFormat, Value::Id(AudioFormat::F32.id()))
        .with(Key::AudioLayout, Value::Id(AudioLayout::NonInterleaved.id()))
        .with(
            Key::AudioRate,
            Value::Range {
                default: 44100,
                min: 1,
                max: i32::MAX,
            },
        )
        .with(
            Key::AudioChannels,
            Value::Range {
                default: 1,
                min: 1,
                max: i32::MAX,
            },
        )
}

fn fixed_unsigned(object: &ParamObject, key: Key, field: &'static str) -> Result<u32> {
    object
        .int_value(key)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(NodeError::MalformedFormat(field))
}

fn saturate(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_48k() -> AudioInfo {
        AudioInfo::new(AudioFormat::F32, AudioLayout::NonInterleaved, 48000, 1)
    }

    #[test]
    fn parse_round_trips_encoded_format() {
        let info = f32_48k();
        assert_eq!(AudioInfo::parse(&info.to_format()), Ok(info));
    }

    #[test]
    fn parse_rejects_non_audio() {
        let obj = f32_48k()
            .to_format()
            .with(Key::MediaType, Value::Id(MediaType::Video.id()));
        assert_eq!(AudioInfo::parse(&obj), Err(NodeError::NotRawAudio));

        let obj = f32_48k()
            .to_format()
            .with(Key::MediaSubtype, Value::Id(MediaSubtype::Compressed.id()));
        assert_eq!(AudioInfo::parse(&obj), Err(NodeError::NotRawAudio));
    }

    #[test]
    fn parse_rejects_unfixed_rate() {
        let obj = f32_48k().to_format().with(
            Key::AudioRate,
            Value::Range {
                default: 48000,
                min: 1,
                max: 96000,
            },
        );
        assert_eq!(
            AudioInfo::parse(&obj),
            Err(NodeError::MalformedFormat("rate"))
        );
    }

    #[test]
    fn missing_layout_defaults_to_interleaved() {
        let obj = ParamObject::new(ObjectType::Format, ParamType::Format)
            .with(Key::MediaType, Value::Id(MediaType::Audio.id()))
            .with(Key::MediaSubtype, Value::Id(MediaSubtype::Raw.id()))
            .with(Key::AudioFormat, Value::Id(AudioFormat::F32.id()))
            .with(Key::AudioRate, Value::Int(44100))
            .with(Key::AudioChannels, Value::Int(1));
        let info = AudioInfo::parse(&obj).unwrap();
        assert_eq!(info.layout, AudioLayout::Interleaved);
    }

    #[test]
    fn unknown_sample_format_parses_as_unknown() {
        let obj = f32_48k()
            .to_format()
            .with(Key::AudioFormat, Value::Id(99));
        assert_eq!(AudioInfo::parse(&obj).unwrap().format, AudioFormat::Unknown);
    }

    #[test]
    fn stride_is_sample_width() {
        assert_eq!(f32_48k().stride(), 4);
        let s16 = AudioInfo::new(AudioFormat::S16, AudioLayout::Interleaved, 8000, 2);
        assert_eq!(s16.stride(), 2);
    }

    #[test]
    fn default_proposal_is_float_non_interleaved() {
        let obj = default_enum_format();
        assert_eq!(obj.id(), ParamType::EnumFormat);
        assert_eq!(obj.id_value(Key::AudioFormat), Some(AudioFormat::F32.id()));
        assert_eq!(
            obj.id_value(Key::AudioLayout),
            Some(AudioLayout::NonInterleaved.id())
        );
        assert!(matches!(
            obj.get(Key::AudioRate),
            Some(Value::Range { min: 1, .. })
        ));
    }
}
