//! Capability enumeration.
//!
//! Ports answer negotiation queries one candidate at a time. The caller passes
//! a cursor that is advanced by exactly one for every candidate produced, and
//! end-of-list is `Ok(None)`. Each candidate is run through
//! [`pod::filter`](crate::pod::filter) before it is returned; a rejected
//! candidate is skipped and the next index is tried.
//!
//! [`ParamIter`] wraps the cursor protocol as a restartable iterator.

use crate::buffer::MetaType;
use crate::error::{NodeError, Result};
use crate::format::{AudioInfo, default_enum_format};
use crate::io::IoType;
use crate::node::FloatMix;
use crate::pod::{self, Key, ObjectType, ParamObject, Value};
use crate::port::Direction;
use crate::{BUFFER_ALIGN, DEFAULT_BUFFER_SAMPLES, MAX_BUFFERS, MIN_BUFFER_SAMPLES};

/// Parameter categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// The list of supported categories.
    List,
    /// Property descriptions.
    PropInfo,
    /// Property values.
    Props,
    /// Candidate formats.
    EnumFormat,
    /// The negotiated format.
    Format,
    /// Buffer geometry.
    Buffers,
    /// Supported metadata.
    Meta,
    /// Supported IO areas.
    Io,
}

impl ParamType {
    /// Categories a port of this node answers, in advertisement order.
    pub const PORT_PARAMS: [Self; 5] = [
        Self::EnumFormat,
        Self::Format,
        Self::Buffers,
        Self::Meta,
        Self::Io,
    ];

    /// Wire id.
    pub const fn id(self) -> u32 {
        match self {
            Self::List => 1,
            Self::PropInfo => 2,
            Self::Props => 3,
            Self::EnumFormat => 4,
            Self::Format => 5,
            Self::Buffers => 6,
            Self::Meta => 7,
            Self::Io => 8,
        }
    }

    /// Looks up a category by wire id.
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::List),
            2 => Some(Self::PropInfo),
            3 => Some(Self::Props),
            4 => Some(Self::EnumFormat),
            5 => Some(Self::Format),
            6 => Some(Self::Buffers),
            7 => Some(Self::Meta),
            8 => Some(Self::Io),
            _ => None,
        }
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::PropInfo => "prop-info",
            Self::Props => "props",
            Self::EnumFormat => "enum-format",
            Self::Format => "format",
            Self::Buffers => "buffers",
            Self::Meta => "meta",
            Self::Io => "io",
        }
    }
}

/// Port state the enumerator needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PortQuery<'a> {
    pub direction: Direction,
    pub port_id: u32,
    pub have_format: bool,
    pub format: Option<&'a AudioInfo>,
    pub stride: usize,
}

impl PortQuery<'_> {
    fn require_format(&self) -> Result<&AudioInfo> {
        match self.format {
            Some(format) if self.have_format => Ok(format),
            _ => Err(NodeError::NoFormat {
                direction: self.direction,
                port_id: self.port_id,
            }),
        }
    }

    /// Candidate number `index` of category `id`, unfiltered.
    fn candidate(&self, id: ParamType, index: u32) -> Result<Option<ParamObject>> {
        let index = index as usize;
        let param = match id {
            ParamType::List => ParamType::PORT_PARAMS.get(index).map(|p| {
                ParamObject::new(ObjectType::ParamList, id).with(Key::ListId, Value::Id(p.id()))
            }),
            ParamType::EnumFormat => (index == 0).then(|| match self.format {
                Some(format) => format.to_object(ParamType::EnumFormat),
                None => default_enum_format(),
            }),
            ParamType::Format => {
                let format = self.require_format()?;
                (index == 0).then(|| format.to_object(ParamType::Format))
            }
            ParamType::Buffers => {
                self.require_format()?;
                (index == 0).then(|| self.buffers_param())
            }
            ParamType::Meta => {
                self.require_format()?;
                (index == 0).then(|| {
                    ParamObject::new(ObjectType::ParamMeta, id)
                        .with(Key::MetaType, Value::Id(MetaType::Header.id()))
                        .with(Key::MetaSize, Value::Int(MetaType::Header.size() as i32))
                })
            }
            ParamType::Io => IoType::ALL.get(index).map(|io| {
                ParamObject::new(ObjectType::ParamIo, id)
                    .with(Key::IoId, Value::Id(io.id()))
                    .with(Key::IoSize, Value::Int(io.wire_size() as i32))
            }),
            ParamType::PropInfo | ParamType::Props => return Err(NodeError::UnknownParam(id)),
        };
        Ok(param)
    }

    fn buffers_param(&self) -> ParamObject {
        let stride = self.stride.max(1) as i32;
        ParamObject::new(ObjectType::ParamBuffers, ParamType::Buffers)
            .with(
                Key::BuffersBuffers,
                Value::Range {
                    default: 1,
                    min: 1,
                    max: MAX_BUFFERS as i32,
                },
            )
            .with(Key::BuffersBlocks, Value::Int(1))
            .with(
                Key::BuffersSize,
                Value::Range {
                    default: DEFAULT_BUFFER_SAMPLES as i32 * stride,
                    min: MIN_BUFFER_SAMPLES as i32 * stride,
                    max: i32::MAX / stride,
                },
            )
            .with(Key::BuffersStride, Value::Int(stride))
            .with(Key::BuffersAlign, Value::Int(BUFFER_ALIGN as i32))
    }

    /// Produces the next candidate that passes `filter`, advancing `index`.
    pub(crate) fn enumerate(
        &self,
        id: ParamType,
        index: &mut u32,
        filter: Option<&ParamObject>,
    ) -> Result<Option<ParamObject>> {
        loop {
            let Some(candidate) = self.candidate(id, *index)? else {
                return Ok(None);
            };
            *index += 1;
            if let Some(param) = pod::filter(&candidate, filter) {
                return Ok(Some(param));
            }
        }
    }
}

/// Restartable iterator over one parameter category of a port.
///
/// Yields each filtered candidate in index order. An error is yielded once and
/// ends the iteration; [`reset`](Self::reset) rewinds to index 0.
///
/// ```rust
/// use floatmix_core::{Direction, FloatMix, ParamType};
///
/// let node = FloatMix::new();
/// let mut io = node.port_params(Direction::Output, 0, ParamType::Io, None);
/// assert_eq!(io.by_ref().count(), 3);
/// io.reset();
/// assert_eq!(io.count(), 3);
/// ```
#[derive(Debug)]
pub struct ParamIter<'a> {
    node: &'a FloatMix,
    direction: Direction,
    port_id: u32,
    id: ParamType,
    filter: Option<&'a ParamObject>,
    index: u32,
    done: bool,
}

impl<'a> ParamIter<'a> {
    pub(crate) fn new(
        node: &'a FloatMix,
        direction: Direction,
        port_id: u32,
        id: ParamType,
        filter: Option<&'a ParamObject>,
    ) -> Self {
        Self {
            node,
            direction,
            port_id,
            id,
            filter,
            index: 0,
            done: false,
        }
    }

    /// Rewinds to the first candidate.
    pub fn reset(&mut self) {
        self.index = 0;
        self.done = false;
    }

    /// Cursor position of the next call.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Iterator for ParamIter<'_> {
    type Item = Result<ParamObject>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.node.port_enum_params(
            self.direction,
            self.port_id,
            self.id,
            &mut self.index,
            self.filter,
        ) {
            Ok(Some(param)) => Some(Ok(param)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, AudioLayout};

    const F32_48K: AudioInfo = AudioInfo::new(AudioFormat::F32, AudioLayout::NonInterleaved, 48000, 1);

    fn negotiated() -> PortQuery<'static> {
        PortQuery {
            direction: Direction::Input,
            port_id: 0,
            have_format: true,
            format: Some(&F32_48K),
            stride: 4,
        }
    }

    fn fresh() -> PortQuery<'static> {
        PortQuery {
            direction: Direction::Input,
            port_id: 0,
            have_format: false,
            format: None,
            stride: 0,
        }
    }

    fn collect(q: &PortQuery<'_>, id: ParamType, filter: Option<&ParamObject>) -> Vec<ParamObject> {
        let mut index = 0;
        let mut out = Vec::new();
        while let Some(p) = q.enumerate(id, &mut index, filter).unwrap() {
            out.push(p);
        }
        out
    }

    #[test]
    fn list_advertises_five_categories() {
        let ids: Vec<u32> = collect(&fresh(), ParamType::List, None)
            .iter()
            .filter_map(|p| p.id_value(Key::ListId))
            .collect();
        let expected: Vec<u32> = ParamType::PORT_PARAMS.iter().map(|p| p.id()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn cursor_advances_once_per_result() {
        let q = fresh();
        let mut index = 0;
        assert!(q.enumerate(ParamType::Io, &mut index, None).unwrap().is_some());
        assert_eq!(index, 1);
        q.enumerate(ParamType::Io, &mut index, None).unwrap();
        q.enumerate(ParamType::Io, &mut index, None).unwrap();
        assert_eq!(index, 3);
        assert_eq!(q.enumerate(ParamType::Io, &mut index, None), Ok(None));
        assert_eq!(index, 3);
    }

    #[test]
    fn enum_format_defaults_then_follows_negotiation() {
        let default = collect(&fresh(), ParamType::EnumFormat, None);
        assert_eq!(default, vec![default_enum_format()]);

        let fixed = collect(&negotiated(), ParamType::EnumFormat, None);
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].int_value(Key::AudioRate), Some(48000));
    }

    #[test]
    fn format_queries_need_negotiation() {
        let q = fresh();
        for id in [ParamType::Format, ParamType::Buffers, ParamType::Meta] {
            let err = q.enumerate(id, &mut 0, None).unwrap_err();
            assert!(matches!(err, NodeError::NoFormat { .. }));
        }
    }

    #[test]
    fn buffers_geometry_scales_with_stride() {
        let params = collect(&negotiated(), ParamType::Buffers, None);
        let p = &params[0];
        assert_eq!(
            p.get(Key::BuffersSize),
            Some(Value::Range {
                default: 4096,
                min: 64,
                max: i32::MAX / 4
            })
        );
        assert_eq!(p.int_value(Key::BuffersStride), Some(4));
        assert_eq!(p.int_value(Key::BuffersAlign), Some(16));
        assert_eq!(p.int_value(Key::BuffersBlocks), Some(1));
    }

    #[test]
    fn meta_advertises_header() {
        let params = collect(&negotiated(), ParamType::Meta, None);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].int_value(Key::MetaSize), Some(24));
    }

    #[test]
    fn rejected_candidate_skips_to_next_index() {
        let want_range = ParamObject::new(ObjectType::ParamIo, ParamType::Io)
            .with(Key::IoId, Value::Id(IoType::Range.id()));
        let q = fresh();
        let mut index = 0;
        let p = q
            .enumerate(ParamType::Io, &mut index, Some(&want_range))
            .unwrap()
            .unwrap();
        assert_eq!(p.int_value(Key::IoSize), Some(16));
        assert_eq!(index, 2);
        assert_eq!(q.enumerate(ParamType::Io, &mut index, Some(&want_range)), Ok(None));
    }

    #[test]
    fn props_are_unknown() {
        assert_eq!(
            fresh().enumerate(ParamType::Props, &mut 0, None),
            Err(NodeError::UnknownParam(ParamType::Props))
        );
    }
}
