//! Opaque negotiable parameter objects.
//!
//! A [`ParamObject`] is a typed bag of key/value properties. Values are either
//! fixed ([`Value::Id`], [`Value::Int`]) or a [`Value::Range`] with a preferred
//! default. Negotiation works by intersecting a candidate object with a filter
//! supplied by the peer: [`filter`] narrows every shared key and rejects the
//! candidate if any intersection is empty.
//!
//! # Example
//!
//! ```rust
//! use floatmix_core::pod::{filter, Key, ObjectType, ParamObject, Value};
//! use floatmix_core::ParamType;
//!
//! let candidate = ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
//!     .with(Key::AudioRate, Value::Range { default: 44100, min: 1, max: i32::MAX });
//! let wanted = ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
//!     .with(Key::AudioRate, Value::Int(48000));
//!
//! let result = filter(&candidate, Some(&wanted)).unwrap();
//! assert_eq!(result.int_value(Key::AudioRate), Some(48000));
//! ```

use core::fmt;

use crate::params::ParamType;

/// Kind of object, which decides which keys are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// A media format description.
    Format,
    /// One entry of the supported-parameter list.
    ParamList,
    /// Buffer geometry requirements.
    ParamBuffers,
    /// A supported metadata kind.
    ParamMeta,
    /// A supported IO area kind.
    ParamIo,
}

impl ObjectType {
    /// Short lowercase name, used for display and serialization.
    pub fn name(self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::ParamList => "param-list",
            Self::ParamBuffers => "param-buffers",
            Self::ParamMeta => "param-meta",
            Self::ParamIo => "param-io",
        }
    }
}

/// Property key inside a [`ParamObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Media type id (see [`MediaType`](crate::MediaType)).
    MediaType,
    /// Media subtype id (see [`MediaSubtype`](crate::MediaSubtype)).
    MediaSubtype,
    /// Sample format id (see [`AudioFormat`](crate::AudioFormat)).
    AudioFormat,
    /// Channel layout id (see [`AudioLayout`](crate::AudioLayout)).
    AudioLayout,
    /// Sample rate in Hz.
    AudioRate,
    /// Number of channels.
    AudioChannels,
    /// Parameter id advertised by a list entry.
    ListId,
    /// Number of buffers.
    BuffersBuffers,
    /// Number of data blocks per buffer.
    BuffersBlocks,
    /// Size of a data block in bytes.
    BuffersSize,
    /// Bytes between consecutive samples.
    BuffersStride,
    /// Required data alignment in bytes.
    BuffersAlign,
    /// Metadata kind id.
    MetaType,
    /// Metadata size in bytes.
    MetaSize,
    /// IO area kind id.
    IoId,
    /// IO area size in bytes.
    IoSize,
}

impl Key {
    /// Short lowercase name, used for display and serialization.
    pub fn name(self) -> &'static str {
        match self {
            Self::MediaType => "media-type",
            Self::MediaSubtype => "media-subtype",
            Self::AudioFormat => "format",
            Self::AudioLayout => "layout",
            Self::AudioRate => "rate",
            Self::AudioChannels => "channels",
            Self::ListId => "id",
            Self::BuffersBuffers => "buffers",
            Self::BuffersBlocks => "blocks",
            Self::BuffersSize => "size",
            Self::BuffersStride => "stride",
            Self::BuffersAlign => "align",
            Self::MetaType => "type",
            Self::MetaSize => "size",
            Self::IoId => "id",
            Self::IoSize => "size",
        }
    }
}

/// A property value: a fixed id or integer, or a negotiable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// An enumerated identifier.
    Id(u32),
    /// A fixed integer.
    Int(i32),
    /// An inclusive integer range with a preferred default.
    Range {
        /// Preferred value, always within `min..=max`.
        default: i32,
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}

impl Value {
    /// Returns the fixed integer, or `None` for ids and ranges.
    pub fn as_int(self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the id, or `None` for integers and ranges.
    pub fn as_id(self) -> Option<u32> {
        match self {
            Self::Id(v) => Some(v),
            _ => None,
        }
    }

    /// Intersects two values. `None` means the intersection is empty.
    pub fn intersect(self, other: Self) -> Option<Self> {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => (a == b).then_some(Self::Id(a)),
            (Self::Int(a), Self::Int(b)) => (a == b).then_some(Self::Int(a)),
            (Self::Int(v), Self::Range { min, max, .. })
            | (Self::Range { min, max, .. }, Self::Int(v)) => {
                (min..=max).contains(&v).then_some(Self::Int(v))
            }
            (
                Self::Range {
                    default,
                    min: amin,
                    max: amax,
                },
                Self::Range {
                    min: bmin,
                    max: bmax,
                    ..
                },
            ) => {
                let min = amin.max(bmin);
                let max = amax.min(bmax);
                if min > max {
                    return None;
                }
                if min == max {
                    return Some(Self::Int(min));
                }
                Some(Self::Range {
                    default: default.clamp(min, max),
                    min,
                    max,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "id:{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Range { default, min, max } => write!(f, "{default} [{min}, {max}]"),
        }
    }
}

/// A single key/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    /// Property key.
    pub key: Key,
    /// Property value.
    pub value: Value,
}

/// An opaque negotiable object: a typed, ordered set of properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamObject {
    object_type: ObjectType,
    id: ParamType,
    props: Vec<Property>,
}

impl ParamObject {
    /// Creates an empty object of the given kind and parameter id.
    pub fn new(object_type: ObjectType, id: ParamType) -> Self {
        Self {
            object_type,
            id,
            props: Vec::new(),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: Key, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a property, replacing any previous value for the key.
    pub fn set(&mut self, key: Key, value: Value) {
        match self.props.iter_mut().find(|p| p.key == key) {
            Some(prop) => prop.value = value,
            None => self.props.push(Property { key, value }),
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: Key) -> Option<Value> {
        self.props.iter().find(|p| p.key == key).map(|p| p.value)
    }

    /// Returns the id stored under `key`, if it is a fixed id.
    pub fn id_value(&self, key: Key) -> Option<u32> {
        self.get(key).and_then(Value::as_id)
    }

    /// Returns the integer stored under `key`, if it is a fixed integer.
    pub fn int_value(&self, key: Key) -> Option<i32> {
        self.get(key).and_then(Value::as_int)
    }

    /// Object kind.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Parameter id this object answers.
    pub fn id(&self) -> ParamType {
        self.id
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &[Property] {
        &self.props
    }
}

impl fmt::Display for ParamObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.object_type.name(), self.id)?;
        for prop in &self.props {
            write!(f, " {}={}", prop.key.name(), prop.value)?;
        }
        Ok(())
    }
}

/// Filters `candidate` against an optional peer constraint.
///
/// Without a filter the candidate is returned unchanged. Otherwise every key
/// present in both objects is intersected, keys only the filter carries are
/// appended, and `None` is returned if the object kinds differ or any
/// intersection is empty. `None` tells the enumerator to try the next candidate.
pub fn filter(candidate: &ParamObject, filter: Option<&ParamObject>) -> Option<ParamObject> {
    let Some(filter) = filter else {
        return Some(candidate.clone());
    };
    if filter.object_type != candidate.object_type {
        return None;
    }

    let mut out = ParamObject::new(candidate.object_type, candidate.id);
    for prop in &candidate.props {
        let value = match filter.get(prop.key) {
            Some(constraint) => prop.value.intersect(constraint)?,
            None => prop.value,
        };
        out.props.push(Property {
            key: prop.key,
            value,
        });
    }
    for prop in &filter.props {
        if candidate.get(prop.key).is_none() {
            out.props.push(*prop);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_range() -> ParamObject {
        ParamObject::new(ObjectType::Format, ParamType::EnumFormat).with(
            Key::AudioRate,
            Value::Range {
                default: 44100,
                min: 1,
                max: i32::MAX,
            },
        )
    }

    #[test]
    fn set_replaces_existing_key() {
        let mut obj = ParamObject::new(ObjectType::ParamIo, ParamType::Io)
            .with(Key::IoSize, Value::Int(8));
        obj.set(Key::IoSize, Value::Int(16));
        assert_eq!(obj.properties().len(), 1);
        assert_eq!(obj.int_value(Key::IoSize), Some(16));
    }

    #[test]
    fn no_filter_passes_candidate() {
        let candidate = rate_range();
        assert_eq!(filter(&candidate, None), Some(candidate));
    }

    #[test]
    fn int_inside_range_fixes_value() {
        let wanted = ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
            .with(Key::AudioRate, Value::Int(96000));
        let out = filter(&rate_range(), Some(&wanted)).unwrap();
        assert_eq!(out.get(Key::AudioRate), Some(Value::Int(96000)));
    }

    #[test]
    fn range_intersection_clamps_default() {
        let wanted = ParamObject::new(ObjectType::Format, ParamType::EnumFormat).with(
            Key::AudioRate,
            Value::Range {
                default: 48000,
                min: 48000,
                max: 192_000,
            },
        );
        let out = filter(&rate_range(), Some(&wanted)).unwrap();
        assert_eq!(
            out.get(Key::AudioRate),
            Some(Value::Range {
                default: 48000,
                min: 48000,
                max: 192_000
            })
        );
    }

    #[test]
    fn disjoint_values_reject() {
        let wanted = ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
            .with(Key::AudioRate, Value::Int(0));
        assert!(filter(&rate_range(), Some(&wanted)).is_none());

        let a = ParamObject::new(ObjectType::Format, ParamType::Format)
            .with(Key::AudioFormat, Value::Id(1));
        let b = ParamObject::new(ObjectType::Format, ParamType::Format)
            .with(Key::AudioFormat, Value::Id(2));
        assert!(filter(&a, Some(&b)).is_none());
    }

    #[test]
    fn object_type_mismatch_rejects() {
        let io = ParamObject::new(ObjectType::ParamIo, ParamType::Io);
        assert!(filter(&rate_range(), Some(&io)).is_none());
    }

    #[test]
    fn filter_only_keys_are_appended() {
        let wanted = ParamObject::new(ObjectType::Format, ParamType::EnumFormat)
            .with(Key::AudioChannels, Value::Int(1));
        let out = filter(&rate_range(), Some(&wanted)).unwrap();
        assert_eq!(out.int_value(Key::AudioChannels), Some(1));
        assert!(out.get(Key::AudioRate).is_some());
    }

    #[test]
    fn display_lists_properties() {
        let obj = ParamObject::new(ObjectType::ParamIo, ParamType::Io)
            .with(Key::IoId, Value::Id(1))
            .with(Key::IoSize, Value::Int(8));
        assert_eq!(obj.to_string(), "param-io (Io) id=id:1 size=8");
    }
}
