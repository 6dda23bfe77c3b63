//! Port description and per-port state.

use core::fmt;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::io::{IoBuffers, IoRange};

/// Direction of a port, seen from the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Data flows into the node.
    Input,
    /// Data flows out of the node.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Capability flags advertised in [`PortInfo`].
///
/// ```rust
/// use floatmix_core::PortFlags;
///
/// let flags = PortFlags::CAN_USE_BUFFERS.union(PortFlags::REMOVABLE);
/// assert!(flags.contains(PortFlags::REMOVABLE));
/// assert!(!flags.contains(PortFlags::IN_PLACE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortFlags(u32);

impl PortFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The port can be removed by the host.
    pub const REMOVABLE: Self = Self(1 << 0);
    /// The port does not need to be linked for the node to run.
    pub const OPTIONAL: Self = Self(1 << 1);
    /// The port accepts host-allocated buffers.
    pub const CAN_USE_BUFFERS: Self = Self(1 << 3);
    /// The port can process data in place.
    pub const IN_PLACE: Self = Self(1 << 4);
    /// The port does not keep references to buffers after a cycle.
    pub const NO_REF: Self = Self(1 << 5);

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Display for PortFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PortFlags, &str); 5] = [
            (PortFlags::REMOVABLE, "removable"),
            (PortFlags::OPTIONAL, "optional"),
            (PortFlags::CAN_USE_BUFFERS, "can-use-buffers"),
            (PortFlags::IN_PLACE, "in-place"),
            (PortFlags::NO_REF, "no-ref"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Capability descriptor of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortInfo {
    /// Capability flags.
    pub flags: PortFlags,
    /// Rate of the port's clock, 0 if it follows the graph.
    pub rate: u32,
}

impl PortInfo {
    /// Descriptor of every input port.
    pub const INPUT: Self = Self {
        flags: PortFlags::CAN_USE_BUFFERS
            .union(PortFlags::REMOVABLE)
            .union(PortFlags::OPTIONAL)
            .union(PortFlags::IN_PLACE),
        rate: 0,
    };

    /// Descriptor of the output port.
    pub const OUTPUT: Self = Self {
        flags: PortFlags::CAN_USE_BUFFERS.union(PortFlags::NO_REF),
        rate: 0,
    };
}

/// Per-port properties. Stored and reported, not applied to the mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortProps {
    /// Linear gain.
    pub volume: f64,
    /// Whether the port is muted.
    pub mute: bool,
}

impl PortProps {
    /// Default volume.
    pub const DEFAULT_VOLUME: f64 = 1.0;
    /// Default mute state.
    pub const DEFAULT_MUTE: bool = false;
}

impl Default for PortProps {
    fn default() -> Self {
        Self {
            volume: Self::DEFAULT_VOLUME,
            mute: Self::DEFAULT_MUTE,
        }
    }
}

/// A port slot: identity, liveness, properties, IO bindings and buffers.
#[derive(Debug)]
pub(crate) struct Port {
    pub(crate) id: u32,
    pub(crate) valid: bool,
    pub(crate) props: PortProps,
    pub(crate) info: PortInfo,
    pub(crate) io: Option<Arc<IoBuffers>>,
    pub(crate) range: Option<Arc<IoRange>>,
    pub(crate) have_format: bool,
    pub(crate) pool: BufferPool,
}

impl Port {
    pub(crate) fn new(id: u32, info: PortInfo) -> Self {
        Self {
            id,
            valid: false,
            props: PortProps::default(),
            info,
            io: None,
            range: None,
            have_format: false,
            pool: BufferPool::new(),
        }
    }

    /// Returns the slot to its unallocated state.
    pub(crate) fn reset(&mut self) {
        self.valid = false;
        self.props = PortProps::default();
        self.io = None;
        self.range = None;
        self.have_format = false;
        self.pool.clear();
    }
}
