//! Shared IO areas exchanged between host and node.
//!
//! The host and the node signal per-cycle buffer identity and status through
//! small shared areas instead of calls. Both sides hold an `Arc` to the same
//! area and read/write it in place. The host guarantees that a cycle and any
//! host-side update never overlap, so relaxed atomics are sufficient; they exist
//! only to make the in-place sharing expressible without locks.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Buffer id meaning "no buffer".
pub const INVALID_ID: u32 = u32::MAX;

/// Status word of a buffer-exchange area, also returned by
/// [`FloatMix::process`](crate::FloatMix::process).
///
/// ```rust
/// use floatmix_core::Status;
///
/// let s = Status::HAVE_BUFFER.union(Status::NEED_BUFFER);
/// assert!(s.contains(Status::HAVE_BUFFER));
/// assert!(s.contains(Status::NEED_BUFFER));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status(u32);

impl Status {
    /// Nothing pending.
    pub const OK: Self = Self(0);
    /// The port wants a new buffer.
    pub const NEED_BUFFER: Self = Self(1 << 0);
    /// The port holds a buffer ready for its peer.
    pub const HAVE_BUFFER: Self = Self(1 << 1);

    /// Creates a status from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

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

    /// Returns the union of two status sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.contains(Self::NEED_BUFFER),
            self.contains(Self::HAVE_BUFFER),
        ) {
            (false, false) => f.write_str("ok"),
            (true, false) => f.write_str("need-buffer"),
            (false, true) => f.write_str("have-buffer"),
            (true, true) => f.write_str("have-buffer|need-buffer"),
        }
    }
}

/// Buffer-exchange area: one status word plus the id of the buffer in flight.
#[derive(Debug)]
pub struct IoBuffers {
    status: AtomicU32,
    buffer_id: AtomicU32,
}

impl IoBuffers {
    /// Size of the area on the wire.
    pub const WIRE_SIZE: usize = 8;

    /// Creates an area with status [`Status::OK`] and no buffer.
    pub fn new() -> Self {
        Self {
            status: AtomicU32::new(Status::OK.bits()),
            buffer_id: AtomicU32::new(INVALID_ID),
        }
    }

    /// Current status.
    #[inline]
    pub fn status(&self) -> Status {
        Status::from_bits(self.status.load(Ordering::Relaxed))
    }

    /// Overwrites the status.
    #[inline]
    pub fn set_status(&self, status: Status) {
        self.status.store(status.bits(), Ordering::Relaxed);
    }

    /// Id of the buffer in flight, or [`INVALID_ID`].
    #[inline]
    pub fn buffer_id(&self) -> u32 {
        self.buffer_id.load(Ordering::Relaxed)
    }

    /// Names the buffer in flight.
    #[inline]
    pub fn set_buffer_id(&self, id: u32) {
        self.buffer_id.store(id, Ordering::Relaxed);
    }
}

impl Default for IoBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Range hint area: tells a port how much data to produce this cycle.
#[derive(Debug)]
pub struct IoRange {
    offset: AtomicU32,
    min_size: AtomicU32,
    max_size: AtomicU32,
}

impl IoRange {
    /// Size of the area on the wire.
    pub const WIRE_SIZE: usize = 16;

    /// Creates a range hint with the given maximum size in bytes.
    pub fn new(max_size: u32) -> Self {
        Self {
            offset: AtomicU32::new(0),
            min_size: AtomicU32::new(0),
            max_size: AtomicU32::new(max_size),
        }
    }

    /// Stream offset hint.
    pub fn offset(&self) -> u32 {
        self.offset.load(Ordering::Relaxed)
    }

    /// Sets the stream offset hint.
    pub fn set_offset(&self, offset: u32) {
        self.offset.store(offset, Ordering::Relaxed);
    }

    /// Minimum bytes to produce.
    pub fn min_size(&self) -> u32 {
        self.min_size.load(Ordering::Relaxed)
    }

    /// Sets the minimum bytes to produce.
    pub fn set_min_size(&self, size: u32) {
        self.min_size.store(size, Ordering::Relaxed);
    }

    /// Maximum bytes to produce.
    pub fn max_size(&self) -> u32 {
        self.max_size.load(Ordering::Relaxed)
    }

    /// Sets the maximum bytes to produce.
    pub fn set_max_size(&self, size: u32) {
        self.max_size.store(size, Ordering::Relaxed);
    }
}

/// Kind of IO area a host can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoType {
    /// Buffer-exchange area ([`IoBuffers`]).
    Buffers,
    /// Range hint area ([`IoRange`]).
    Range,
    /// Control event sequence. Advertised but never bound by this node.
    Control,
}

impl IoType {
    /// All kinds, in advertisement order.
    pub const ALL: [Self; 3] = [Self::Buffers, Self::Range, Self::Control];

    /// Wire id.
    pub const fn id(self) -> u32 {
        match self {
            Self::Buffers => 1,
            Self::Range => 2,
            Self::Control => 3,
        }
    }

    /// Size of the area on the wire.
    pub const fn wire_size(self) -> usize {
        match self {
            Self::Buffers => IoBuffers::WIRE_SIZE,
            Self::Range => IoRange::WIRE_SIZE,
            Self::Control => 16,
        }
    }
}

/// A shared area handed to [`FloatMix::port_set_io`](crate::FloatMix::port_set_io).
#[derive(Debug, Clone)]
pub enum IoArea {
    /// Buffer-exchange area.
    Buffers(Arc<IoBuffers>),
    /// Range hint area.
    Range(Arc<IoRange>),
}

impl IoArea {
    /// Kind of this area.
    pub fn io_type(&self) -> IoType {
        match self {
            Self::Buffers(_) => IoType::Buffers,
            Self::Range(_) => IoType::Range,
        }
    }
}
