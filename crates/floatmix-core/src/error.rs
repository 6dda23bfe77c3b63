//! Error types for node operations.
//!
//! Every fallible call on [`FloatMix`](crate::FloatMix) returns a [`NodeError`].
//! Errors are always reported synchronously and never retried internally; the
//! [`ErrorKind`] of each variant tells the host which recovery path applies.

use thiserror::Error;

use crate::command::Command;
use crate::format::AudioFormat;
use crate::io::IoType;
use crate::params::ParamType;
use crate::port::Direction;

/// Coarse error category used by hosts to pick a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Out-of-range id, malformed proposal, or missing prior state. No state changed.
    InvalidArgument,
    /// The capability is not implemented; the caller must use another path.
    Unsupported,
    /// Format or buffer query before negotiation completed. Recoverable by negotiating.
    NotConfigured,
    /// No free output buffer this cycle. Recoverable by returning a buffer.
    BackPressure,
    /// The output IO area was never bound. The host must finish binding first.
    FatalConfiguration,
}

/// Errors reported by the mixing node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The port id is out of range, of the wrong direction, or not allocated.
    #[error("invalid {direction} port {port_id}")]
    InvalidPort {
        /// Direction of the addressed port.
        direction: Direction,
        /// Port id that was addressed.
        port_id: u32,
    },

    /// An input port with this id already exists.
    #[error("input port {0} already exists")]
    PortExists(u32),

    /// The proposed format object is missing a field or carries an unfixed value.
    #[error("malformed format: {0}")]
    MalformedFormat(&'static str),

    /// The proposed format is not raw audio.
    #[error("format is not raw audio")]
    NotRawAudio,

    /// The first negotiated format must use 32-bit float samples.
    #[error("unsupported sample format {0:?}")]
    UnsupportedSampleFormat(AudioFormat),

    /// A node-wide format is established and the proposal differs from it.
    #[error("format does not match the negotiated node format")]
    FormatMismatch,

    /// The port has no negotiated format yet.
    #[error("no format on {direction} port {port_id}")]
    NoFormat {
        /// Direction of the addressed port.
        direction: Direction,
        /// Port id that was addressed.
        port_id: u32,
    },

    /// More buffers were offered than a port can hold.
    #[error("too many buffers: {count} (max {max})")]
    TooManyBuffers {
        /// Number of buffers offered.
        count: usize,
        /// Pool capacity.
        max: usize,
    },

    /// A buffer's first data block has an unrecognized memory kind or no data.
    #[error("invalid memory on buffer {index}")]
    InvalidMemory {
        /// Position of the offending buffer in the installed set.
        index: u32,
    },

    /// The buffer is already a member of the free queue.
    #[error("buffer {0} is already queued")]
    BufferQueued(u32),

    /// The buffer id is outside the installed set.
    #[error("unknown buffer {0}")]
    UnknownBuffer(u32),

    /// The parameter category is not known to ports of this node.
    #[error("unknown parameter {0:?}")]
    UnknownParam(ParamType),

    /// The IO area kind is not accepted by this node.
    #[error("unknown io area {0:?}")]
    UnknownIo(IoType),

    /// The IO area handed over does not match the declared kind.
    #[error("io area does not match kind {0:?}")]
    IoMismatch(IoType),

    /// The command is not handled by this node.
    #[error("unsupported command {0:?}")]
    UnsupportedCommand(Command),

    /// The requested operation is not implemented by this node.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// No free output buffer was available for this cycle.
    #[error("out of output buffers")]
    OutOfBuffers,

    /// The output port has no buffer IO area bound.
    #[error("output port has no buffer io area")]
    OutputIoUnbound,
}

impl NodeError {
    /// Returns the recovery category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPort { .. }
            | Self::PortExists(_)
            | Self::MalformedFormat(_)
            | Self::NotRawAudio
            | Self::UnsupportedSampleFormat(_)
            | Self::FormatMismatch
            | Self::TooManyBuffers { .. }
            | Self::InvalidMemory { .. }
            | Self::BufferQueued(_)
            | Self::UnknownBuffer(_)
            | Self::UnknownParam(_)
            | Self::UnknownIo(_)
            | Self::IoMismatch(_) => ErrorKind::InvalidArgument,
            Self::UnsupportedCommand(_) | Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::NoFormat { .. } => ErrorKind::NotConfigured,
            Self::OutOfBuffers => ErrorKind::BackPressure,
            Self::OutputIoUnbound => ErrorKind::FatalConfiguration,
        }
    }

    /// Returns the negative POSIX error code a C host would receive.
    pub fn errno(&self) -> i32 {
        const ENOENT: i32 = 2;
        const EIO: i32 = 5;
        const EINVAL: i32 = 22;
        const EPIPE: i32 = 32;
        const ENOTSUP: i32 = 95;

        match self {
            Self::UnknownParam(_) | Self::UnknownIo(_) => -ENOENT,
            Self::NoFormat { .. } | Self::OutputIoUnbound => -EIO,
            Self::OutOfBuffers => -EPIPE,
            Self::UnsupportedCommand(_) | Self::Unsupported(_) => -ENOTSUP,
            _ => -EINVAL,
        }
    }
}

/// Convenience result type for node operations.
pub type Result<T> = core::result::Result<T, NodeError>;
