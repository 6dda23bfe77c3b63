//! Session validation.
//!
//! Checks a [`Session`](crate::Session) against the limits of the mixing node
//! before any port is configured, so a bad session fails up front instead of
//! partway through negotiation.
//!
//! ```rust
//! use floatmix_config::{Session, ValidationError};
//!
//! let session = Session::new("empty");
//! assert_eq!(session.validate(), Err(ValidationError::NoInputs));
//! ```

use floatmix_core::{MAX_BUFFERS, MAX_PORTS, MAX_SAMPLES, MIN_BUFFER_SAMPLES};
use thiserror::Error;

use crate::Session;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {0}")]
    InvalidRate(u32),

    /// Channel count the host cannot drive.
    #[error("unsupported channel count {0}: sessions mix mono streams")]
    UnsupportedChannels(u32),

    /// Buffer count outside `1..=max`.
    #[error("buffer count {value} out of range [1, {max}]")]
    BufferCount {
        /// Requested buffers per port.
        value: u32,
        /// Per-port buffer limit.
        max: usize,
    },

    /// Block size outside `min..=max` samples.
    #[error("block size {value} out of range [{min}, {max}]")]
    BlockSize {
        /// Requested samples per cycle.
        value: usize,
        /// Smallest block the node advertises.
        min: usize,
        /// Largest block one cycle produces.
        max: usize,
    },

    /// Output sample width other than 16, 24 or 32.
    #[error("unsupported output bit depth: {0}")]
    BitDepth(u16),

    /// Session lists no inputs.
    #[error("session has no inputs")]
    NoInputs,

    /// More inputs than the node has ports.
    #[error("{count} inputs exceed the {max} port limit")]
    TooManyInputs {
        /// Number of inputs listed.
        count: usize,
        /// Port limit.
        max: usize,
    },

    /// An input or output path is empty.
    #[error("empty path for {0}")]
    EmptyPath(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate every section of a session, collecting all failures.
///
/// A single failure is returned as is; several are wrapped in
/// [`ValidationError::Multiple`].
pub fn validate_session(session: &Session) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if session.format.rate == 0 {
        errors.push(ValidationError::InvalidRate(session.format.rate));
    }
    if session.format.channels != 1 {
        errors.push(ValidationError::UnsupportedChannels(session.format.channels));
    }

    let buffers = session.node.buffers;
    if buffers == 0 || buffers as usize > MAX_BUFFERS {
        errors.push(ValidationError::BufferCount {
            value: buffers,
            max: MAX_BUFFERS,
        });
    }

    let block = session.node.block_size;
    if !(MIN_BUFFER_SAMPLES..=MAX_SAMPLES).contains(&block) {
        errors.push(ValidationError::BlockSize {
            value: block,
            min: MIN_BUFFER_SAMPLES,
            max: MAX_SAMPLES,
        });
    }

    if !matches!(session.output.bit_depth, 16 | 24 | 32) {
        errors.push(ValidationError::BitDepth(session.output.bit_depth));
    }
    if session.output.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPath("output".to_string()));
    }

    match session.inputs.len() {
        0 => errors.push(ValidationError::NoInputs),
        n if n > MAX_PORTS => errors.push(ValidationError::TooManyInputs {
            count: n,
            max: MAX_PORTS,
        }),
        _ => {}
    }
    for (i, input) in session.inputs.iter().enumerate() {
        if input.path.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyPath(format!("input {i}")));
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
