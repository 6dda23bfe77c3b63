//! Offline I/O for the floatmix node.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for loading/saving mono audio files
//! - **Offline hosting**: [`MixHost`] drives a [`FloatMix`](floatmix_core::FloatMix)
//!   node cycle by cycle the way a graph scheduler would, feeding input buffers
//!   through the IO areas and collecting the produced output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use floatmix_core::{AudioFormat, AudioInfo, AudioLayout};
//! use floatmix_io::{MixHost, read_wav, write_wav};
//!
//! let (vocals, spec) = read_wav("vocals.wav")?;
//! let (guitar, _) = read_wav("guitar.wav")?;
//!
//! let info = AudioInfo::new(AudioFormat::F32, AudioLayout::NonInterleaved, spec.sample_rate, 1);
//! let mut host = MixHost::new(info, 2, 3, 1024)?;
//! let report = host.mix(&[vocals, guitar])?;
//!
//! write_wav("mix.wav", &report.samples, spec)?;
//! ```

mod host;
mod wav;

pub use host::{CycleOutcome, MixHost, MixReport};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

use floatmix_core::NodeError;

/// Error types for floatmix I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The mixing node rejected a host call.
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// The file's sample layout cannot feed a mono port.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An input's sample rate differs from the session rate.
    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch {
        /// Negotiated rate.
        expected: u32,
        /// Rate of the offending input.
        actual: u32,
    },

    /// A mix was requested with no inputs, or with more tracks than ports.
    #[error("Expected {expected} input tracks, got {actual}")]
    TrackCount {
        /// Input ports configured on the host.
        expected: usize,
        /// Tracks passed in.
        actual: usize,
    },

    /// The host block size is outside what one node cycle can carry.
    #[error("Block size {value} out of range [{min}, {max}]")]
    BlockSize {
        /// Requested samples per cycle.
        value: usize,
        /// Smallest accepted block.
        min: usize,
        /// Largest block the node mixes in one cycle.
        max: usize,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for floatmix I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
