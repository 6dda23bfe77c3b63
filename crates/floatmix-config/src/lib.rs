//! Session configuration for floatmix mixing runs.
//!
//! A session describes one host-driven run of the mixing node: the negotiated
//! stream format, the buffer geometry installed on every port, the input files
//! and the output file.
//!
//! # Features
//!
//! - **Sessions**: Load and save [`Session`] files as TOML
//! - **Validation**: Check a session against the node's limits before running it
//! - **Paths**: Platform-specific session directory and name lookup
//!
//! # Example
//!
//! ```rust,no_run
//! use floatmix_config::{Session, user_sessions_dir};
//!
//! let mut session = Session::new("two-track");
//! session.add_input("vocals.wav");
//! session.add_input("guitar.wav");
//! session.validate().unwrap();
//!
//! session.save(user_sessions_dir().join("two-track.toml")).unwrap();
//! ```

mod error;
mod session;

/// Platform-specific paths for session files.
pub mod paths;

/// Session validation against node limits.
pub mod validation;

pub use error::ConfigError;
pub use paths::{
    ensure_user_sessions_dir, find_session, list_user_sessions, session_name_from_path,
    user_config_dir, user_sessions_dir,
};
pub use session::{FormatConfig, InputConfig, NodeConfig, OutputConfig, Session};
pub use validation::{ValidationError, ValidationResult, validate_session};
