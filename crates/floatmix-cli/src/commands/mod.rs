//! CLI command implementations.

pub mod caps;
pub mod info;
pub mod mix;
pub mod session;
