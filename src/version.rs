//! Selective version information.
//!
//! Exposed as a single constant so the CLI and the scheduler session report the same value.

/// The wrapper version string (for example, `0.1.0`).
pub const SELECTIVE_VERSION: &str = env!("CARGO_PKG_VERSION");
