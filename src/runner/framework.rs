//! Test framework adapter boundary
//!
//! The core never reaches into a framework's internals. Everything it needs is expressed here:
//! - discovery of runnable units in a set of source files,
//! - running exactly one (group, method) pair,
//! - a failure accumulator the core reads and retires records from.
//!
//! One adapter implements this trait per supported framework (see `libtest`).

use std::path::Path;

use selective_core::{DiscoveredTest, Failure};
use thiserror::Error;

use super::config::FrameworkOptions;

/// Errors raised by a framework adapter.
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("failed to discover tests in {path}: {message}")]
    Discovery { path: String, message: String },

    #[error("test execution failed: {0}")]
    Execution(String),
}

/// Minimal capability set the core requires from a test framework.
///
/// ## Notes
/// - `failures()` is a shared accumulator: the framework appends, the executor retires records it has
///   correlated. It is not safe against concurrent writers; adapters must run `run_one` to completion before
///   returning.
pub trait TestFramework {
    /// Short framework name reported to the scheduler (for example `libtest`).
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Discover the runnable units defined in `files` (paths relative to `root`).
    fn discover(&mut self, root: &Path, files: &[String]) -> Result<Vec<DiscoveredTest>, FrameworkError>;

    /// Pre-run setup with the parsed framework options.
    fn prepare(&mut self, _options: &FrameworkOptions) -> Result<(), FrameworkError> {
        Ok(())
    }

    /// Start the framework's parallel executor, if it has one. The core never schedules work on it.
    fn start(&mut self) {}

    /// Stop the framework's parallel executor.
    fn shutdown(&mut self) {}

    /// Run exactly one test, recording any failure into the accumulator.
    fn run_one(&mut self, group: &str, method: &str) -> Result<(), FrameworkError>;

    /// Failures recorded so far, in recording order.
    fn failures(&self) -> &[Failure];

    /// Remove the failure at `index` from the accumulator.
    fn retire_failure(&mut self, index: usize) -> Option<Failure>;
}
