//! Selective test runner
//!
//! ## Modules
//!
//! - `config` - Argument partitioning and environment configuration
//! - `discovery` - Test file listing
//! - `framework` - Test framework adapter trait
//! - `libtest` - Adapter for Rust's libtest via `cargo test`
//! - `executor` - Selective execution of requested test IDs
//! - `reporter` - Reporting sinks and run summary
//! - `lifecycle` - Run lifecycle controller
//!
//! ## Concurrency
//!
//! Everything here is synchronous and single-threaded. The executor runs one test to completion, including
//! retiring its failure record, before starting the next. A framework that runs tests in parallel internally
//! must not be driven through this module concurrently.

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod discovery;
pub mod executor;
pub mod framework;
pub mod libtest;
pub mod lifecycle;
pub mod reporter;

pub use config::{DiscoveryConfig, FrameworkOptions, RunArgs, WrapperOptions};
pub use executor::ExecutionReport;
pub use framework::{FrameworkError, TestFramework};
pub use libtest::LibtestFramework;
pub use lifecycle::{RunController, RunError, RunOutcome, RunSettings, RunState, RunnerInfo};
pub use reporter::{CompositeReporter, ConsoleReporter, ProgressReporter, SummaryReporter, TestReporter, TestSummary};
