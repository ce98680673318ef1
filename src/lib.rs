#![forbid(unsafe_code)]
//! Selective: stable test identity and on-demand execution for externally scheduled test runs.
//!
//! An external scheduler asks for a manifest of every known test, picks a subset, and requests those
//! tests by ID. This crate discovers tests through a framework adapter, assigns each a stable ID,
//! serves the manifest, runs requested tests one at a time, and reports a structured result per test.
//!
//! ## Layout
//!
//! - `selective_core`: identity, registry, manifest and result records. No IO.
//! - [`runner`]: framework adapter trait, libtest adapter, executor, reporters, lifecycle controller.
//! - [`cli`]: command-line front-end and the JSON-lines scheduler session.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `runner` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: use `.expect("INVARIANT: reason")` with a clear explanation (for example, compiling a
//!   constant regex).

pub mod cli;
pub mod runner;
pub mod version;

pub use runner::{LibtestFramework, RunController, RunError, RunSettings, TestFramework};
pub use selective_core::{Manifest, TestRegistry, TestResult, TestStatus};
