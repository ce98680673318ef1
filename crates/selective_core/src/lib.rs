//! Provide stable test identity and the data records exchanged with an external test scheduler.
//!
//! This crate holds the deterministic half of selective test execution:
//! - computing a test ID that survives across runs and processes,
//! - building the registry of discovered test cases (with duplicate detection),
//! - deriving the manifest a scheduler selects from, and
//! - normalizing a raw execution outcome into the canonical result record.
//!
//! ## Notes
//!
//! - There is **no IO** here and no global state. Discovery, process spawning and reporting live in the
//!   `selective` crate, which drives a test framework through an adapter trait.
//! - Records serialize with `serde` to the JSON shapes the scheduler consumes (`snake_case` keys).

pub mod errors;
pub mod identity;
pub mod manifest;
pub mod registry;
pub mod result;

pub use errors::{DuplicateTestId, ManifestError, TestNotFoundError};
pub use identity::{id_file_path, normalize_path, test_digest, test_id};
pub use manifest::{Manifest, ManifestEntry, build_manifest};
pub use registry::{DiscoveredTest, TestCase, TestRegistry};
pub use result::{Failure, FailureKind, TestResult, TestStatus, format_test_case};
