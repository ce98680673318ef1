//! Error and warning types for test identity and selection.

use std::fmt;

use thiserror::Error;

/// Errors raised while building a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Discovery produced zero test cases. Never answered with an empty manifest: a scheduler cannot tell
    /// "no tests exist" apart from "a bug dropped them".
    #[error("no test cases found")]
    EmptyRegistry,
}

/// A requested test ID is not present in the registry.
///
/// Recoverable: the executor skips the ID and continues the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("test not found in registry: {test_id}")]
pub struct TestNotFoundError {
    pub test_id: String,
}

impl TestNotFoundError {
    pub fn new(test_id: impl Into<String>) -> Self {
        Self { test_id: test_id.into() }
    }
}

/// A discovered test case whose ID collided with an earlier one and was excluded from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTestId {
    pub test_id: String,
    pub file_path: String,
    pub line_number: u32,
}

impl fmt::Display for DuplicateTestId {
    /// Renders as `file:line`, the form surfaced in the duplicate warning.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}
