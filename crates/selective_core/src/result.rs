//! Result records: raw framework failures and the canonical per-test result sent to the scheduler.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::TestCase;

/// Outcome status reported to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Pending,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a failure recorded by a test framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An assertion failed.
    Failed,
    /// The test could not complete (unexpected panic outside an assertion, harness error, build failure).
    Errored,
    /// The test was skipped / ignored. Reported as `pending`, never counted as a failure.
    Skipped,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Failed => "Failure",
            FailureKind::Errored => "Error",
            FailureKind::Skipped => "Skipped",
        }
    }
}

/// A failure record in a framework's failure accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub group: String,
    pub method: String,
    pub kind: FailureKind,
    pub message: String,
    /// Stack frames / source locations, outermost last. May be empty.
    pub backtrace: Vec<String>,
}

impl Failure {
    pub fn new(group: impl Into<String>, method: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            method: method.into(),
            kind,
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    pub fn failed(group: impl Into<String>, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(group, method, FailureKind::Failed, message)
    }

    pub fn errored(group: impl Into<String>, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(group, method, FailureKind::Errored, message)
    }

    pub fn skipped(group: impl Into<String>, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(group, method, FailureKind::Skipped, message)
    }

    pub fn with_backtrace(mut self, backtrace: Vec<String>) -> Self {
        self.backtrace = backtrace;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.kind == FailureKind::Skipped
    }

    /// Exact (group, method) identity match.
    pub fn matches(&self, group: &str, method: &str) -> bool {
        self.group == group && self.method == method
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:\n{}#{}:", self.kind.label(), self.group, self.method)?;
        if !self.message.is_empty() {
            write!(f, "\n{}", self.message)?;
        }
        Ok(())
    }
}

/// Canonical per-test result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub description: String,
    pub full_description: String,
    pub status: TestStatus,
    pub file_path: String,
    pub line_number: u32,
    /// Wall-clock seconds.
    pub run_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message_lines: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_formatted_backtrace: Option<Vec<String>>,
}

impl TestResult {
    pub fn is_failure(&self) -> bool {
        self.status == TestStatus::Failed
    }
}

/// Normalize an execution of `case` into a [`TestResult`].
///
/// ## Parameters
/// - `failure`: the failure the framework recorded for exactly this (group, method), if any.
/// - `elapsed`: wall-clock time spent in the framework's execution primitive.
///
/// ## Notes
/// - No failure ⇒ `passed`; a skipped failure ⇒ `pending`; anything else ⇒ `failed`.
/// - A missing line number is reported as `0`.
pub fn format_test_case(case: &TestCase, failure: Option<&Failure>, elapsed: Duration) -> TestResult {
    let status = match failure {
        None => TestStatus::Passed,
        Some(f) if f.is_skipped() => TestStatus::Pending,
        Some(_) => TestStatus::Failed,
    };

    TestResult {
        id: case.id.clone(),
        description: case.method.clone(),
        full_description: case.method.clone(),
        status,
        file_path: case.file_path.clone(),
        line_number: case.line_number.unwrap_or(0),
        run_time: elapsed.as_secs_f64(),
        failure_message_lines: failure.map(|f| f.to_string().lines().map(str::to_string).collect()),
        failure_formatted_backtrace: failure.map(|f| f.backtrace.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> TestCase {
        TestCase {
            id: "a_test.rb:aaa111".to_string(),
            group: "ATest".to_string(),
            method: "test_it".to_string(),
            file_path: "a_test.rb".to_string(),
            line_number: Some(7),
        }
    }

    #[test]
    fn no_failure_is_passed_without_failure_fields() {
        let result = format_test_case(&case(), None, Duration::from_millis(250));
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.run_time, 0.25);
        assert_eq!(result.failure_message_lines, None);
        assert_eq!(result.failure_formatted_backtrace, None);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("failure_message_lines").is_none());
        assert_eq!(json["status"], "passed");
    }

    #[test]
    fn skipped_failure_is_pending() {
        let failure = Failure::skipped("ATest", "test_it", "not today");
        let result = format_test_case(&case(), Some(&failure), Duration::ZERO);
        assert_eq!(result.status, TestStatus::Pending);
        assert_eq!(
            result.failure_message_lines.unwrap(),
            vec!["Skipped:", "ATest#test_it:", "not today"]
        );
        assert_eq!(result.failure_formatted_backtrace, Some(vec![]));
    }

    #[test]
    fn other_failures_are_failed_with_backtrace() {
        let failure = Failure::failed("ATest", "test_it", "expected 1\ngot 2")
            .with_backtrace(vec!["tests/a.rs:10:5".to_string()]);
        let result = format_test_case(&case(), Some(&failure), Duration::ZERO);
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(
            result.failure_message_lines.unwrap(),
            vec!["Failure:", "ATest#test_it:", "expected 1", "got 2"]
        );
        assert_eq!(result.failure_formatted_backtrace.unwrap(), vec!["tests/a.rs:10:5"]);
    }

    #[test]
    fn errors_are_failed() {
        let failure = Failure::errored("ATest", "test_it", "boom");
        assert_eq!(format_test_case(&case(), Some(&failure), Duration::ZERO).status, TestStatus::Failed);
    }

    #[test]
    fn missing_line_number_is_zero() {
        let mut case = case();
        case.line_number = None;
        assert_eq!(format_test_case(&case, None, Duration::ZERO).line_number, 0);
    }

    #[test]
    fn descriptions() {
        let result = format_test_case(&case(), None, Duration::ZERO);
        assert_eq!(result.description, "test_it");
        assert_eq!(result.full_description, "test_it");
    }
}
