//! Reporting sinks
//!
//! The executor and lifecycle controller emit events through the `TestReporter` trait. The composite sink
//! always carries a `SummaryReporter` (which the exit status is computed from) plus any number of
//! human-facing reporters writing to stderr. Stdout is reserved for scheduler JSON.

use std::time::{Duration, Instant};

use selective_core::{DuplicateTestId, TestCase, TestResult, TestStatus};

/// Trait for receiving run events.
///
/// Implement this trait to customize output (JUnit, TAP, etc.).
pub trait TestReporter {
    /// Called once the registry is built.
    fn on_collection_complete(&mut self, _test_count: usize, _duplicates: &[DuplicateTestId]) {}

    /// Called right before a test case is executed.
    fn on_test_start(&mut self, _case: &TestCase) {}

    /// Called with the formatted result of a test case.
    fn on_test_complete(&mut self, result: &TestResult);

    /// Called when the scheduler asks to forget a reported result.
    fn on_result_removed(&mut self, _test_id: &str) {}

    /// Called once at finalization.
    fn on_run_complete(&mut self, _summary: &TestSummary) {}
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl TestSummary {
    /// True when no non-skipped failure was recorded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Accumulates results for aggregation and exit status.
#[derive(Debug)]
pub struct SummaryReporter {
    started: Instant,
    results: Vec<TestResult>,
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            results: Vec::new(),
        }
    }
}

impl SummaryReporter {
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Forget every recorded result for `test_id`. Returns whether anything was removed.
    pub fn remove(&mut self, test_id: &str) -> bool {
        let before = self.results.len();
        self.results.retain(|r| r.id != test_id);
        self.results.len() != before
    }

    pub fn summary(&self) -> TestSummary {
        let count = |status: TestStatus| self.results.iter().filter(|r| r.status == status).count();
        TestSummary {
            total: self.results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Pending),
            duration: self.started.elapsed(),
        }
    }
}

impl TestReporter for SummaryReporter {
    fn on_test_complete(&mut self, result: &TestResult) {
        self.results.push(result.clone());
    }

    fn on_result_removed(&mut self, test_id: &str) {
        self.remove(test_id);
    }
}

/// Session-level console output: duplicate warnings, failure details and the final summary line.
#[derive(Default)]
pub struct ConsoleReporter {
    failures: Vec<TestResult>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, _test_count: usize, duplicates: &[DuplicateTestId]) {
        if duplicates.is_empty() {
            return;
        }
        let locations: Vec<String> = duplicates.iter().map(ToString::to_string).collect();
        eprintln!(
            "\x1b[33mDuplicate test ids found. Please ensure unique test group/method names are used to ensure all tests are run. \n{}\x1b[0m",
            locations.join("\n")
        );
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        if result.is_failure() {
            self.failures.push(result.clone());
        }
    }

    fn on_result_removed(&mut self, test_id: &str) {
        self.failures.retain(|r| r.id != test_id);
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if summary.total == 0 {
            eprintln!("No tests executed");
            return;
        }

        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for result in &self.failures {
                eprintln!();
                eprintln!("\x1b[1m___________ {} ___________\x1b[0m", result.id);
                for line in result.failure_message_lines.iter().flatten() {
                    eprintln!("    {}", line);
                }
                eprintln!();
                eprintln!("    {}:{}", result.file_path, result.line_number);
            }
        }

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        if summary.skipped > 0 {
            parts.push(format!("{} skipped", summary.skipped));
        }

        let color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        eprintln!();
        eprintln!(
            "{}====== {} in {:.2}s ======\x1b[0m",
            color,
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

/// Per-test progress (pytest-style dots, or one line per test when verbose).
#[derive(Default)]
pub struct ProgressReporter {
    pub verbose: bool,
}

impl ProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TestReporter for ProgressReporter {
    fn on_test_start(&mut self, case: &TestCase) {
        if self.verbose {
            eprint!("{}#{} ... ", case.group, case.method);
        }
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        let ms = (result.run_time * 1000.0).round();
        let status = match result.status {
            TestStatus::Passed if self.verbose => format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", ms),
            TestStatus::Passed => "\x1b[32m.\x1b[0m".to_string(),
            TestStatus::Failed if self.verbose => format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", ms),
            TestStatus::Failed => "\x1b[31mF\x1b[0m".to_string(),
            TestStatus::Pending if self.verbose => "\x1b[33mSKIPPED\x1b[0m".to_string(),
            TestStatus::Pending => "\x1b[33mS\x1b[0m".to_string(),
        };

        if self.verbose {
            eprintln!("{}", status);
        } else {
            eprint!("{}", status);
        }
    }

    fn on_run_complete(&mut self, _summary: &TestSummary) {
        if !self.verbose {
            eprintln!();
        }
    }
}

/// Fans events out to the summary reporter and every attached reporter.
#[derive(Default)]
pub struct CompositeReporter {
    summary: SummaryReporter,
    reporters: Vec<Box<dyn TestReporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reporter: Box<dyn TestReporter>) {
        self.reporters.push(reporter);
    }

    pub fn with(mut self, reporter: Box<dyn TestReporter>) -> Self {
        self.push(reporter);
        self
    }

    pub fn summary_reporter(&self) -> &SummaryReporter {
        &self.summary
    }
}

impl TestReporter for CompositeReporter {
    fn on_collection_complete(&mut self, test_count: usize, duplicates: &[DuplicateTestId]) {
        self.summary.on_collection_complete(test_count, duplicates);
        for reporter in &mut self.reporters {
            reporter.on_collection_complete(test_count, duplicates);
        }
    }

    fn on_test_start(&mut self, case: &TestCase) {
        self.summary.on_test_start(case);
        for reporter in &mut self.reporters {
            reporter.on_test_start(case);
        }
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        self.summary.on_test_complete(result);
        for reporter in &mut self.reporters {
            reporter.on_test_complete(result);
        }
    }

    fn on_result_removed(&mut self, test_id: &str) {
        self.summary.on_result_removed(test_id);
        for reporter in &mut self.reporters {
            reporter.on_result_removed(test_id);
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.summary.on_run_complete(summary);
        for reporter in &mut self.reporters {
            reporter.on_run_complete(summary);
        }
    }
}
