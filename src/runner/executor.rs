//! Selective executor
//!
//! Runs an externally chosen list of test IDs, one at a time and in input order:
//! look up → run exactly that (group, method) → correlate the framework's failure → format → retire → report.

use std::time::Instant;

use selective_core::{Failure, TestCase, TestNotFoundError, TestRegistry, TestResult, format_test_case};

use super::framework::TestFramework;
use super::reporter::TestReporter;

/// What happened to a batch passed to [`run_test_cases`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of test cases executed (and delivered to the callback).
    pub executed: usize,
    /// Requested IDs that were not in the registry, in input order.
    pub missing: Vec<TestNotFoundError>,
}

/// Execute `test_ids` in order, delivering each result to `on_result` before the next test starts.
///
/// ## Notes
/// - Unknown IDs are skipped with a warning; they never abort the batch.
/// - Strictly sequential: the failure accumulator is shared with the framework and the retire step must
///   complete before the next test runs.
#[tracing::instrument(skip_all, fields(requested = test_ids.len()))]
pub fn run_test_cases(
    registry: &TestRegistry,
    framework: &mut dyn TestFramework,
    reporter: &mut dyn TestReporter,
    test_ids: &[String],
    mut on_result: impl FnMut(TestResult),
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for test_id in test_ids {
        let Some(case) = registry.get(test_id) else {
            let err = TestNotFoundError::new(test_id.as_str());
            tracing::warn!("{}", err);
            report.missing.push(err);
            continue;
        };

        reporter.on_test_start(case);
        let result = execute_one(framework, case);
        tracing::debug!(id = %result.id, status = %result.status, run_time = result.run_time, "test case finished");

        reporter.on_test_complete(&result);
        on_result(result);
        report.executed += 1;
    }

    report
}

/// Run one test case and return its formatted result, retiring the correlated failure.
fn execute_one(framework: &mut dyn TestFramework, case: &TestCase) -> TestResult {
    // Only failures recorded by this invocation are candidates.
    let mark = framework.failures().len();

    let start = Instant::now();
    let outcome = framework.run_one(&case.group, &case.method);
    let elapsed = start.elapsed();

    let index = find_failure(framework.failures(), mark, &case.group, &case.method);

    let result = match outcome {
        Ok(()) => format_test_case(case, index.map(|i| &framework.failures()[i]), elapsed),
        Err(err) => {
            tracing::warn!(id = %case.id, error = %err, "framework failed to run test case");
            let failure = Failure::errored(case.group.as_str(), case.method.as_str(), err.to_string());
            format_test_case(case, Some(&failure), elapsed)
        }
    };

    if let Some(index) = index {
        framework.retire_failure(index);
    }

    result
}

/// Index of the most recent failure at or after `mark` recorded for exactly (`group`, `method`).
fn find_failure(failures: &[Failure], mark: usize, group: &str, method: &str) -> Option<usize> {
    failures
        .iter()
        .enumerate()
        .skip(mark)
        .rev()
        .find(|(_, failure)| failure.matches(group, method))
        .map(|(index, _)| index)
}
