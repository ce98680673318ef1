//! libtest adapter
//!
//! Drives Rust's built-in test harness through `cargo test`:
//! - discovery scans Rust sources for `#[test]` functions, tracking inline `mod` blocks,
//! - each test runs in its own `cargo test <target> -- --exact <path>` invocation,
//! - the harness output is parsed into the shared failure accumulator.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use selective_core::{DiscoveredTest, Failure};

use super::config::FrameworkOptions;
use super::framework::{FrameworkError, TestFramework};

pub const FRAMEWORK: &str = "libtest";

/// Lines of stderr kept when the harness never reported the test (build failures and the like).
const STDERR_TAIL_LINES: usize = 20;

static MOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{").expect("INVARIANT: valid regex")
});
static FN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfn\s+([A-Za-z_][A-Za-z0-9_]*)").expect("INVARIANT: valid regex"));
static RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^test (\S+)(?: - [^.]+)? \.\.\. (ok|FAILED|ignored)(?:, (.*))?$").expect("INVARIANT: valid regex")
});
// Start of a result line whose status was pushed to a later line by uncaptured test output.
static STARTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^test (\S+)(?: - [^.]+)? \.\.\. ").expect("INVARIANT: valid regex"));
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^test result: (?:ok|FAILED)\. (\d+) passed; (\d+) failed; (\d+) ignored").expect("INVARIANT: valid regex")
});
static PANIC_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"panicked at (?:'.*', )?([^\s:']+:\d+:\d+)").expect("INVARIANT: valid regex")
});
static FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+at (\S.*)$").expect("INVARIANT: valid regex"));

/// Which compiled test harness a source file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestTarget {
    /// `tests/<name>.rs`
    Integration(String),
    /// Files under `src/` other than `src/main.rs` and `src/bin/`.
    Lib,
    /// `src/main.rs`
    Bins,
}

impl TestTarget {
    /// Map a project-relative source path to its target and the module path of the file itself.
    pub fn for_path(relative_path: &str) -> Option<(TestTarget, Vec<String>)> {
        let path = relative_path.strip_suffix(".rs")?;
        let parts: Vec<&str> = path.split('/').collect();

        match parts.as_slice() {
            ["tests", stem] => Some((TestTarget::Integration(stem.to_string()), Vec::new())),
            ["src", "main"] => Some((TestTarget::Bins, Vec::new())),
            ["src", "bin", ..] => None,
            ["src", "lib"] => Some((TestTarget::Lib, Vec::new())),
            ["src", rest @ ..] => {
                let mut modules: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
                if modules.last().is_some_and(|m| m == "mod") {
                    modules.pop();
                }
                Some((TestTarget::Lib, modules))
            }
            _ => None,
        }
    }

    /// Group label prefix for tests in this target.
    fn group_root(&self) -> &str {
        match self {
            TestTarget::Integration(stem) => stem,
            TestTarget::Lib => "crate",
            TestTarget::Bins => "main",
        }
    }

    fn cargo_args(&self) -> Vec<String> {
        match self {
            TestTarget::Integration(stem) => vec!["--test".to_string(), stem.clone()],
            TestTarget::Lib => vec!["--lib".to_string()],
            TestTarget::Bins => vec!["--bins".to_string()],
        }
    }
}

/// A `#[test]` function found by [`scan_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTest {
    /// Inline modules enclosing the function, outermost first.
    pub modules: Vec<String>,
    pub name: String,
    /// 1-based line of the `fn`.
    pub line: u32,
    pub ignored: bool,
}

/// Scan Rust source for test functions.
///
/// ## Notes
/// - Line-based and best-effort: braces inside string literals on the same line as code can skew module
///   tracking. Line numbers are diagnostic only.
pub fn scan_source(source: &str) -> Vec<ScannedTest> {
    let mut tests = Vec::new();
    let mut modules: Vec<(String, usize)> = Vec::new();
    let mut depth = 0usize;
    let mut pending_test = false;
    let mut pending_ignore = false;

    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") {
            continue;
        }

        if let Some(caps) = MOD_RE.captures(line) {
            modules.push((caps[1].to_string(), depth));
        }

        if trimmed.starts_with("#[") {
            if trimmed.starts_with("#[test]") || trimmed.starts_with("#[tokio::test") {
                pending_test = true;
            }
            if trimmed.starts_with("#[ignore") {
                pending_ignore = true;
            }
        }

        if pending_test {
            if let Some(caps) = FN_RE.captures(line) {
                tests.push(ScannedTest {
                    modules: modules.iter().map(|(name, _)| name.clone()).collect(),
                    name: caps[1].to_string(),
                    line: u32::try_from(index + 1).unwrap_or(u32::MAX),
                    ignored: pending_ignore,
                });
                pending_test = false;
                pending_ignore = false;
            } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
                pending_test = false;
                pending_ignore = false;
            }
        } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
            pending_ignore = false;
        }

        depth = apply_braces(line, depth);
        while modules.last().is_some_and(|(_, open)| depth <= *open) {
            modules.pop();
        }
    }

    tests
}

/// Update brace depth for one line, skipping string/char literals and trailing `//` comments.
fn apply_braces(line: &str, mut depth: usize) -> usize {
    let mut in_string = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_string => {
                chars.next();
            }
            '"' => in_string = !in_string,
            '/' if !in_string && chars.peek() == Some(&'/') => break,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Outcome of one test as reported by libtest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibtestOutcome {
    Passed,
    Ignored(String),
    Failed { message: String, backtrace: Vec<String> },
    /// The harness never reported the test (build failure, filter mismatch).
    NotReported(String),
}

/// Parse harness output for the test named `libtest_name`.
///
/// ## Notes
/// - With `--nocapture` the test's own output can split its result line. Each invocation runs exactly one
///   `--exact` test, so the status is then taken from the `test result:` summary.
pub fn parse_libtest_output(libtest_name: &str, stdout: &str, stderr: &str) -> LibtestOutcome {
    let status = stdout.lines().find_map(|line| {
        let caps = RESULT_RE.captures(line.trim_end())?;
        (&caps[1] == libtest_name).then(|| {
            (
                caps[2].to_string(),
                caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
            )
        })
    });

    match status.or_else(|| summary_status(libtest_name, stdout)) {
        Some((status, _)) if status == "ok" => LibtestOutcome::Passed,
        Some((status, reason)) if status == "ignored" => LibtestOutcome::Ignored(reason),
        Some(_) => {
            let mut message = extract_failure_section(libtest_name, stdout);
            if message.is_empty() {
                message = extract_stderr_panic(stderr);
            }
            let backtrace = extract_backtrace(&message);
            let message = message
                .lines()
                .filter(|line| !line.starts_with("note: run with `RUST_BACKTRACE"))
                .filter(|line| !FRAME_RE.is_match(line))
                .collect::<Vec<_>>()
                .join("\n");
            LibtestOutcome::Failed { message, backtrace }
        }
        None => {
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            LibtestOutcome::NotReported(tail)
        }
    }
}

/// Status from the run summary, when the test started and the summary accounts for exactly one test.
fn summary_status(libtest_name: &str, stdout: &str) -> Option<(String, String)> {
    let started = stdout
        .lines()
        .filter_map(|line| STARTED_RE.captures(line))
        .any(|caps| &caps[1] == libtest_name);
    if !started {
        return None;
    }

    let caps = stdout.lines().find_map(|line| SUMMARY_RE.captures(line.trim_end()))?;
    let count = |i: usize| caps[i].parse::<usize>().unwrap_or(0);
    let status = match (count(1), count(2), count(3)) {
        (1, 0, 0) => "ok",
        (0, 1, 0) => "FAILED",
        (0, 0, 1) => "ignored",
        _ => return None,
    };
    Some((status.to_string(), String::new()))
}

/// Panic output written straight to stderr (uncaptured runs), from the first `panicked at` line.
fn extract_stderr_panic(stderr: &str) -> String {
    stderr
        .lines()
        .skip_while(|line| !line.contains("panicked at"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// The captured `---- <name> stdout ----` block.
fn extract_failure_section(libtest_name: &str, stdout: &str) -> String {
    let header = format!("---- {} stdout ----", libtest_name);
    let mut in_section = false;
    let mut lines = Vec::new();

    for line in stdout.lines() {
        if line.trim_end() == header {
            in_section = true;
            continue;
        }
        if in_section {
            if line.starts_with("---- ") || line.trim_end() == "failures:" {
                break;
            }
            lines.push(line);
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn extract_backtrace(message: &str) -> Vec<String> {
    message
        .lines()
        .filter_map(|line| {
            PANIC_LOCATION_RE
                .captures(line)
                .or_else(|| FRAME_RE.captures(line))
                .map(|caps| caps[1].trim().to_string())
        })
        .collect()
}

#[derive(Debug, Clone)]
struct IndexedTest {
    target: TestTarget,
    libtest_name: String,
}

/// [`TestFramework`] implementation for libtest via `cargo test`.
pub struct LibtestFramework {
    cargo: String,
    root: PathBuf,
    version: Option<String>,
    harness_args: Vec<String>,
    index: HashMap<(String, String), IndexedTest>,
    failures: Vec<Failure>,
}

impl LibtestFramework {
    /// Use `cargo` as the cargo binary.
    pub fn new(cargo: impl Into<String>) -> Self {
        Self {
            cargo: cargo.into(),
            root: PathBuf::from("."),
            version: None,
            harness_args: Vec::new(),
            index: HashMap::new(),
            failures: Vec::new(),
        }
    }

    /// Use `$CARGO` when set (as it is under `cargo run`), else `cargo` from `PATH`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
    }

    fn detect_version(&self) -> Option<String> {
        let output = Command::new(&self.cargo).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        text.split_whitespace().nth(1).map(str::to_string)
    }
}

impl TestFramework for LibtestFramework {
    fn name(&self) -> &str {
        FRAMEWORK
    }

    fn version(&self) -> String {
        self.version.clone().unwrap_or_else(|| "unknown".to_string())
    }

    fn discover(&mut self, root: &Path, files: &[String]) -> Result<Vec<DiscoveredTest>, FrameworkError> {
        self.root = root.to_path_buf();
        let mut discovered = Vec::new();

        for file in files {
            let Some((target, file_modules)) = TestTarget::for_path(file) else {
                tracing::debug!(file = %file, "not part of a libtest target; skipping");
                continue;
            };

            let source = fs::read_to_string(root.join(file)).map_err(|e| FrameworkError::Discovery {
                path: file.clone(),
                message: e.to_string(),
            })?;

            for test in scan_source(&source) {
                let mut path: Vec<String> = file_modules.clone();
                path.extend(test.modules);

                let mut group = vec![target.group_root().to_string()];
                group.extend(path.iter().cloned());
                let group = group.join("::");

                path.push(test.name.clone());
                self.index.insert(
                    (group.clone(), test.name.clone()),
                    IndexedTest {
                        target: target.clone(),
                        libtest_name: path.join("::"),
                    },
                );
                discovered.push(DiscoveredTest::new(group, test.name, file.as_str(), Some(test.line)));
            }
        }

        Ok(discovered)
    }

    fn prepare(&mut self, options: &FrameworkOptions) -> Result<(), FrameworkError> {
        self.harness_args = options.harness_args.clone();
        self.version = self.detect_version();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn run_one(&mut self, group: &str, method: &str) -> Result<(), FrameworkError> {
        let test = self
            .index
            .get(&(group.to_string(), method.to_string()))
            .ok_or_else(|| FrameworkError::Execution(format!("unknown test {}#{}", group, method)))?;

        let output = Command::new(&self.cargo)
            .arg("test")
            .args(test.target.cargo_args())
            .arg("--")
            .arg("--exact")
            .arg(&test.libtest_name)
            .args(&self.harness_args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| FrameworkError::Execution(format!("failed to run {} test: {}", self.cargo, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        match parse_libtest_output(&test.libtest_name, &stdout, &stderr) {
            LibtestOutcome::Passed => {}
            LibtestOutcome::Ignored(reason) => self.failures.push(Failure::skipped(group, method, reason)),
            LibtestOutcome::Failed { message, backtrace } => {
                self.failures
                    .push(Failure::failed(group, method, message).with_backtrace(backtrace));
            }
            LibtestOutcome::NotReported(tail) => {
                self.failures.push(Failure::errored(
                    group,
                    method,
                    format!("test was not reported by the harness\n{}", tail),
                ));
            }
        }
        Ok(())
    }

    fn failures(&self) -> &[Failure] {
        &self.failures
    }

    fn retire_failure(&mut self, index: usize) -> Option<Failure> {
        (index < self.failures.len()).then(|| self.failures.remove(index))
    }
}
