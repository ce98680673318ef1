//! Run lifecycle controller
//!
//! Owns everything a run needs (framework adapter, registry, reporting sink, seed) as explicit fields and
//! walks the state machine `Idle → Configuring → Ready → Executing → Finalized`.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use selective_core::{Manifest, ManifestError, TestRegistry, TestResult, build_manifest};
use serde::Serialize;
use thiserror::Error;

use super::config::{ConfigError, DiscoveryConfig, FrameworkOptions, RunArgs};
use super::discovery::list_test_files;
use super::executor::{self, ExecutionReport};
use super::framework::{FrameworkError, TestFramework};
use super::reporter::{CompositeReporter, ConsoleReporter, ProgressReporter, TestReporter, TestSummary};
use crate::version::SELECTIVE_VERSION;

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Configuring,
    Ready,
    Executing,
    Finalized,
}

/// Errors raised by the lifecycle controller.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Selective could not generate a test manifest. The output was:\n{0}")]
    TestManifest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error("cannot {action} after the run was finalized")]
    Finalized { action: &'static str },

    #[error("cannot {action} while the run is {state:?}")]
    InvalidState { action: &'static str, state: RunState },
}

impl From<ManifestError> for RunError {
    fn from(err: ManifestError) -> Self {
        RunError::TestManifest(err.to_string())
    }
}

/// Everything the controller needs to configure a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Project root; test IDs are relative to it.
    pub root: PathBuf,
    pub args: RunArgs,
    pub options: FrameworkOptions,
    pub discovery: DiscoveryConfig,
}

impl RunSettings {
    /// Partition `raw_args` and read the remaining configuration from the process environment.
    pub fn from_env<I, S>(root: impl Into<PathBuf>, raw_args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_lookup(root, raw_args, |key| std::env::var(key).ok())
    }

    /// Same as [`RunSettings::from_env`] with an injectable environment.
    pub fn from_lookup<I, S>(
        root: impl Into<PathBuf>,
        raw_args: I,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = RunArgs::parse(raw_args);
        let options = FrameworkOptions::from_args(&args.framework_args, &lookup)?;
        let discovery = DiscoveryConfig::from_lookup(&lookup)?;
        Ok(Self {
            root: root.into(),
            args,
            options,
            discovery,
        })
    }
}

/// Framework and version details reported to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerInfo {
    pub framework: String,
    pub framework_version: String,
    pub wrapper_version: String,
    pub base_test_path: String,
}

/// Result of finalizing a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// `0` when no non-skipped failure was recorded, else `1`.
    pub exit_status: i32,
    pub summary: TestSummary,
}

type AfterRunHook = Box<dyn FnOnce()>;

pub struct RunController {
    state: RunState,
    framework: Box<dyn TestFramework>,
    settings: Option<RunSettings>,
    registry: TestRegistry,
    reporter: CompositeReporter,
    after_run: Vec<AfterRunHook>,
}

impl RunController {
    /// Create an idle controller around `framework`.
    pub fn new(framework: Box<dyn TestFramework>) -> Self {
        Self {
            state: RunState::Idle,
            framework,
            settings: None,
            registry: TestRegistry::default(),
            reporter: CompositeReporter::new(),
            after_run: Vec::new(),
        }
    }

    /// Create and configure a controller in one step.
    pub fn start(framework: Box<dyn TestFramework>, settings: RunSettings) -> Result<Self, RunError> {
        let mut controller = Self::new(framework);
        controller.configure(settings)?;
        Ok(controller)
    }

    /// Discover tests, build the registry and perform pre-run setup.
    ///
    /// ## Errors
    /// - [`RunError::TestManifest`] when discovery yields zero test cases.
    /// - Configuration and framework errors abort before any test runs.
    ///
    /// On error the framework is shut down (if it was started) and the controller returns to `Idle`.
    #[tracing::instrument(skip_all, fields(root = %settings.root.display(), seed = settings.options.seed))]
    pub fn configure(&mut self, settings: RunSettings) -> Result<(), RunError> {
        if self.state != RunState::Idle {
            return Err(RunError::InvalidState {
                action: "configure",
                state: self.state,
            });
        }
        self.state = RunState::Configuring;

        if let Err(err) = self.load(&settings) {
            tracing::warn!(error = %err, "run configuration failed");
            self.registry = TestRegistry::default();
            self.state = RunState::Idle;
            return Err(err);
        }

        tracing::info!(tests = self.registry.len(), "test registry ready");
        self.settings = Some(settings);
        self.state = RunState::Ready;
        Ok(())
    }

    fn load(&mut self, settings: &RunSettings) -> Result<(), RunError> {
        let files = list_test_files(&settings.root, &settings.discovery, &settings.args.targeted_paths())?;
        tracing::info!(files = files.len(), framework = self.framework.name(), "loading test files");

        self.framework.prepare(&settings.options)?;
        self.reporter = build_reporter(settings);
        self.framework.start();

        let collected = self.collect(settings, &files);
        if collected.is_err() {
            self.framework.shutdown();
        }
        collected
    }

    fn collect(&mut self, settings: &RunSettings, files: &[String]) -> Result<(), RunError> {
        let mut discovered = self.framework.discover(&settings.root, files)?;
        let mut rng = StdRng::seed_from_u64(settings.options.seed);
        discovered.shuffle(&mut rng);

        self.registry = TestRegistry::build(discovered, &settings.root);
        if !self.registry.duplicates().is_empty() {
            let locations: Vec<String> = self.registry.duplicates().iter().map(ToString::to_string).collect();
            tracing::warn!(
                count = locations.len(),
                "duplicate test ids found; later definitions will not run: {}",
                locations.join(", ")
            );
        }
        self.reporter
            .on_collection_complete(self.registry.len(), self.registry.duplicates());

        if self.registry.is_empty() {
            return Err(RunError::TestManifest("No test cases found".to_string()));
        }
        Ok(())
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// IDs targeted on the command line (empty when the whole registry is in scope).
    pub fn targeted_ids(&self) -> &[String] {
        match &self.settings {
            Some(settings) => &settings.args.targeted_ids,
            None => &[],
        }
    }

    pub fn info(&self) -> RunnerInfo {
        let base_test_path = self
            .settings
            .as_ref()
            .map_or_else(|| DiscoveryConfig::default().base_test_path(), |s| s.discovery.base_test_path());
        RunnerInfo {
            framework: self.framework.name().to_string(),
            framework_version: self.framework.version(),
            wrapper_version: SELECTIVE_VERSION.to_string(),
            base_test_path,
        }
    }

    /// Build the manifest of targeted IDs, or of the whole registry.
    pub fn manifest(&self) -> Result<Manifest, RunError> {
        self.ensure_active("build a manifest")?;
        Ok(build_manifest(&self.registry, self.targeted_ids())?)
    }

    /// Run `test_ids` in order, handing each result to `on_result` as soon as it is formatted.
    pub fn run_test_cases(
        &mut self,
        test_ids: &[String],
        on_result: impl FnMut(TestResult),
    ) -> Result<ExecutionReport, RunError> {
        self.ensure_active("run test cases")?;
        self.state = RunState::Executing;
        Ok(executor::run_test_cases(
            &self.registry,
            self.framework.as_mut(),
            &mut self.reporter,
            test_ids,
            on_result,
        ))
    }

    /// Forget a previously reported result so a re-run of the same ID decides the exit status.
    pub fn remove_test_case_result(&mut self, test_id: &str) -> Result<bool, RunError> {
        self.ensure_active("remove a test case result")?;
        let known = self.reporter.summary_reporter().results().iter().any(|r| r.id == test_id);
        if known {
            self.reporter.on_result_removed(test_id);
        }
        Ok(known)
    }

    /// `0` if no non-skipped failure is currently recorded, else `1`.
    pub fn exit_status(&self) -> i32 {
        if self.reporter.summary_reporter().summary().is_success() { 0 } else { 1 }
    }

    /// Register a hook to run at [`RunController::finish`]. Hooks run in reverse registration order.
    pub fn add_after_run(&mut self, hook: impl FnOnce() + 'static) {
        self.after_run.push(Box::new(hook));
    }

    /// Aggregate the summary, run after-run hooks and compute the exit status. Terminal.
    pub fn finish(&mut self) -> Result<RunOutcome, RunError> {
        self.ensure_active("finish")?;

        self.framework.shutdown();
        let summary = self.reporter.summary_reporter().summary();
        self.reporter.on_run_complete(&summary);

        while let Some(hook) = self.after_run.pop() {
            hook();
        }

        self.state = RunState::Finalized;
        let exit_status = if summary.is_success() { 0 } else { 1 };
        tracing::info!(
            total = summary.total,
            failed = summary.failed,
            exit_status,
            "run finalized"
        );
        Ok(RunOutcome { exit_status, summary })
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), RunError> {
        match self.state {
            RunState::Ready | RunState::Executing => Ok(()),
            RunState::Finalized => Err(RunError::Finalized { action }),
            state => Err(RunError::InvalidState { action, state }),
        }
    }
}

fn build_reporter(settings: &RunSettings) -> CompositeReporter {
    let mut reporter = CompositeReporter::new().with(Box::new(ConsoleReporter::new()));
    if !settings.options.quiet && !settings.args.wrapper.no_progress {
        reporter.push(Box::new(ProgressReporter::new(settings.args.wrapper.verbose)));
    }
    reporter
}
