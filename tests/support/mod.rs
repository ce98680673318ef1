//! Scripted in-memory test framework for driving the runner without spawning processes.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use selective::runner::{FrameworkError, TestFramework};
use selective_core::{DiscoveredTest, Failure};

/// What a scripted test does when run.
#[derive(Debug, Clone)]
pub enum Script {
    Pass,
    Fail(&'static str),
    Skip,
    /// The framework records a failure under a different (group, method).
    FailElsewhere(&'static str, &'static str),
    /// `run_one` itself errors.
    Crash,
}

/// Shared view of what the framework saw, kept after the framework is boxed into a controller.
#[derive(Debug, Default)]
pub struct Log {
    pub runs: Vec<(String, String)>,
    pub started: bool,
    pub shut_down: bool,
    pub prepared_seed: Option<u64>,
}

pub struct ScriptedFramework {
    tests: Vec<DiscoveredTest>,
    scripts: HashMap<(String, String), Script>,
    failures: Vec<Failure>,
    log: Rc<RefCell<Log>>,
}

impl ScriptedFramework {
    pub fn new() -> Self {
        Self {
            tests: Vec::new(),
            scripts: HashMap::new(),
            failures: Vec::new(),
            log: Rc::new(RefCell::new(Log::default())),
        }
    }

    /// Add a discoverable test with its scripted behavior.
    pub fn test(mut self, group: &str, method: &str, file: &str, line: u32, script: Script) -> Self {
        self.tests
            .push(DiscoveredTest::new(group, method, file, Some(line)));
        self.scripts
            .insert((group.to_string(), method.to_string()), script);
        self
    }

    /// Seed the failure accumulator with a record left over from an earlier invocation.
    pub fn with_stale_failure(mut self, failure: Failure) -> Self {
        self.failures.push(failure);
        self
    }

    pub fn log(&self) -> Rc<RefCell<Log>> {
        Rc::clone(&self.log)
    }
}

impl TestFramework for ScriptedFramework {
    fn name(&self) -> &str {
        "scripted"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn discover(&mut self, _root: &Path, _files: &[String]) -> Result<Vec<DiscoveredTest>, FrameworkError> {
        Ok(self.tests.clone())
    }

    fn prepare(&mut self, options: &selective::runner::FrameworkOptions) -> Result<(), FrameworkError> {
        self.log.borrow_mut().prepared_seed = Some(options.seed);
        Ok(())
    }

    fn start(&mut self) {
        self.log.borrow_mut().started = true;
    }

    fn shutdown(&mut self) {
        self.log.borrow_mut().shut_down = true;
    }

    fn run_one(&mut self, group: &str, method: &str) -> Result<(), FrameworkError> {
        self.log
            .borrow_mut()
            .runs
            .push((group.to_string(), method.to_string()));

        match self.scripts.get(&(group.to_string(), method.to_string())) {
            None | Some(Script::Pass) => {}
            Some(Script::Fail(message)) => self.failures.push(
                Failure::failed(group, method, *message).with_backtrace(vec!["tests/a.rs:1:1".to_string()]),
            ),
            Some(Script::Skip) => self.failures.push(Failure::skipped(group, method, "skipped")),
            Some(Script::FailElsewhere(other_group, other_method)) => {
                self.failures
                    .push(Failure::failed(*other_group, *other_method, "elsewhere"));
            }
            Some(Script::Crash) => return Err(FrameworkError::Execution("harness exploded".to_string())),
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
