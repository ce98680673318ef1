//! Run configuration: argument partitioning, framework options and environment-driven discovery settings.
//!
//! Arguments follow one rule: tokens starting with `-` are flags, everything else is a targeted test ID.
//! Flags in [`SUPPORTED_WRAPPER_ARGS`] configure this wrapper; all other flags belong to the framework.

use regex::Regex;
use thiserror::Error;

/// Flags consumed by the wrapper itself (prefix match, like `--verbose=true`).
pub const SUPPORTED_WRAPPER_ARGS: &[&str] = &["--no-progress", "--verbose"];

/// Default test-file glob when `DEFAULT_TEST` is unset.
pub const DEFAULT_TEST_GLOB: &str = "tests/*.rs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid seed '{0}': expected an unsigned integer")]
    InvalidSeed(String),

    #[error("invalid {name} '{pattern}': {source}")]
    InvalidPattern {
        name: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid test glob '{glob}': {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: globset::Error,
    },
}

/// Options recognized by the wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperOptions {
    /// Do not attach the console progress reporter.
    pub no_progress: bool,
    /// Print one line per test instead of progress dots.
    pub verbose: bool,
}

impl WrapperOptions {
    fn set(&mut self, arg: &str) {
        let key = arg.trim_start_matches('-').split('=').next().unwrap_or_default().replace('-', "_");
        match key.as_str() {
            "no_progress" => self.no_progress = true,
            "verbose" => self.verbose = true,
            _ => tracing::debug!(arg, "ignoring unknown wrapper option"),
        }
    }
}

/// Arguments partitioned into targeted IDs, framework flags and wrapper options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub targeted_ids: Vec<String>,
    pub framework_args: Vec<String>,
    pub wrapper: WrapperOptions,
}

impl RunArgs {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = RunArgs::default();
        for arg in args.into_iter().map(Into::into) {
            if !arg.starts_with('-') {
                parsed.targeted_ids.push(arg);
            } else if SUPPORTED_WRAPPER_ARGS.iter().any(|p| arg.starts_with(p)) {
                parsed.wrapper.set(&arg);
            } else {
                parsed.framework_args.push(arg);
            }
        }
        parsed
    }

    /// Unique file paths owning the targeted IDs, in first-seen order.
    pub fn targeted_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for id in &self.targeted_ids {
            let path = selective_core::id_file_path(id);
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }
}

/// Framework options parsed from pass-through flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkOptions {
    /// Seed for the discovery shuffle.
    pub seed: u64,
    /// Suppress per-test progress output.
    pub quiet: bool,
    /// Flags forwarded verbatim to the test harness.
    pub harness_args: Vec<String>,
}

impl FrameworkOptions {
    /// Parse `--seed=N` and `--quiet` out of `args`; everything else is forwarded to the harness.
    ///
    /// ## Notes
    /// - Without `--seed`, the `SEED` variable from `lookup` is used, else a random 16-bit seed.
    pub fn from_args(args: &[String], lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut seed = None;
        let mut quiet = false;
        let mut harness_args = Vec::new();

        for arg in args {
            if let Some(value) = arg.strip_prefix("--seed=") {
                seed = Some(parse_seed(value)?);
            } else if arg == "--quiet" || arg == "-q" {
                quiet = true;
            } else {
                harness_args.push(arg.clone());
            }
        }

        let seed = match seed {
            Some(seed) => seed,
            None => match lookup("SEED") {
                Some(value) => parse_seed(&value)?,
                None => u64::from(rand::random::<u16>()),
            },
        };

        Ok(Self {
            seed,
            quiet,
            harness_args,
        })
    }
}

fn parse_seed(value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidSeed(value.to_string()))
}

/// Discovery settings read from the environment.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Glob (relative to the project root) selecting test files.
    pub default_test_glob: String,
    /// Keep only candidate paths matching this pattern.
    pub include_pattern: Option<Regex>,
    /// Drop candidate paths matching this pattern.
    pub exclude_pattern: Option<Regex>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_test_glob: DEFAULT_TEST_GLOB.to_string(),
            include_pattern: None,
            exclude_pattern: None,
        }
    }
}

impl DiscoveryConfig {
    /// Read `DEFAULT_TEST`, `INCLUDE_PATTERN` and `EXCLUDE_PATTERN` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let pattern = |name: &'static str| -> Result<Option<Regex>, ConfigError> {
            lookup(name)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Regex::new(&p).map_err(|source| ConfigError::InvalidPattern {
                        name,
                        pattern: p.clone(),
                        source,
                    })
                })
                .transpose()
        };

        Ok(Self {
            default_test_glob: lookup("DEFAULT_TEST")
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| DEFAULT_TEST_GLOB.to_string()),
            include_pattern: pattern("INCLUDE_PATTERN")?,
            exclude_pattern: pattern("EXCLUDE_PATTERN")?,
        })
    }

    /// `./` followed by the first segment of the default glob (e.g. `./tests`).
    pub fn base_test_path(&self) -> String {
        let first = self.default_test_glob.split('/').next().unwrap_or_default();
        format!("./{first}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn partitions_ids_wrapper_and_framework_args() {
        let args = RunArgs::parse(["tests/a.rs:abc", "--verbose", "--seed=42", "--nocapture", "tests/b.rs:def"]);
        assert_eq!(args.targeted_ids, vec!["tests/a.rs:abc", "tests/b.rs:def"]);
        assert_eq!(args.framework_args, vec!["--seed=42", "--nocapture"]);
        assert!(args.wrapper.verbose);
        assert!(!args.wrapper.no_progress);
    }

    #[test]
    fn targeted_paths_are_unique() {
        let args = RunArgs::parse(["tests/a.rs:1", "tests/a.rs:2", "tests/b.rs:3"]);
        assert_eq!(args.targeted_paths(), vec!["tests/a.rs", "tests/b.rs"]);
    }

    #[test]
    fn seed_from_flag_then_env() {
        let args = vec!["--seed=7".to_string(), "--quiet".to_string(), "--include-ignored".to_string()];
        let options = FrameworkOptions::from_args(&args, env(&[("SEED", "99")])).unwrap();
        assert_eq!(options.seed, 7);
        assert!(options.quiet);
        assert_eq!(options.harness_args, vec!["--include-ignored"]);

        let options = FrameworkOptions::from_args(&[], env(&[("SEED", "99")])).unwrap();
        assert_eq!(options.seed, 99);
    }

    #[test]
    fn random_seed_fits_in_u16() {
        let options = FrameworkOptions::from_args(&[], env(&[])).unwrap();
        assert!(options.seed <= u64::from(u16::MAX));
    }

    #[test]
    fn invalid_seed_is_rejected() {
        let err = FrameworkOptions::from_args(&["--seed=abc".to_string()], env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeed(ref s) if s == "abc"));
    }

    #[test]
    fn discovery_config_reads_environment() {
        let config = DiscoveryConfig::from_lookup(env(&[
            ("DEFAULT_TEST", "suites/**/*_suite.rs"),
            ("INCLUDE_PATTERN", "models"),
            ("EXCLUDE_PATTERN", "slow"),
        ]))
        .unwrap();
        assert_eq!(config.default_test_glob, "suites/**/*_suite.rs");
        assert!(config.include_pattern.unwrap().is_match("suites/models/user_suite.rs"));
        assert!(config.exclude_pattern.unwrap().is_match("suites/slow_suite.rs"));
        assert_eq!(DiscoveryConfig::default().base_test_path(), "./tests");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = DiscoveryConfig::from_lookup(env(&[("INCLUDE_PATTERN", "(")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { name: "INCLUDE_PATTERN", .. }));
    }
}
