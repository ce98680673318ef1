//! Test file discovery
//!
//! Lists candidate test files relative to the project root: either the files owning the targeted test IDs,
//! or every file matching the default glob, narrowed by the include/exclude patterns.

use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use super::config::{ConfigError, DiscoveryConfig};

/// List the test files to load, relative to `root`, sorted.
///
/// ## Notes
/// - Targeted paths bypass the glob and the include/exclude filters; a targeted file that does not exist is
///   reported and skipped.
pub fn list_test_files(root: &Path, config: &DiscoveryConfig, targeted_paths: &[String]) -> Result<Vec<String>, ConfigError> {
    if !targeted_paths.is_empty() {
        let mut files: Vec<String> = targeted_paths
            .iter()
            .filter(|path| {
                let exists = root.join(path).is_file();
                if !exists {
                    tracing::warn!(path = %path, "targeted test file does not exist");
                }
                exists
            })
            .cloned()
            .collect();
        files.sort();
        return Ok(files);
    }

    let matcher = compile_glob(&config.default_test_glob)?;
    let mut files = Vec::new();
    walk(root, root, &matcher, &mut files);

    if let Some(include) = &config.include_pattern {
        files.retain(|file| include.is_match(file));
    }
    if let Some(exclude) = &config.exclude_pattern {
        files.retain(|file| !exclude.is_match(file));
    }

    files.sort();
    Ok(files)
}

fn compile_glob(glob: &str) -> Result<GlobMatcher, ConfigError> {
    let glob = glob.trim_start_matches("./");
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| ConfigError::InvalidGlob {
            glob: glob.to_string(),
            source,
        })
}

fn walk(root: &Path, dir: &Path, matcher: &GlobMatcher, files: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if path.is_dir() {
            if !name.starts_with('.') && name != "target" && name != "node_modules" {
                walk(root, &path, matcher, files);
            }
        } else if let Some(relative) = selective_core::normalize_path(&path, root) {
            if matcher.is_match(&relative) {
                files.push(relative);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use regex::Regex;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in [
            "tests/math.rs",
            "tests/strings.rs",
            "tests/slow_io.rs",
            "tests/common/mod.rs",
            "src/lib.rs",
            "target/debug/tests/stale.rs",
        ] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        dir
    }

    #[test]
    fn default_glob_matches_top_level_test_files() {
        let dir = project();
        let files = list_test_files(dir.path(), &DiscoveryConfig::default(), &[]).unwrap();
        assert_eq!(files, vec!["tests/math.rs", "tests/slow_io.rs", "tests/strings.rs"]);
    }

    #[test]
    fn recursive_glob_skips_target() {
        let dir = project();
        let config = DiscoveryConfig {
            default_test_glob: "**/*.rs".to_string(),
            ..DiscoveryConfig::default()
        };
        let files = list_test_files(dir.path(), &config, &[]).unwrap();
        assert!(files.contains(&"tests/common/mod.rs".to_string()));
        assert!(files.contains(&"src/lib.rs".to_string()));
        assert!(!files.iter().any(|f| f.starts_with("target/")));
    }

    #[test]
    fn include_and_exclude_patterns_filter() {
        let dir = project();
        let config = DiscoveryConfig {
            include_pattern: Some(Regex::new("^tests/").unwrap()),
            exclude_pattern: Some(Regex::new("slow").unwrap()),
            ..DiscoveryConfig::default()
        };
        let files = list_test_files(dir.path(), &config, &[]).unwrap();
        assert_eq!(files, vec!["tests/math.rs", "tests/strings.rs"]);
    }

    #[test]
    fn targeted_paths_bypass_glob() {
        let dir = project();
        let targeted = vec!["src/lib.rs".to_string(), "tests/missing.rs".to_string()];
        let files = list_test_files(dir.path(), &DiscoveryConfig::default(), &targeted).unwrap();
        assert_eq!(files, vec!["src/lib.rs"]);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let config = DiscoveryConfig {
            default_test_glob: "tests/[".to_string(),
            ..DiscoveryConfig::default()
        };
        let dir = project();
        assert!(matches!(
            list_test_files(dir.path(), &config, &[]),
            Err(ConfigError::InvalidGlob { .. })
        ));
    }
}
