//! Registry of discovered test cases keyed by stable test ID.
//!
//! The registry is built once from a (shuffled) discovery pass and is read-only afterwards. ID collisions are
//! detected rather than overwritten: the first occurrence wins, later ones are recorded as duplicates and are
//! never selectable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::DuplicateTestId;
use crate::identity::{normalize_path, test_id};

/// A runnable unit as reported by a framework's discovery, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTest {
    /// Logical container (class, module path, suite).
    pub group: String,
    /// Name of the runnable unit within its group.
    pub method: String,
    /// Source file, absolute or relative to the project root.
    pub file_path: PathBuf,
    /// Source line of the definition, when known.
    pub line: Option<u32>,
}

impl DiscoveredTest {
    pub fn new(group: impl Into<String>, method: impl Into<String>, file_path: impl Into<PathBuf>, line: Option<u32>) -> Self {
        Self {
            group: group.into(),
            method: method.into(),
            file_path: file_path.into(),
            line,
        }
    }
}

/// A discovered test case with its stable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    pub group: String,
    pub method: String,
    /// Path relative to the project root, `/`-separated. Never absolute.
    pub file_path: String,
    pub line_number: Option<u32>,
}

/// The full `test ID → TestCase` mapping plus discovery order and duplicates.
#[derive(Debug, Default, Clone)]
pub struct TestRegistry {
    order: Vec<String>,
    cases: HashMap<String, TestCase>,
    duplicates: Vec<DuplicateTestId>,
}

impl TestRegistry {
    /// Assign identities to `discovered` (in the given order) and build the registry.
    ///
    /// ## Notes
    /// - Paths are normalized relative to `root`. A test whose path cannot be expressed relative to `root` is
    ///   dropped with a warning instead of leaking an absolute path into its ID.
    pub fn build(discovered: impl IntoIterator<Item = DiscoveredTest>, root: &Path) -> Self {
        let cases = discovered.into_iter().filter_map(|test| {
            let Some(file_path) = normalize_path(&test.file_path, root) else {
                tracing::warn!(
                    path = %test.file_path.display(),
                    group = %test.group,
                    method = %test.method,
                    "test file is outside the project root; skipping"
                );
                return None;
            };
            Some(TestCase {
                id: test_id(&file_path, &test.group, &test.method),
                group: test.group,
                method: test.method,
                file_path,
                line_number: test.line,
            })
        });
        Self::from_cases(cases)
    }

    /// Build a registry from test cases whose IDs are already assigned.
    pub fn from_cases(cases: impl IntoIterator<Item = TestCase>) -> Self {
        let mut registry = Self::default();
        for case in cases {
            if let Some(existing) = registry.cases.get(&case.id) {
                tracing::debug!(id = %case.id, kept = %existing.file_path, "duplicate test id");
                registry.duplicates.push(DuplicateTestId {
                    test_id: case.id,
                    file_path: case.file_path,
                    line_number: case.line_number.unwrap_or(0),
                });
                continue;
            }
            registry.order.push(case.id.clone());
            registry.cases.insert(case.id.clone(), case);
        }
        registry
    }

    pub fn get(&self, test_id: &str) -> Option<&TestCase> {
        self.cases.get(test_id)
    }

    pub fn contains(&self, test_id: &str) -> bool {
        self.cases.contains_key(test_id)
    }

    /// All selectable IDs, in registry (post-shuffle discovery) order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Test cases in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.order.iter().filter_map(|id| self.cases.get(id))
    }

    /// Test cases rejected because their ID collided with an earlier one.
    pub fn duplicates(&self) -> &[DuplicateTestId] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
