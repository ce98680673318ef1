//! Manifest: the pre-execution listing of test IDs a scheduler selects from.

use serde::{Deserialize, Serialize};

use crate::errors::ManifestError;
use crate::identity::id_file_path;
use crate::registry::TestRegistry;

/// One manifest entry. `run_time` is always `0.0`: the manifest describes what could run, not results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub file_path: String,
    pub run_time: f64,
}

/// `{ "test_cases": [ {id, file_path, run_time}, ... ] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub test_cases: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.test_cases.iter().map(|entry| entry.id.as_str())
    }
}

/// Build the manifest for `registry`.
///
/// ## Parameters
/// - `targeted_ids`: IDs the caller already selected. Empty means "every ID in the registry".
///
/// ## Errors
/// - [`ManifestError::EmptyRegistry`] when the registry holds zero test cases, regardless of targeting.
///
/// ## Notes
/// - Targeted IDs are listed in caller order. A targeted ID missing from the registry keeps its entry, with the
///   file path taken from the ID prefix.
pub fn build_manifest(registry: &TestRegistry, targeted_ids: &[String]) -> Result<Manifest, ManifestError> {
    if registry.is_empty() {
        return Err(ManifestError::EmptyRegistry);
    }

    let test_cases = if targeted_ids.is_empty() {
        registry
            .iter()
            .map(|case| ManifestEntry {
                id: case.id.clone(),
                file_path: case.file_path.clone(),
                run_time: 0.0,
            })
            .collect()
    } else {
        targeted_ids
            .iter()
            .map(|id| {
                let file_path = match registry.get(id) {
                    Some(case) => case.file_path.clone(),
                    None => {
                        tracing::warn!(id = %id, "targeted test id is not in the registry");
                        id_file_path(id).to_string()
                    }
                };
                ManifestEntry {
                    id: id.clone(),
                    file_path,
                    run_time: 0.0,
                }
            })
            .collect()
    };

    Ok(Manifest { test_cases })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TestCase;

    fn registry(ids: &[&str]) -> TestRegistry {
        TestRegistry::from_cases(ids.iter().map(|id| TestCase {
            id: id.to_string(),
            group: "G".to_string(),
            method: id.to_string(),
            file_path: id_file_path(id).to_string(),
            line_number: Some(1),
        }))
    }

    #[test]
    fn untargeted_manifest_lists_every_registry_entry() {
        let registry = registry(&["a_test.rb:aaa", "b_test.rb:bbb"]);
        let manifest = build_manifest(&registry, &[]).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.ids().collect::<Vec<_>>(), vec!["a_test.rb:aaa", "b_test.rb:bbb"]);
        assert!(manifest.test_cases.iter().all(|e| e.run_time == 0.0));
        assert_eq!(manifest.test_cases[1].file_path, "b_test.rb");
    }

    #[test]
    fn targeted_manifest_lists_exactly_the_targets() {
        let registry = registry(&["a_test.rb:aaa", "b_test.rb:bbb", "c_test.rb:ccc"]);
        let targets = vec!["c_test.rb:ccc".to_string(), "a_test.rb:aaa".to_string()];
        let manifest = build_manifest(&registry, &targets).unwrap();

        assert_eq!(manifest.ids().collect::<Vec<_>>(), vec!["c_test.rb:ccc", "a_test.rb:aaa"]);
    }

    #[test]
    fn unknown_target_takes_path_from_id() {
        let registry = registry(&["a_test.rb:aaa"]);
        let manifest = build_manifest(&registry, &["gone/old_test.rb:fff".to_string()]).unwrap();
        assert_eq!(manifest.test_cases[0].file_path, "gone/old_test.rb");
    }

    #[test]
    fn empty_registry_is_an_error() {
        let empty = TestRegistry::default();
        assert_eq!(build_manifest(&empty, &[]), Err(ManifestError::EmptyRegistry));
        assert_eq!(
            build_manifest(&empty, &["a:b".to_string()]),
            Err(ManifestError::EmptyRegistry)
        );
    }

    #[test]
    fn serializes_to_scheduler_shape() {
        let manifest = build_manifest(&registry(&["a_test.rb:aaa"]), &[]).unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "test_cases": [{ "id": "a_test.rb:aaa", "file_path": "a_test.rb", "run_time": 0.0 }]
            })
        );
    }
}
