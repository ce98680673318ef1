//! Property-based tests for test identity and registry invariants

use std::path::Path;

use proptest::prelude::*;
use selective_core::{DiscoveredTest, TestRegistry, build_manifest, test_id};

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,12}"
}

fn discovered() -> impl Strategy<Value = Vec<DiscoveredTest>> {
    prop::collection::vec(
        (name(), name(), prop::sample::select(vec!["tests/a.rs", "tests/b.rs", "src/lib.rs"]), 1u32..500),
        0..40,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(group, method, file, line)| DiscoveredTest::new(group, method, file, Some(line)))
            .collect()
    })
}

proptest! {
    /// Property: IDs depend only on (path, group, method), so two discovery runs agree.
    #[test]
    fn ids_are_deterministic(path in "[a-z]{1,8}/[a-z_]{1,8}\\.rs", group in name(), method in name()) {
        prop_assert_eq!(test_id(&path, &group, &method), test_id(&path, &group, &method));
    }

    /// Property: IDs never contain an absolute path.
    #[test]
    fn built_ids_are_relative(tests in discovered()) {
        let registry = TestRegistry::build(tests, Path::new("/root/project"));
        for case in registry.iter() {
            prop_assert!(!case.id.starts_with('/'));
        }
    }

    /// Property: every discovered test is either selectable or listed as a duplicate.
    #[test]
    fn registry_accounts_for_every_test(tests in discovered()) {
        let total = tests.len();
        let registry = TestRegistry::build(tests, Path::new("/root/project"));
        prop_assert_eq!(registry.len() + registry.duplicates().len(), total);

        let mut seen = std::collections::HashSet::new();
        for id in registry.ids() {
            prop_assert!(seen.insert(id.clone()), "id listed twice: {}", id);
        }
        for dup in registry.duplicates() {
            prop_assert!(registry.contains(&dup.test_id));
        }
    }

    /// Property: shuffling discovery order does not change the set of IDs.
    #[test]
    fn order_does_not_change_ids(tests in discovered()) {
        let root = Path::new("/root/project");
        let mut reversed = tests.clone();
        reversed.reverse();

        let mut forward: Vec<String> = TestRegistry::build(tests, root).ids().to_vec();
        let mut backward: Vec<String> = TestRegistry::build(reversed, root).ids().to_vec();
        forward.sort();
        backward.sort();
        prop_assert_eq!(forward, backward);
    }

    /// Property: an untargeted manifest has one zero-time entry per registry entry.
    #[test]
    fn manifest_covers_registry(tests in discovered()) {
        let registry = TestRegistry::build(tests, Path::new("/root/project"));
        match build_manifest(&registry, &[]) {
            Ok(manifest) => {
                prop_assert_eq!(manifest.len(), registry.len());
                prop_assert!(manifest.test_cases.iter().all(|e| e.run_time == 0.0));
            }
            Err(_) => prop_assert!(registry.is_empty()),
        }
    }
}
