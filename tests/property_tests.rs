//! Property-based тесты проверки передаваемости payload.

use postbox::{
    pubsub::{find_unsafe, is_safe_to_publish},
    value::{from_json, to_json},
};
use proptest::prelude::*;

mod generators;
use generators::*;

const PROPTEST_CASES: u32 = 512;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Деревья из одних передаваемых значений всегда проходят проверку.
    #[test]
    fn prop_safe_trees_are_publishable(tree in safe_tree()) {
        prop_assert!(is_safe_to_publish(&tree));
        prop_assert!(find_unsafe(&tree).is_none());
    }

    /// Один непередаваемый лист на любой глубине делает payload
    /// непередаваемым, и `find_unsafe` находит значение этого вида.
    #[test]
    fn prop_one_unsafe_leaf_poisons_the_tree(
        tree in safe_tree(),
        leaf in unsafe_leaf(),
        path in insertion_path(),
    ) {
        let kind = leaf.kind();
        let poisoned = plant(tree, &path, leaf);
        prop_assert!(!is_safe_to_publish(&poisoned));
        let found = find_unsafe(&poisoned);
        prop_assert!(found.is_some());
        prop_assert_eq!(found.map(|f| f.kind), Some(kind));
    }

    /// JSON-кодирование возможно ровно для передаваемых деревьев и
    /// обратимо для них.
    #[test]
    fn prop_json_agrees_with_validator(tree in safe_tree()) {
        let json = to_json(&tree).unwrap();
        prop_assert_eq!(from_json(json), tree);
    }

    #[test]
    fn prop_json_rejects_unsafe(
        tree in safe_tree(),
        leaf in unsafe_leaf(),
        path in insertion_path(),
    ) {
        let poisoned = plant(tree, &path, leaf);
        prop_assert!(to_json(&poisoned).is_err());
    }
}
