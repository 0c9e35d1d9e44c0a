//! Property tests for merging, codecs and exclusions.

use proptest::prelude::*;
use statesync::codec::{query, url};
use statesync::{
    Change, ChangeSet, ExclusionList, MemoryStorage, QueryMap, State, StatePatch, StateStore,
    StateValue, StaticLocation, StorageBackend, StoreConfig, Update,
};
use std::sync::Arc;

const BASE: &str = "https://example.com/";

fn value_strategy() -> impl Strategy<Value = StateValue> {
    prop_oneof![
        any::<bool>().prop_map(StateValue::from),
        (-5i32..5).prop_map(StateValue::from),
        "[a-c ]{0,3}".prop_map(StateValue::from),
    ]
}

fn update_strategy() -> impl Strategy<Value = Update> {
    prop_oneof![
        3 => value_strategy().prop_map(Update::Set),
        1 => Just(Update::Delete),
        1 => Just(Update::NoChange),
    ]
}

fn state_strategy() -> impl Strategy<Value = State> {
    prop::collection::vec(("[a-e]", value_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn patch_strategy() -> impl Strategy<Value = StatePatch> {
    prop::collection::vec(("[a-g]", update_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn test_store() -> StateStore {
    StateStore::new(StoreConfig::default(), Arc::new(StaticLocation::new(BASE)))
}

proptest! {
    #[test]
    fn prop_merge_delta(initial in state_strategy(), patch in patch_strategy()) {
        let store = test_store();
        store.update_state(&StatePatch::from(&initial), false);

        let changed = store.update_state(&patch, false);

        let mut expected_changes = ChangeSet::new();
        let mut expected_state = initial.clone();
        for (key, update) in patch.iter() {
            match update {
                Update::Set(value) => {
                    if initial.get(key) != Some(value) {
                        expected_changes.insert(key.clone(), Change::Set(value.clone()));
                    }
                    expected_state.insert(key.clone(), value.clone());
                }
                Update::Delete => {
                    if initial.contains_key(key) {
                        expected_changes.insert(key.clone(), Change::Deleted);
                    }
                    expected_state.shift_remove(key);
                }
                Update::NoChange => {}
            }
        }

        prop_assert_eq!(changed, expected_changes);
        prop_assert_eq!(store.state().unwrap(), expected_state);
    }

    #[test]
    fn prop_first_write(patch in patch_strategy()) {
        let store = test_store();

        let changed = store.update_state(&patch, false);

        let set_entries: State = patch
            .iter()
            .filter_map(|(key, update)| match update {
                Update::Set(value) => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect();
        let as_changes: ChangeSet = set_entries
            .iter()
            .map(|(key, value)| (key.clone(), Change::Set(value.clone())))
            .collect();

        prop_assert_eq!(store.state().unwrap(), set_entries);
        prop_assert_eq!(changed, as_changes);
    }

    #[test]
    fn prop_query_round_trip(
        pairs in prop::collection::vec(("[a-zA-Z0-9 ._~-]{0,6}", "[a-zA-Z0-9 ._~/é-]{0,6}"), 1..6)
    ) {
        let expected: QueryMap = pairs.into_iter().collect();

        let encoded = query::serialize_pairs(
            expected.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let decoded = query::parse(Some(&encoded)).unwrap().unwrap();

        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn prop_url_normalization(
        segments in prop::collection::vec("[a-z0-9]{1,6}", 0..4),
        params in prop::collection::vec(("[a-z]{1,4}", "[a-z0-9 ]{0,4}"), 0..3),
        fragment in prop::option::of("[a-z0-9]{0,5}"),
        with_question in any::<bool>(),
    ) {
        let mut input = format!("https://Host.Test/{}", segments.join("/"));
        if with_question || !params.is_empty() {
            input.push('?');
            input.push_str(
                &params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("&"),
            );
        }
        if let Some(fragment) = &fragment {
            input.push('#');
            input.push_str(fragment);
        }

        let first = url::parse(&input, BASE).unwrap();
        prop_assert!(!first.pathname.starts_with('/'));
        prop_assert!(!first.search.starts_with('?'));
        prop_assert_eq!(&first.hostname, "host.test");

        let second = url::parse(&first.href, BASE).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_exclusions_hold_both_ways(
        state in prop::collection::vec(
            (prop_oneof![
                Just("hash".to_string()),
                Just("pathname".to_string()),
                Just("secret".to_string()),
                "[a-d]{1,3}",
            ], value_strategy()),
            0..8,
        ).prop_map(|pairs| pairs.into_iter().collect::<State>())
    ) {
        let exclude = ExclusionList::new(["hash", "pathname", "secret"]);
        let storage = Arc::new(MemoryStorage::new());
        let store = test_store().with_storage(storage.clone());

        prop_assert!(store.save_state("slot", Some(&state), Some(&exclude)).unwrap());
        let stored: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&storage.get_item("slot").unwrap().unwrap()).unwrap();
        for key in exclude.iter() {
            prop_assert!(!stored.contains_key(key));
        }

        let reflected = store.reflect_state_in_url(Some(&state), Some(&exclude)).unwrap();
        let params = query::parse(Some(&reflected.search)).unwrap().unwrap_or_default();
        for key in exclude.iter() {
            prop_assert!(!params.contains_key(key));
        }
        for key in state.keys().filter(|k| !exclude.contains(k)) {
            prop_assert!(params.contains_key(key.as_str()));
        }
    }
}
