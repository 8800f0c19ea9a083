//! Property tests for delta computation.
//!
//! Documents are generated from a small key alphabet (including `/` and `~`
//! to exercise pointer escaping) so that generated pairs overlap often.

use ldutils_patch::{apply_patch, compute_delta};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        prop::sample::select(vec!["allow", "deny", "*", "proj/*"]).prop_map(Value::from),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec(
                (
                    prop::sample::select(vec!["key", "name", "_id", "a/b", "c~d", "on"]),
                    inner
                ),
                0..5
            )
            .prop_map(|members| {
                let mut map = Map::new();
                for (key, value) in members {
                    map.insert(key.to_string(), value);
                }
                Value::Object(map)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn delta_of_identical_documents_is_empty(doc in document()) {
        prop_assert!(compute_delta(&doc, &doc).is_empty());
    }

    #[test]
    fn applying_delta_reaches_desired(current in document(), desired in document()) {
        let delta = compute_delta(&current, &desired);
        let mut doc = current.clone();
        prop_assert_eq!(apply_patch(&mut doc, &delta), Ok(()));
        prop_assert_eq!(doc, desired);
    }

    #[test]
    fn delta_is_deterministic(current in document(), desired in document()) {
        prop_assert_eq!(
            compute_delta(&current, &desired),
            compute_delta(&current, &desired)
        );
    }
}
