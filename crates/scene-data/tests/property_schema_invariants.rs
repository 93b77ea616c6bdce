use proptest::prelude::*;
use scene_data::DataSchema;
use scene_data_path::{has, write_shaped};
use serde_json::{Map, Value};

fn key(keys: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(keys).prop_map(String::from)
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        (-100i64..100).prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
    ]
}

fn to_object(entries: std::collections::BTreeMap<String, Value>) -> Value {
    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
}

/// Nested containers are never empty and hold no `null`s, so pruning never
/// changes a tree.
fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(2, 16, 3, |inner| {
        prop_oneof![
            prop::collection::btree_map(key(&["a", "b", "c", "d"]), inner.clone(), 1..3)
                .prop_map(to_object),
            prop::collection::vec(inner, 1..3).prop_map(Value::Array),
        ]
    })
}

fn object_over(keys: &'static [&'static str]) -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key(keys), tree(), 0..4).prop_map(to_object)
}

/// Object keys and array indices, so paths run into and through arrays.
fn path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(key(&["a", "b", "c", "d", "0", "1"]), 1..4)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn unset_after_set_restores_input(
        obj in object_over(&["a", "b", "c", "d"]),
        path in path(),
        value in leaf(),
    ) {
        let schema = DataSchema::new();
        prop_assume!(!has(&obj, &path));
        let written = schema.set(&obj, &path, value.clone());
        prop_assume!(written.is_ok());
        let written = written.unwrap();
        prop_assert_eq!(schema.get(&written, &path), Some(&value));
        let restored = schema.unset(&written, &path).unwrap();
        prop_assert!(schema.equals(&restored, &obj), "{} != {}", restored, obj);
    }

    #[test]
    fn union_with_empty_is_identity(obj in object_over(&["a", "b", "c", "d"])) {
        let schema = DataSchema::new();
        let empty = Value::Object(Map::new());
        prop_assert!(schema.equals(&schema.union(&obj, &empty), &obj));
        prop_assert!(schema.equals(&schema.union(&empty, &obj), &obj));
    }

    #[test]
    fn assign_of_disjoint_trees_is_symmetric(
        a in object_over(&["a", "b"]),
        b in object_over(&["c", "d"]),
    ) {
        let schema = DataSchema::new();
        let ab = schema.assign(&a, &b);
        let ba = schema.assign(&b, &a);
        prop_assert!(schema.equals(&ab, &ba));
        prop_assert!(schema.includes(&ab, &a));
        prop_assert!(schema.includes(&ab, &b));
    }

    #[test]
    fn substract_removes_exactly_the_leaves_of_b(obj in object_over(&["a", "b", "c", "d"])) {
        let schema = DataSchema::new();
        let stripped = schema.substract(&obj, &obj);
        prop_assert!(schema.equals(&stripped, &Value::Object(Map::new())));
        prop_assert!(schema.equals(&schema.extract(&obj, &obj), &obj));
    }

    #[test]
    fn pushing_overrides_into_the_base_keeps_the_merged_view(
        base in object_over(&["a", "b", "c", "d"]),
        edits in prop::collection::vec(prop::option::of(leaf()), 0..16),
    ) {
        let schema = DataSchema::new();
        let mut own = Value::Object(Map::new());
        for (path, edit) in schema.leaf_path_steps(&base).iter().zip(edits) {
            if let Some(value) = edit {
                write_shaped(&mut own, path, value, &base);
            }
        }
        let merged = schema.union(&own, &base);
        let own_after = schema.substract(&own, &own);
        let base_after = schema.assign(&base, &own);
        prop_assert!(schema.equals(&own_after, &Value::Object(Map::new())));
        let merged_after = schema.union(&own_after, &base_after);
        prop_assert!(schema.equals(&merged_after, &merged), "{} != {}", merged_after, merged);
    }
}
