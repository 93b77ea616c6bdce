use scene_data_path::{
    as_path, format_path, get, has, lookup, parent, remove, set_value, unset_value,
    write, write_shaped, Lookup, PathError,
};
use serde_json::json;

#[test]
fn path_ops_matrix_as_path_forms_agree() {
    let dotted = as_path("collider.translationLock.0");
    let steps = as_path(["collider", "translationLock", "0"]);
    let owned = as_path(vec!["collider".to_string(), "translationLock".into(), "0".into()]);
    assert_eq!(dotted, steps);
    assert_eq!(dotted, owned);
    assert_eq!(format_path(&dotted), "collider.translationLock.0");
    assert!(as_path("").is_empty());
    assert_eq!(parent(&dotted), Some(as_path("collider.translationLock")));
}

#[test]
fn path_ops_matrix_has_stops_at_first_missing_step() {
    let doc = json!({"material": {"map": null, "color": "red"}, "tags": ["a"]});
    assert!(has(&doc, "material.color"));
    assert!(!has(&doc, "material.map"));
    assert!(!has(&doc, "material.map.offset"));
    assert!(!has(&doc, "material.color.r"));
    assert!(!has(&doc, "missing.deeply.nested"));
    assert!(has(&doc, "tags.0"));
    assert!(!has(&doc, "tags.1"));
    assert_eq!(get(&doc, "material.color"), Some(&json!("red")));
}

#[test]
fn path_ops_matrix_lookup_reports_blockers() {
    let doc = json!({"size": 3, "tags": ["a"]});
    assert_eq!(
        lookup(&doc, &as_path("size.x")),
        Lookup::Blocked {
            depth: 1,
            value: &json!(3)
        }
    );
    assert!(matches!(lookup(&doc, &as_path("tags.name")), Lookup::Blocked { .. }));
    assert_eq!(lookup(&doc, &as_path("tags.4")), Lookup::Missing);
    assert_eq!(lookup(&doc, &as_path("other.x")), Lookup::Missing);
}

#[test]
fn path_ops_matrix_single_step_edits_copy() {
    let doc = json!({"a": 1});
    let next = set_value(&doc, "b", json!(2)).unwrap();
    assert_eq!(doc, json!({"a": 1}));
    assert_eq!(next, json!({"a": 1, "b": 2}));

    assert_eq!(unset_value(&json!({"a": 1}), "a").unwrap(), None);
    assert_eq!(
        unset_value(&json!([1, 2, 3]), "1").unwrap(),
        Some(json!([1, 3]))
    );
    assert_eq!(
        set_value(&json!(["x"]), "y", json!(1)),
        Err(PathError::InvalidArrayKey { key: "y".into() })
    );
    assert_eq!(
        unset_value(&json!("text"), "0"),
        Err(PathError::NotContainer { key: "0".into() })
    );
}

#[test]
fn path_ops_matrix_write_and_remove_in_place() {
    let mut doc = json!({"a": 5});
    write(&mut doc, &as_path("a.b.c"), json!(1));
    write(&mut doc, &as_path("slots.2"), json!("z"));
    write_shaped(&mut doc, &as_path("list.2"), json!("z"), &json!({"list": [0, 0, 0]}));
    assert_eq!(
        doc,
        json!({"a": {"b": {"c": 1}}, "slots": {"2": "z"}, "list": [null, null, "z"]})
    );

    let mut doc = json!({"a": {"b": {"c": 1}}, "d": [1, 2]});
    assert_eq!(remove(&mut doc, &as_path("a.b.c")), Some(json!(1)));
    assert_eq!(remove(&mut doc, &as_path("d.0")), Some(json!(1)));
    assert_eq!(remove(&mut doc, &as_path("x.y")), None);
    assert_eq!(doc, json!({"d": [null, 2]}));
}

#[test]
fn path_ops_matrix_array_leaf_removal_keeps_positions() {
    let mut doc = json!({"tags": ["x", "y"], "k": 1});
    for path in ["tags.0", "tags.1", "k"] {
        assert!(remove(&mut doc, &as_path(path)).is_some());
    }
    assert_eq!(doc, json!({}));

    let mut doc = json!({"tags": ["x", "y", "z"]});
    remove(&mut doc, &as_path("tags.0"));
    remove(&mut doc, &as_path("tags.2"));
    assert_eq!(doc, json!({"tags": [null, "y"]}));
}

#[test]
fn path_ops_matrix_index_bounds() {
    assert_eq!(
        set_value(&json!([1, 2]), "2", json!(3)).unwrap(),
        json!([1, 2, 3])
    );
    assert_eq!(
        set_value(&json!([1, 2]), "4000000000", json!(3)),
        Err(PathError::IndexOutOfBounds { key: "4000000000".into(), len: 2 })
    );
    let mut doc = json!([1]);
    write(&mut doc, &as_path("4000000000"), json!(3));
    assert_eq!(doc, json!([1]));
}
