use scene_data_util::is_empty_container;
use serde_json::{Map, Value};

use crate::get::get_step;
use crate::util::parse_index;
use crate::PathError;

/// Copy-on-write assignment of a single key.
///
/// Arrays are copied and index-assigned; the key must be a decimal index no
/// greater than the length, so at most one element is appended. Objects are
/// copied and the key inserted. `null` stands for a not-yet-created object.
/// `obj` itself is left alone.
///
/// # Example
///
/// ```
/// use scene_data_path::set_value;
/// use serde_json::json;
///
/// let lock = json!([true, false, true]);
/// assert_eq!(set_value(&lock, "1", json!(true)).unwrap(), json!([true, true, true]));
/// assert_eq!(set_value(&lock, "3", json!(false)).unwrap()[3], json!(false));
/// assert!(set_value(&lock, "x", json!(true)).is_err());
/// assert!(set_value(&lock, "9", json!(true)).is_err());
/// ```
pub fn set_value(obj: &Value, key: &str, value: Value) -> Result<Value, PathError> {
    match obj {
        Value::Array(arr) => {
            let idx = parse_index(key).ok_or_else(|| PathError::InvalidArrayKey {
                key: key.to_owned(),
            })?;
            if idx > arr.len() {
                return Err(PathError::IndexOutOfBounds {
                    key: key.to_owned(),
                    len: arr.len(),
                });
            }
            let mut copy = arr.clone();
            if idx == copy.len() {
                copy.push(value);
            } else {
                copy[idx] = value;
            }
            Ok(Value::Array(copy))
        }
        Value::Object(map) => {
            let mut copy = map.clone();
            copy.insert(key.to_owned(), value);
            Ok(Value::Object(copy))
        }
        Value::Null => {
            let mut map = Map::new();
            map.insert(key.to_owned(), value);
            Ok(Value::Object(map))
        }
        _ => Err(PathError::NotContainer {
            key: key.to_owned(),
        }),
    }
}

/// Copy-on-write removal of a single key.
///
/// Returns `None` when an object is left without keys so the caller can prune
/// the parent entry instead of keeping an empty object around. Array elements
/// are removed and later elements shift down.
pub fn unset_value(obj: &Value, key: &str) -> Result<Option<Value>, PathError> {
    match obj {
        Value::Array(arr) => {
            let idx = parse_index(key).ok_or_else(|| PathError::InvalidArrayKey {
                key: key.to_owned(),
            })?;
            let mut copy = arr.clone();
            if idx < copy.len() {
                copy.remove(idx);
            }
            Ok(Some(Value::Array(copy)))
        }
        Value::Object(map) => {
            let mut copy = map.clone();
            copy.remove(key);
            if copy.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::Object(copy)))
            }
        }
        _ => Err(PathError::NotContainer {
            key: key.to_owned(),
        }),
    }
}

/// Writes `value` at `path` in place, creating objects for missing steps.
///
/// Same as [`write_shaped`] with nothing to copy container kinds from.
pub fn write(obj: &mut Value, path: &[String], value: Value) {
    write_shaped(obj, path, value, &Value::Null);
}

/// Writes `value` at `path` in place, taking the kind of every container it
/// has to create from the matching node of `shape`.
///
/// `shape` is normally the tree the path was read from: an index step under
/// an array there creates an array here. Any scalar or mismatched container
/// on the way is replaced. Arrays are padded with `null` up to the index, but
/// only within the length of the array itself or of its `shape` counterpart;
/// an index past both leaves `obj` untouched.
///
/// # Example
///
/// ```
/// use scene_data_path::{as_path, write, write_shaped};
/// use serde_json::json;
///
/// let source = json!({"tags": ["a", "b"]});
/// let mut out = json!({});
/// write_shaped(&mut out, &as_path("tags.1"), json!("b"), &source);
/// assert_eq!(out, json!({"tags": [null, "b"]}));
///
/// let mut plain = json!({});
/// write(&mut plain, &as_path("tags.1"), json!("b"));
/// assert_eq!(plain, json!({"tags": {"1": "b"}}));
/// ```
pub fn write_shaped(obj: &mut Value, path: &[String], value: Value, shape: &Value) {
    let Some((step, rest)) = path.split_first() else {
        *obj = value;
        return;
    };
    let index = parse_index(step);
    let shape_len = shape.as_array().map(Vec::len);
    let fits = match &*obj {
        Value::Array(_) => index.is_some(),
        Value::Object(_) => true,
        _ => false,
    };
    if !fits {
        *obj = match (index, shape_len) {
            (Some(_), Some(_)) => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        };
    }
    let next_shape = get_step(shape, step).unwrap_or(&Value::Null);
    match (obj, index) {
        (Value::Array(arr), Some(idx)) => {
            if idx > arr.len().max(shape_len.unwrap_or(0)) {
                return;
            }
            if arr.len() <= idx {
                arr.resize(idx + 1, Value::Null);
            }
            write_shaped(&mut arr[idx], rest, value, next_shape);
        }
        (Value::Object(map), _) => {
            let slot = map.entry(step.clone()).or_insert(Value::Null);
            write_shaped(slot, rest, value, next_shape);
        }
        _ => {}
    }
}

/// Removes the value at `path` in place and returns it.
///
/// Missing paths are a no-op. Array elements keep their positions: the slot
/// becomes `null`, and trailing `null`s are trimmed. Containers emptied by
/// the removal are dropped from their parents, but `obj` itself is kept even
/// when it ends up empty. Removing several leaves therefore gives the same
/// tree in any order.
///
/// # Example
///
/// ```
/// use scene_data_path::{as_path, remove};
/// use serde_json::json;
///
/// let mut doc = json!({"tags": ["x", "y", "z"], "k": 1});
/// remove(&mut doc, &as_path("tags.0"));
/// assert_eq!(doc, json!({"tags": [null, "y", "z"], "k": 1}));
/// remove(&mut doc, &as_path("tags.2"));
/// remove(&mut doc, &as_path("tags.1"));
/// assert_eq!(doc, json!({"k": 1}));
/// ```
pub fn remove(obj: &mut Value, path: &[String]) -> Option<Value> {
    let (step, rest) = path.split_first()?;
    match obj {
        Value::Object(map) => {
            if rest.is_empty() {
                return map.remove(step.as_str());
            }
            let child = map.get_mut(step.as_str())?;
            let removed = remove(child, rest)?;
            if is_empty_container(child) {
                map.remove(step.as_str());
            }
            Some(removed)
        }
        Value::Array(arr) => {
            let idx = parse_index(step).filter(|idx| *idx < arr.len())?;
            let removed = if rest.is_empty() {
                std::mem::take(&mut arr[idx])
            } else {
                let child = &mut arr[idx];
                let removed = remove(child, rest)?;
                if is_empty_container(child) {
                    *child = Value::Null;
                }
                removed
            };
            while arr.last().is_some_and(Value::is_null) {
                arr.pop();
            }
            Some(removed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_path;
    use serde_json::json;

    #[test]
    fn test_set_value_does_not_touch_original() {
        let obj = json!({"a": 1});
        let next = set_value(&obj, "b", json!(2)).unwrap();
        assert_eq!(obj, json!({"a": 1}));
        assert_eq!(next, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_set_value_appends_but_never_pads() {
        let next = set_value(&json!([1]), "1", json!(4)).unwrap();
        assert_eq!(next, json!([1, 4]));
        assert_eq!(
            set_value(&json!([1]), "3", json!(4)),
            Err(PathError::IndexOutOfBounds { key: "3".into(), len: 1 })
        );
        assert!(set_value(&json!([]), "18446744073709551615", json!(1)).is_err());
    }

    #[test]
    fn test_set_value_rejects_scalars() {
        assert_eq!(
            set_value(&json!("s"), "a", json!(1)),
            Err(PathError::NotContainer { key: "a".into() })
        );
    }

    #[test]
    fn test_unset_value_signals_empty_object() {
        assert_eq!(unset_value(&json!({"a": 1}), "a").unwrap(), None);
        assert_eq!(
            unset_value(&json!({"a": 1, "b": 2}), "a").unwrap(),
            Some(json!({"b": 2}))
        );
        assert_eq!(unset_value(&json!([1, 2]), "0").unwrap(), Some(json!([2])));
        assert!(unset_value(&json!([1, 2]), "k").is_err());
    }

    #[test]
    fn test_write_replaces_blocking_values() {
        let mut doc = json!({"a": 5, "list": [1]});
        write(&mut doc, &as_path("a.b"), json!(1));
        write(&mut doc, &as_path("list.1"), json!(3));
        assert_eq!(doc["list"], json!([1, 3]));
        write(&mut doc, &as_path("list.k"), json!(0));
        assert_eq!(doc, json!({"a": {"b": 1}, "list": {"k": 0}}));
    }

    #[test]
    fn test_write_shaped_creates_arrays_from_source() {
        let source = json!({"tags": ["a", "b"], "grid": [[1, 2]]});
        let mut out = json!({});
        write_shaped(&mut out, &as_path("tags.0"), json!("a"), &source);
        write_shaped(&mut out, &as_path("tags.1"), json!("b"), &source);
        write_shaped(&mut out, &as_path("grid.0.1"), json!(2), &source);
        assert_eq!(out, json!({"tags": ["a", "b"], "grid": [[null, 2]]}));
    }

    #[test]
    fn test_write_shaped_keeps_numeric_object_keys() {
        let source = json!({"slots": {"0": "a"}});
        let mut out = json!({});
        write_shaped(&mut out, &as_path("slots.0"), json!("a"), &source);
        assert_eq!(out, source);
    }

    #[test]
    fn test_write_ignores_index_far_past_the_end() {
        let mut doc = json!({"list": [1]});
        write(&mut doc, &as_path("list.18446744073709551615"), json!(2));
        write(&mut doc, &as_path("list.5"), json!(2));
        assert_eq!(doc, json!({"list": [1]}));

        let shape = json!({"list": [0, 0, 0, 0]});
        write_shaped(&mut doc, &as_path("list.3"), json!(4), &shape);
        assert_eq!(doc, json!({"list": [1, null, null, 4]}));
    }

    #[test]
    fn test_remove_prunes_empty_parents() {
        let mut doc = json!({"a": {"b": {"c": 1}}, "d": 2});
        assert_eq!(remove(&mut doc, &as_path("a.b.c")), Some(json!(1)));
        assert_eq!(doc, json!({"d": 2}));
        assert_eq!(remove(&mut doc, &as_path("a.b.c")), None);
        assert_eq!(remove(&mut doc, &as_path("d")), Some(json!(2)));
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn test_remove_keeps_array_positions() {
        let mut doc = json!({"grid": [[1], [2, 3]], "k": 0});
        assert_eq!(remove(&mut doc, &as_path("grid.0.0")), Some(json!(1)));
        assert_eq!(doc["grid"], json!([null, [2, 3]]));
        remove(&mut doc, &as_path("grid.1.0"));
        assert_eq!(doc["grid"], json!([null, [null, 3]]));
        remove(&mut doc, &as_path("grid.1.1"));
        assert_eq!(doc, json!({"k": 0}));
    }

    #[test]
    fn test_remove_of_array_leaves_is_order_independent() {
        let paths = ["tags.0", "k", "grid.0.0", "tags.1", "grid.1.0", "grid.0.1"];
        let doc = json!({"tags": ["x", "y"], "k": 1, "grid": [[1, 2], [3]]});
        let mut forward = doc.clone();
        for path in paths {
            assert!(remove(&mut forward, &as_path(path)).is_some());
        }
        let mut backward = doc;
        for path in paths.iter().rev() {
            remove(&mut backward, &as_path(*path));
        }
        assert_eq!(forward, json!({}));
        assert_eq!(backward, json!({}));
    }
}
