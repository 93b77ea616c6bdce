use serde_json::{Map, Value};

/// Performs a deep equality check between two JSON values.
///
/// This function compares values recursively, checking equality for:
/// - Primitives (null, bool, number, string)
/// - Arrays (element-by-element comparison)
/// - Objects (key-by-key comparison)
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use scene_data_util::json_equal::deep_equal;
///
/// let a = json!({"foo": [1, 2, 3]});
/// let b = json!({"foo": [1, 2, 3]});
/// let c = json!({"foo": [1, 2, 4]});
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a
                .iter()
                .all(|(key, val_a)| obj_b.get(key).is_some_and(|val_b| deep_equal(val_a, val_b)))
        }

        // Different types are never equal
        _ => false,
    }
}

/// Deep equality where a `null` object entry is the same as a missing key.
///
/// Array positions are still compared one by one, so `[null]` and `[]` are
/// different.
///
/// ```
/// use serde_json::json;
/// use scene_data_util::json_equal::deep_equal_sparse;
///
/// assert!(deep_equal_sparse(&json!({"a": 1, "b": null}), &json!({"a": 1})));
/// assert!(!deep_equal_sparse(&json!([null]), &json!([])));
/// ```
pub fn deep_equal_sparse(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal_sparse(x, y))
        }
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            sparse_keys_cover(obj_a, obj_b) && sparse_keys_cover(obj_b, obj_a)
        }
        _ => deep_equal(a, b),
    }
}

/// Compares two optional values, treating `None` and `Some(null)` alike.
pub fn option_equal_sparse(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal_sparse(a, b),
        _ => false,
    }
}

fn sparse_keys_cover(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.iter()
        .filter(|(_, v)| !v.is_null())
        .all(|(key, v)| right.get(key).is_some_and(|other| deep_equal_sparse(v, other)))
}
