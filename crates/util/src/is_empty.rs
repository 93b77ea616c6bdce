use serde_json::Value;

/// Returns `true` for objects and arrays, the only values a path can descend into.
///
/// ```
/// use scene_data_util::is_empty::is_container;
/// use serde_json::json;
///
/// assert!(is_container(&json!({})));
/// assert!(is_container(&json!([1])));
/// assert!(!is_container(&json!("str")));
/// ```
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// An object without keys. Empty arrays and scalars are not empty objects.
pub fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.is_empty())
}

/// An object or array with nothing in it.
pub fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        _ => false,
    }
}

/// Missing and `null` both read as "no value here".
pub fn is_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}
