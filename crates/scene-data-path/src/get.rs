use scene_data_util::is_absent;
use serde_json::Value;

use crate::types::AsPath;
use crate::util::parse_index;

/// Result of walking a path through a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// The full path resolved to a value (possibly `null`).
    Found(&'a Value),
    /// Some step was absent.
    Missing,
    /// A value that cannot hold the next step sits on the path: a scalar, or
    /// an array asked for a non-index key.
    Blocked {
        /// Number of steps consumed to reach the blocking value.
        depth: usize,
        value: &'a Value,
    },
}

impl<'a> Lookup<'a> {
    /// The value at the end of the path, if any.
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }

    /// The value that stands at or above the path: the target itself or the
    /// scalar that blocks it.
    pub fn occupant(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::Blocked { value, .. } if !value.is_null() => Some(value),
            _ => None,
        }
    }
}

/// Reads one step below `val`.
pub fn get_step<'a>(val: &'a Value, step: &str) -> Option<&'a Value> {
    match val {
        Value::Array(arr) => arr.get(parse_index(step)?),
        Value::Object(map) => map.get(step),
        _ => None,
    }
}

/// Walks `path` and reports how far it got.
pub fn lookup<'a>(val: &'a Value, path: &[String]) -> Lookup<'a> {
    let mut current = val;
    for (depth, step) in path.iter().enumerate() {
        match current {
            Value::Array(arr) => match parse_index(step) {
                Some(idx) => match arr.get(idx) {
                    Some(next) => current = next,
                    None => return Lookup::Missing,
                },
                None => return Lookup::Blocked { depth, value: current },
            },
            Value::Object(map) => match map.get(step) {
                Some(next) => current = next,
                None => return Lookup::Missing,
            },
            Value::Null => return Lookup::Missing,
            _ => return Lookup::Blocked { depth, value: current },
        }
    }
    Lookup::Found(current)
}

/// Get a value from a JSON tree by path.
///
/// Returns `None` if any step is missing.
///
/// # Example
///
/// ```
/// use scene_data_path::get;
/// use serde_json::json;
///
/// let doc = json!({"collider": {"translationLock": [true, false, true]}});
/// assert_eq!(get(&doc, "collider.translationLock.1"), Some(&json!(false)));
/// assert_eq!(get(&doc, "collider.missing"), None);
/// ```
pub fn get(val: &Value, path: impl AsPath) -> Option<&Value> {
    get_in(val, &path.as_path())
}

/// Slice form of [`get`].
pub fn get_in<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    lookup(val, path).found()
}

/// Returns `true` when `path` resolves to a non-null value.
///
/// Stops with `false` at the first missing step; this is a raw structural
/// check that knows nothing about atomic values.
pub fn has(val: &Value, path: impl AsPath) -> bool {
    has_in(val, &path.as_path())
}

/// Slice form of [`has`].
pub fn has_in(val: &Value, path: &[String]) -> bool {
    !is_absent(get_in(val, path))
}
