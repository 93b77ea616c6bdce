//! Leaf-path algebra over data trees.
//!
//! Every operation walks leaf paths with [`DataSchema::for_each_value`], so
//! atomic values are always taken or dropped as a whole.

use scene_data_path::{get_in, lookup, remove, write_shaped, AsPath};
use scene_data_util::{is_absent, option_equal_sparse};
use serde_json::{Map, Value};

use super::DataSchema;

/// Outcome of combining an existing value with an incoming one.
#[derive(Debug, Clone, PartialEq)]
pub enum Merge {
    Keep,
    Set(Value),
    Delete,
}

impl DataSchema {
    /// Folds every leaf of `b` into a copy of `a`.
    ///
    /// `combine` receives what `a` holds at the leaf (or the scalar blocking
    /// the way to it) and the incoming leaf. Containers missing from `a` are
    /// created with the kind they have in `b`.
    pub fn union_with<F>(&self, a: &Value, b: &Value, mut combine: F) -> Value
    where
        F: FnMut(Option<&Value>, &Value) -> Merge,
    {
        let mut out = a.clone();
        self.for_each_value(b, |path, incoming| {
            let merge = combine(lookup(&out, path).occupant(), incoming);
            match merge {
                Merge::Keep => {}
                Merge::Set(value) => write_shaped(&mut out, path, value, b),
                Merge::Delete => {
                    remove(&mut out, path);
                }
            }
        });
        out
    }

    /// Fills the leaves of `b` into `a` wherever `a` has no value; `a` wins.
    pub fn union(&self, a: &Value, b: &Value) -> Value {
        self.union_with(a, b, |current, incoming| {
            if is_absent(current) && !incoming.is_null() {
                Merge::Set(incoming.clone())
            } else {
                Merge::Keep
            }
        })
    }

    /// Writes the leaves of `b` over `a`; `b` wins.
    pub fn assign(&self, a: &Value, b: &Value) -> Value {
        self.union_with(a, b, |_, incoming| {
            if incoming.is_null() {
                Merge::Keep
            } else {
                Merge::Set(incoming.clone())
            }
        })
    }

    /// `true` when every leaf of `b` is present in `a` with an equal value.
    pub fn includes(&self, a: &Value, b: &Value) -> bool {
        let mut included = true;
        self.for_each_value(b, |path, value| {
            included = included && option_equal_sparse(get_in(a, path), Some(value));
        });
        included
    }

    /// Removes from `a` every leaf path that holds a value in `b`.
    ///
    /// Array elements left behind keep their indices.
    pub fn substract(&self, a: &Value, b: &Value) -> Value {
        let mut out = a.clone();
        self.for_each_value(b, |path, value| {
            if !value.is_null() {
                remove(&mut out, path);
            }
        });
        out
    }

    /// Projects `a` onto the leaf paths of `b`.
    pub fn extract(&self, a: &Value, b: &Value) -> Value {
        let mut out = Value::Object(Map::new());
        self.for_each_value(b, |path, _| {
            if let Some(value) = get_in(a, path).filter(|v| !v.is_null()) {
                write_shaped(&mut out, path, value.clone(), a);
            }
        });
        out
    }

    /// The part of `a` that differs from `b`, leaf by leaf.
    pub fn overrides(&self, a: &Value, b: &Value) -> Value {
        let mut out = Value::Object(Map::new());
        self.for_each_value(a, |path, value| {
            if !value.is_null() && !option_equal_sparse(Some(value), get_in(b, path)) {
                write_shaped(&mut out, path, value.clone(), a);
            }
        });
        out
    }

    /// Keeps only the listed paths (with everything below them).
    pub fn only_paths<I, P>(&self, obj: &Value, paths: I) -> Value
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        let mut out = Value::Object(Map::new());
        for path in paths {
            let path = path.as_path();
            if let Some(value) = get_in(obj, &path).filter(|v| !v.is_null()) {
                write_shaped(&mut out, &path, value.clone(), obj);
            }
        }
        out
    }

    /// Drops the listed paths (with everything below them).
    pub fn without_paths<I, P>(&self, obj: &Value, paths: I) -> Value
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        let mut out = obj.clone();
        for path in paths {
            remove(&mut out, &path.as_path());
        }
        out
    }
}
