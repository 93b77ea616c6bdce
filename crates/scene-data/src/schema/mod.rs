//! Structural rules for component data.
//!
//! A [`DataSchema`] decides which sub-trees are atomic *values* (replaced as a
//! whole, never merged field by field) and which are decomposable objects.
//! Every tree operation in this crate goes through [`DataSchema::is_value`],
//! so it is the single place where "replace" versus "merge" is decided.
//!
//! All operations are pure: they take trees by reference and return new
//! trees. A rejected mutation leaves its input untouched.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use scene_data_path::{
    format_path, get_in, get_step, has_in, is_prefix, set_value, unset_value, AsPath, Path,
    PathError,
};
use scene_data_util::{deep_equal_sparse, is_container};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::param::ParamRef;

mod config;
mod merge;

pub use config::{SchemaConfig, DEFAULT_PROPER_PATHS, DEFAULT_TOP_PROPER_PATHS, DEFAULT_VALUE_PATHS};
pub use merge::Merge;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("cannot mutate `{path}`: `{boundary}` is an atomic value and must be replaced whole")]
    ValueBoundary { path: String, boundary: String },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("invalid schema config: {0}")]
    InvalidConfig(String),
}

type PathsCache = HashMap<usize, (Weak<Value>, Rc<Vec<String>>)>;

pub struct DataSchema {
    value_paths: BTreeSet<String>,
    proper_paths: Vec<Path>,
    top_proper_paths: Vec<Path>,
    default_data: Value,
    paths_cache: RefCell<PathsCache>,
}

impl Default for DataSchema {
    fn default() -> Self {
        Self {
            value_paths: DEFAULT_VALUE_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            proper_paths: DEFAULT_PROPER_PATHS.iter().map(|p| p.as_path()).collect(),
            top_proper_paths: DEFAULT_TOP_PROPER_PATHS.iter().map(|p| p.as_path()).collect(),
            default_data: Value::Object(Map::new()),
            paths_cache: RefCell::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for DataSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSchema")
            .field("value_paths", &self.value_paths)
            .field("proper_paths", &self.proper_paths)
            .field("top_proper_paths", &self.top_proper_paths)
            .field("default_data", &self.default_data)
            .finish()
    }
}

impl DataSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SchemaConfig) -> Result<Self, SchemaError> {
        let mut schema = Self::default();
        schema.set_value_paths(config.value_paths);
        if let Some(paths) = config.proper_paths {
            schema.set_proper_paths(paths);
        }
        if let Some(paths) = config.top_proper_paths {
            schema.set_top_proper_paths(paths);
        }
        if let Some(data) = config.default_data {
            schema.set_default_data(data)?;
        }
        Ok(schema)
    }

    /// Builds a schema from its JSON declaration (see [`SchemaConfig`]).
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let config: SchemaConfig = serde_json::from_value(value.clone())
            .map_err(|err| SchemaError::InvalidConfig(err.to_string()))?;
        Self::from_config(config)
    }

    /// Replaces the caller-supplied value paths. The built-in ones stay.
    pub fn set_value_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.value_paths = DEFAULT_VALUE_PATHS.iter().map(|p| (*p).to_owned()).collect();
        for path in paths {
            self.add_value_path(path);
        }
    }

    pub fn add_value_path(&mut self, path: impl AsPath) {
        self.value_paths.insert(format_path(&path.as_path()));
        self.paths_cache.borrow_mut().clear();
    }

    pub fn value_paths(&self) -> impl Iterator<Item = &str> {
        self.value_paths.iter().map(String::as_str)
    }

    pub fn set_proper_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.proper_paths = paths.into_iter().map(|p| p.as_path()).collect();
    }

    pub fn set_top_proper_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.top_proper_paths = paths.into_iter().map(|p| p.as_path()).collect();
    }

    /// The default tree must be an object; it seeds every root wrapper.
    pub fn set_default_data(&mut self, data: Value) -> Result<(), SchemaError> {
        if !data.is_object() {
            return Err(SchemaError::InvalidConfig(
                "default data must be an object".to_owned(),
            ));
        }
        self.default_data = data;
        Ok(())
    }

    pub fn default_data(&self) -> &Value {
        &self.default_data
    }

    /// A fresh copy of the default tree.
    pub fn get_default_data(&self) -> Value {
        self.default_data.clone()
    }

    /// Instance-only paths. Nested instances skip the top-level extras.
    pub fn get_proper_paths(&self, nested: bool) -> Vec<Path> {
        let mut paths = self.proper_paths.clone();
        if !nested {
            for path in &self.top_proper_paths {
                if !paths.contains(path) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }

    pub fn is_proper(&self, path: impl AsPath, nested: bool) -> bool {
        let path = path.as_path();
        let covered = |p: &Path| is_prefix(p, &path);
        self.proper_paths.iter().any(covered) || (!nested && self.top_proper_paths.iter().any(covered))
    }

    pub fn is_value_path(&self, path: &[String]) -> bool {
        !path.is_empty() && self.value_paths.contains(&format_path(path))
    }

    /// `true` when `item` must be treated as one indivisible value at `path`:
    /// scalars, reference markers and anything under a registered value path.
    pub fn is_value(&self, item: &Value, path: &[String]) -> bool {
        !is_container(item) || ParamRef::is_marker(item) || self.is_value_path(path)
    }

    /// Length of the shortest registered value path that prefixes `path`.
    pub fn find_value_prefix(&self, path: &[String]) -> Option<usize> {
        (1..=path.len()).find(|&len| self.is_value_path(&path[..len]))
    }

    /// Visits every leaf value depth-first, without descending into values.
    pub fn for_each_value<'a, F>(&self, obj: &'a Value, mut f: F)
    where
        F: FnMut(&[String], &'a Value),
    {
        let mut path = Vec::new();
        self.visit(obj, &mut path, &mut f);
    }

    fn visit<'a, F>(&self, node: &'a Value, path: &mut Path, f: &mut F)
    where
        F: FnMut(&[String], &'a Value),
    {
        if !path.is_empty() && self.is_value(node, path) {
            f(path, node);
            return;
        }
        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    path.push(key.clone());
                    self.visit(child, path, f);
                    path.pop();
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.iter().enumerate() {
                    path.push(idx.to_string());
                    self.visit(child, path, f);
                    path.pop();
                }
            }
            _ => {}
        }
    }

    pub fn leaf_path_steps(&self, obj: &Value) -> Vec<Path> {
        let mut out = Vec::new();
        self.for_each_value(obj, |path, _| out.push(path.to_vec()));
        out
    }

    pub fn leaf_paths(&self, obj: &Value) -> Vec<String> {
        let mut out = Vec::new();
        self.for_each_value(obj, |path, _| out.push(format_path(path)));
        out
    }

    /// Leaf paths of `obj`, memoized per allocation.
    ///
    /// The cache is keyed by identity: a tree mutated in place behind the `Rc`
    /// keeps returning its old paths.
    pub fn paths(&self, obj: &Rc<Value>) -> Rc<Vec<String>> {
        let key = Rc::as_ptr(obj) as usize;
        if let Some((weak, paths)) = self.paths_cache.borrow().get(&key) {
            if weak.strong_count() > 0 {
                return Rc::clone(paths);
            }
        }
        let paths = Rc::new(self.leaf_paths(obj));
        let mut cache = self.paths_cache.borrow_mut();
        cache.retain(|_, (weak, _)| weak.strong_count() > 0);
        cache.insert(key, (Rc::downgrade(obj), Rc::clone(&paths)));
        paths
    }

    /// Leaf paths of `obj` equal to, below, or enclosing one of `prefixes`.
    pub fn expand_paths<I, P>(&self, obj: &Value, prefixes: I) -> Vec<Path>
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        let prefixes: Vec<Path> = prefixes.into_iter().map(|p| p.as_path()).collect();
        self.leaf_path_steps(obj)
            .into_iter()
            .filter(|leaf| {
                prefixes
                    .iter()
                    .any(|prefix| is_prefix(prefix, leaf) || is_prefix(leaf, prefix))
            })
            .collect()
    }

    pub fn get<'a>(&self, obj: &'a Value, path: impl AsPath) -> Option<&'a Value> {
        get_in(obj, &path.as_path())
    }

    pub fn has(&self, obj: &Value, path: impl AsPath) -> bool {
        has_in(obj, &path.as_path())
    }

    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        deep_equal_sparse(a, b)
    }

    fn check_mutable(&self, obj: &Value, path: &[String]) -> Result<(), SchemaError> {
        for len in 1..path.len() {
            let prefix = &path[..len];
            let blocked = self.is_value_path(prefix)
                || get_in(obj, prefix).is_some_and(|node| !node.is_null() && self.is_value(node, prefix));
            if blocked {
                return Err(SchemaError::ValueBoundary {
                    path: format_path(path),
                    boundary: format_path(prefix),
                });
            }
        }
        Ok(())
    }

    /// Returns a copy of `obj` with `value` at `path`.
    ///
    /// Fails with [`SchemaError::ValueBoundary`] when `path` reaches inside
    /// an atomic value; replace the whole value instead.
    pub fn set(&self, obj: &Value, path: impl AsPath, value: Value) -> Result<Value, SchemaError> {
        let path = path.as_path();
        self.check_mutable(obj, &path)?;
        Ok(set_at(obj, &path, value)?)
    }

    /// Sets `value` only when nothing is stored at `path` yet.
    pub fn weak_set(&self, obj: &Value, path: impl AsPath, value: Value) -> Result<Value, SchemaError> {
        let path = path.as_path();
        if has_in(obj, &path) {
            return Ok(obj.clone());
        }
        self.set(obj, &path, value)
    }

    /// Returns a copy of `obj` without `path`, pruning emptied objects.
    pub fn unset(&self, obj: &Value, path: impl AsPath) -> Result<Value, SchemaError> {
        let path = path.as_path();
        self.check_mutable(obj, &path)?;
        if !path.is_empty() && get_in(obj, &path).is_none() {
            return Ok(obj.clone());
        }
        Ok(unset_at(obj, &path)?.unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Like [`set`](Self::set), but a path inside a registered value is
    /// applied to a copy of the whole value, which is then written back.
    pub fn set_atomic(&self, obj: &Value, path: impl AsPath, value: Value) -> Result<Value, SchemaError> {
        let path = path.as_path();
        match self.find_value_prefix(&path) {
            Some(len) if len < path.len() => {
                let (prefix, inner) = path.split_at(len);
                let whole = update_atomic(get_in(obj, prefix).cloned(), inner, Some(value))?;
                self.set(obj, prefix, whole)
            }
            _ => self.set(obj, &path, value),
        }
    }

    /// Removal counterpart of [`set_atomic`](Self::set_atomic).
    pub fn unset_atomic(&self, obj: &Value, path: impl AsPath) -> Result<Value, SchemaError> {
        let path = path.as_path();
        match self.find_value_prefix(&path) {
            Some(len) if len < path.len() => {
                let (prefix, inner) = path.split_at(len);
                let Some(current) = get_in(obj, prefix).cloned() else {
                    return Ok(obj.clone());
                };
                let whole = update_atomic(Some(current), inner, None)?;
                self.set(obj, prefix, whole)
            }
            _ => self.unset(obj, &path),
        }
    }
}

/// Applies an edit below the root of an atomic value and returns the value.
///
/// The edit follows the same rules as [`DataSchema::set`] and
/// [`DataSchema::unset`] inside the value.
pub(crate) fn update_atomic(
    whole: Option<Value>,
    inner: &[String],
    value: Option<Value>,
) -> Result<Value, SchemaError> {
    let whole = whole.unwrap_or(Value::Null);
    let next = match value {
        Some(value) => set_at(&whole, inner, value)?,
        None if get_in(&whole, inner).is_none() => whole,
        None => unset_at(&whole, inner)?.unwrap_or_else(|| Value::Object(Map::new())),
    };
    Ok(next)
}

fn set_at(obj: &Value, path: &[String], value: Value) -> Result<Value, PathError> {
    let Some((step, rest)) = path.split_first() else {
        return Ok(value);
    };
    let next = if rest.is_empty() {
        value
    } else {
        set_at(get_step(obj, step).unwrap_or(&Value::Null), rest, value)?
    };
    set_value(obj, step, next)
}

fn unset_at(obj: &Value, path: &[String]) -> Result<Option<Value>, PathError> {
    let Some((step, rest)) = path.split_first() else {
        return Ok(None);
    };
    if rest.is_empty() {
        return unset_value(obj, step);
    }
    let Some(child) = get_step(obj, step) else {
        return Ok(Some(obj.clone()));
    };
    match unset_at(child, rest)? {
        Some(next) => set_value(obj, step, next).map(Some),
        None => unset_value(obj, step),
    }
}
