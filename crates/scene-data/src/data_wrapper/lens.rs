use std::rc::{Rc, Weak};

use scene_data_path::{get_in, Path};
use serde_json::Value;

use super::{DataWrapper, Node, WrapperError};

/// A live view of one path of a wrapper's merged data.
///
/// Reads go through [`DataWrapper::data`] and writes through
/// [`DataWrapper::set`]. A lens does not keep its wrapper alive; once the
/// wrapper is dropped or disposed every call fails with
/// [`WrapperError::Disposed`].
#[derive(Clone)]
pub struct Lens(Rc<LensInner>);

struct LensInner {
    node: Weak<Node>,
    path: Path,
}

/// What a lens finds under one key.
#[derive(Debug, Clone)]
pub enum LensEntry {
    /// An atomic value.
    Value(Value),
    /// A structural sub-tree, as a lens of its own.
    Scope(Lens),
}

impl Lens {
    pub(crate) fn new(node: Weak<Node>, path: Path) -> Self {
        Lens(Rc::new(LensInner { node, path }))
    }

    fn wrapper(&self) -> Result<DataWrapper, WrapperError> {
        let node = self.0.node.upgrade().ok_or(WrapperError::Disposed)?;
        let wrapper = DataWrapper { node };
        if wrapper.is_disposed() {
            return Err(WrapperError::Disposed);
        }
        Ok(wrapper)
    }

    pub fn path(&self) -> &[String] {
        &self.0.path
    }

    pub fn ptr_eq(&self, other: &Lens) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The merged value at this path.
    pub fn get(&self) -> Result<Option<Value>, WrapperError> {
        Ok(self.wrapper()?.get_merged(&self.0.path))
    }

    pub fn set(&self, value: Value) -> Result<(), WrapperError> {
        self.wrapper()?.set(&self.0.path, value)
    }

    pub fn set_key(&self, key: &str, value: Value) -> Result<(), WrapperError> {
        self.wrapper()?.set(&self.child_path(key), value)
    }

    /// The lens one step further down; the same lens is handed out for the
    /// same path.
    pub fn at(&self, key: &str) -> Result<Lens, WrapperError> {
        Ok(self.wrapper()?.lens_at(&self.child_path(key)))
    }

    pub fn entry(&self, key: &str) -> Result<Option<LensEntry>, WrapperError> {
        let wrapper = self.wrapper()?;
        let path = self.child_path(key);
        let data = wrapper.data();
        let Some(value) = get_in(&data, &path).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        if wrapper.node.schema.is_value(value, &path) {
            return Ok(Some(LensEntry::Value(value.clone())));
        }
        Ok(Some(LensEntry::Scope(wrapper.lens_at(&path))))
    }

    /// Keys currently present at this path: object keys, or array indices.
    pub fn keys(&self) -> Result<Vec<String>, WrapperError> {
        let data = self.wrapper()?.data();
        Ok(match get_in(&data, &self.0.path) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Array(arr)) => (0..arr.len()).map(|idx| idx.to_string()).collect(),
            _ => Vec::new(),
        })
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, WrapperError> {
        let data = self.wrapper()?.data();
        Ok(get_in(&data, &self.child_path(key)).is_some_and(|v| !v.is_null()))
    }

    fn child_path(&self, key: &str) -> Path {
        let mut path = self.0.path.clone();
        path.push(key.to_owned());
        path
    }
}

impl std::fmt::Debug for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Lens").field(&self.0.path).finish()
    }
}
