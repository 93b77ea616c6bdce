use std::rc::{Rc, Weak};

use serde_json::Value;
use thiserror::Error;

use super::{DataWrapper, Node};
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum WrapperError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("invalid override state: {0}")]
    InvalidOverrideState(String),
    #[error("data wrapper has been disposed")]
    Disposed,
}

/// Options for [`DataWrapper::derive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveOptions {
    /// Expose own data directly as `data`, without merging the base in.
    pub skip_merge: bool,
    /// The instance is a child inside a prefab rather than its top.
    pub nested: bool,
}

impl DeriveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_merge(mut self, skip_merge: bool) -> Self {
        self.skip_merge = skip_merge;
        self
    }

    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }
}

/// Options for [`DataWrapper::get_template_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Defaults to the wrapper's own nesting flag.
    pub nested: Option<bool>,
}

impl TemplateOptions {
    pub fn nested(nested: bool) -> Self {
        Self {
            nested: Some(nested),
        }
    }
}

/// Undo record returned by [`DataWrapper::apply_overrides`].
pub struct OverrideState {
    pub(crate) owner: Weak<Node>,
    pub(crate) base: DataWrapper,
    pub(crate) own_before: Rc<Value>,
    pub(crate) base_own_before: Rc<Value>,
    pub(crate) applied: Value,
}

impl OverrideState {
    /// The overrides that were pushed into the base.
    pub fn applied(&self) -> &Value {
        &self.applied
    }
}

impl std::fmt::Debug for OverrideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideState")
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a wrapper's inheritance link and own data, by reference.
#[derive(Debug, Clone)]
pub struct WrapperState {
    pub(crate) base: Option<DataWrapper>,
    pub(crate) own: Rc<Value>,
}

impl WrapperState {
    pub fn own_data(&self) -> &Value {
        &self.own
    }

    pub fn base(&self) -> Option<&DataWrapper> {
        self.base.as_ref()
    }
}

/// Change of the merged value at one path.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedChange {
    pub path: Vec<String>,
    pub before: Option<Value>,
    pub after: Option<Value>,
}
