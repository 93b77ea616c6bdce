//! Cross-reference markers embedded in component data.
//!
//! The binding layer stores references as plain objects tagged with
//! `$$paramType`. They are decoded into [`ParamValue`] at the boundary so the
//! rest of the engine never sniffs marker fields by hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key that marks an object as a parameter reference.
pub const PARAM_TYPE_KEY: &str = "$$paramType";
/// Key holding the referenced id.
pub const PARAM_ID_KEY: &str = "$$id";

/// Wire form of a parameter reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$$paramType", rename_all = "lowercase")]
pub enum ParamRef {
    /// Live binding to a value owned by another component.
    Bind {
        #[serde(rename = "$$id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Resource {
        #[serde(rename = "$$id")]
        id: String,
    },
    Component {
        #[serde(rename = "$$id")]
        id: String,
    },
}

impl ParamRef {
    pub fn bind(id: impl Into<String>) -> Self {
        ParamRef::Bind {
            id: id.into(),
            path: None,
        }
    }

    pub fn bind_path(id: impl Into<String>, path: impl Into<String>) -> Self {
        ParamRef::Bind {
            id: id.into(),
            path: Some(path.into()),
        }
    }

    pub fn resource(id: impl Into<String>) -> Self {
        ParamRef::Resource { id: id.into() }
    }

    pub fn component(id: impl Into<String>) -> Self {
        ParamRef::Component { id: id.into() }
    }

    /// Returns `true` when `value` carries the marker key.
    pub fn is_marker(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|map| map.contains_key(PARAM_TYPE_KEY))
    }

    /// Decodes a marker object; anything else (including malformed markers)
    /// yields `None`.
    pub fn decode(value: &Value) -> Option<Self> {
        if !Self::is_marker(value) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn id(&self) -> &str {
        match self {
            ParamRef::Bind { id, .. } | ParamRef::Resource { id } | ParamRef::Component { id } => id,
        }
    }

    /// The referenced id when this is a live binding.
    pub fn bound_id(&self) -> Option<&str> {
        match self {
            ParamRef::Bind { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        let (kind, id) = match self {
            ParamRef::Bind { id, .. } => ("bind", id),
            ParamRef::Resource { id } => ("resource", id),
            ParamRef::Component { id } => ("component", id),
        };
        let mut map = Map::new();
        map.insert(PARAM_TYPE_KEY.to_owned(), Value::String(kind.to_owned()));
        map.insert(PARAM_ID_KEY.to_owned(), Value::String(id.clone()));
        if let ParamRef::Bind {
            path: Some(path), ..
        } = self
        {
            map.insert("path".to_owned(), Value::String(path.clone()));
        }
        Value::Object(map)
    }
}

impl From<ParamRef> for Value {
    fn from(param: ParamRef) -> Self {
        param.to_value()
    }
}

/// A parameter value after boundary decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bound { id: String, path: Option<String> },
    Resource { id: String },
    ComponentRef { id: String },
    Plain(Value),
}

impl ParamValue {
    pub fn decode(value: &Value) -> Self {
        match ParamRef::decode(value) {
            Some(ParamRef::Bind { id, path }) => ParamValue::Bound { id, path },
            Some(ParamRef::Resource { id }) => ParamValue::Resource { id },
            Some(ParamRef::Component { id }) => ParamValue::ComponentRef { id },
            None => ParamValue::Plain(value.clone()),
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, ParamValue::Plain(_))
    }
}

/// Collects the ids of every live binding found anywhere in `value`.
pub fn bound_ids(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_bound_ids(value, &mut out);
    out
}

fn collect_bound_ids(value: &Value, out: &mut Vec<String>) {
    if ParamRef::is_marker(value) {
        if let Some(id) = ParamRef::decode(value).as_ref().and_then(ParamRef::bound_id) {
            out.push(id.to_owned());
        }
        return;
    }
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_bound_ids(v, out)),
        Value::Array(arr) => arr.iter().for_each(|v| collect_bound_ids(v, out)),
        _ => {}
    }
}
