use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value paths every schema treats as atomic.
pub const DEFAULT_VALUE_PATHS: &[&str] = &[
    "position",
    "rotation",
    "scale",
    "collider.translationLock",
    "collider.rotationLock",
];

/// Fields that belong to an instance and never to a template.
pub const DEFAULT_PROPER_PATHS: &[&str] = &[
    "id",
    "parentId",
    "prefabId",
    "type",
    "name",
    "scriptId",
    "version",
    "index",
];

/// Extra instance fields for the top of a prefab instance; nested children
/// inherit these from the template instead.
pub const DEFAULT_TOP_PROPER_PATHS: &[&str] = &["position", "rotation"];

/// Serializable schema declaration.
///
/// `value_paths` extends the built-in list. The other lists replace their
/// defaults when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaConfig {
    pub value_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proper_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_proper_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_data: Option<Value>,
}

impl SchemaConfig {
    pub fn with_value_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_data(mut self, data: Value) -> Self {
        self.default_data = Some(data);
        self
    }

    pub fn with_proper_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proper_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_top_proper_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.top_proper_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }
}
