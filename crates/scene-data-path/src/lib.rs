//! Dotted-path utilities for JSON trees.
//!
//! Paths address nested fields either as a dotted string (`"a.b.0"`) or as an
//! already split list of steps. Arrays and objects are handled uniformly; a
//! step into an array must be a decimal index.
//!
//! # Example
//!
//! ```
//! use scene_data_path::{as_path, format_path, get, set_value};
//! use serde_json::json;
//!
//! let path = as_path("transform.position");
//! assert_eq!(format_path(&path), "transform.position");
//!
//! let doc = json!({"transform": {"position": [0, 1, 2]}});
//! assert_eq!(get(&doc, &path), Some(&json!([0, 1, 2])));
//!
//! let next = set_value(&doc, "visible", json!(true)).unwrap();
//! assert_eq!(next["visible"], json!(true));
//! assert!(doc.get("visible").is_none());
//! ```

use thiserror::Error;

pub mod get;
pub mod set;
pub mod types;
pub mod util;

pub use get::{get, get_in, get_step, has, has_in, lookup, Lookup};
pub use set::{remove, set_value, unset_value, write, write_shaped};
pub use types::{as_path, AsPath, Path, PathStep};
pub use util::{format_path, is_child, is_index, is_prefix, is_root, parent, parse_index};

/// Errors raised by single-step edits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("array key must be a numeric index, got `{key}`")]
    InvalidArrayKey { key: String },
    #[error("cannot address `{key}` inside a value that is neither an object nor an array")]
    NotContainer { key: String },
    #[error("array index `{key}` is past the end of an array of length {len}")]
    IndexOutOfBounds { key: String, len: usize },
}
