//! Hierarchical scene data with prefab inheritance.
//!
//! - [`DataSchema`] declares which sub-trees are atomic values and which
//!   fields belong to an instance rather than its template.
//! - [`DataWrapper`] layers sparse local overrides over a base wrapper and
//!   notifies listeners, including wrappers bound to it by id.
//! - [`DataPatch`] records single-path edits for undo/redo.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use scene_data::{DataSchema, DataWrapper, DeriveOptions, SchemaConfig};
//! use serde_json::json;
//!
//! let schema = Rc::new(
//!     DataSchema::from_config(
//!         SchemaConfig::default().with_default_data(json!({"type": "mesh", "color": "#ffffff"})),
//!     )
//!     .unwrap(),
//! );
//! let root = DataWrapper::get_base(&schema);
//! let instance = root.derive(json!({"id": "i1", "type": "mesh"}), DeriveOptions::new());
//!
//! instance.set("color", json!("#ff0000")).unwrap();
//! assert_eq!(instance.get_merged("color"), Some(json!("#ff0000")));
//! assert!(instance.is_override("color"));
//! assert_eq!(root.get_merged("color"), Some(json!("#ffffff")));
//! ```

pub mod data_wrapper;
pub mod param;
pub mod patch;
pub mod schema;

pub use data_wrapper::{
    DataWrapper, DependencyRegistry, DeriveOptions, Lens, LensEntry, ListenerId, OverrideState,
    ScopedChange, TemplateOptions, WrapperError, WrapperState,
};
pub use param::{bound_ids, ParamRef, ParamValue, PARAM_ID_KEY, PARAM_TYPE_KEY};
pub use patch::{get_inverse_patch, get_patch_from_set, get_patch_from_unset, DataPatch};
pub use schema::{
    DataSchema, Merge, SchemaConfig, SchemaError, DEFAULT_PROPER_PATHS, DEFAULT_TOP_PROPER_PATHS,
    DEFAULT_VALUE_PATHS,
};
