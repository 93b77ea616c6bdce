//! scene-data-util - JSON tree helpers for scene-data
//!
//! Equality and shape predicates over `serde_json::Value` trees shared by the
//! path and schema crates.

pub mod is_empty;
pub mod json_equal;

// Re-exports for convenience
pub use is_empty::{is_absent, is_container, is_empty_container, is_empty_object};
pub use json_equal::{deep_equal, deep_equal_sparse, option_equal_sparse};
