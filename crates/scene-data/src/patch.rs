//! Single-path patches used by undo/redo stacks.
//!
//! A patch records one leaf mutation together with the value it displaced, so
//! its inverse can be computed without looking at the data again.

use scene_data_path::{AsPath, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DataPatch {
    Add {
        path: Path,
        value: Value,
    },
    Remove {
        path: Path,
        #[serde(rename = "prevValue")]
        prev_value: Value,
    },
    Replace {
        path: Path,
        value: Value,
        #[serde(rename = "prevValue")]
        prev_value: Value,
    },
}

impl DataPatch {
    pub fn path(&self) -> &[String] {
        match self {
            DataPatch::Add { path, .. }
            | DataPatch::Remove { path, .. }
            | DataPatch::Replace { path, .. } => path,
        }
    }

    /// The value present after the patch is applied, `None` for removals.
    pub fn value(&self) -> Option<&Value> {
        match self {
            DataPatch::Add { value, .. } | DataPatch::Replace { value, .. } => Some(value),
            DataPatch::Remove { .. } => None,
        }
    }

    pub fn inverse(&self) -> DataPatch {
        get_inverse_patch(self)
    }
}

/// Swaps `add` and `remove` (moving the value across) and flips the values of
/// a `replace`.
pub fn get_inverse_patch(patch: &DataPatch) -> DataPatch {
    match patch {
        DataPatch::Add { path, value } => DataPatch::Remove {
            path: path.clone(),
            prev_value: value.clone(),
        },
        DataPatch::Remove { path, prev_value } => DataPatch::Add {
            path: path.clone(),
            value: prev_value.clone(),
        },
        DataPatch::Replace {
            path,
            value,
            prev_value,
        } => DataPatch::Replace {
            path: path.clone(),
            value: prev_value.clone(),
            prev_value: value.clone(),
        },
    }
}

/// `add` when nothing was there before, `replace` otherwise.
pub fn get_patch_from_set(path: impl AsPath, value: Value, prev_value: Option<Value>) -> DataPatch {
    let path = path.as_path();
    match prev_value {
        None => DataPatch::Add { path, value },
        Some(prev_value) => DataPatch::Replace {
            path,
            value,
            prev_value,
        },
    }
}

pub fn get_patch_from_unset(path: impl AsPath, prev_value: Value) -> DataPatch {
    DataPatch::Remove {
        path: path.as_path(),
        prev_value,
    }
}
