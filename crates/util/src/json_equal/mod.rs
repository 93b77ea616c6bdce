//! JSON equality utilities.
//!
//! `deep_equal` is the strict structural comparison. `deep_equal_sparse`
//! treats `null` object entries as if the key were missing, which is how
//! override data reads "absent".

mod deep_equal;

pub use deep_equal::{deep_equal, deep_equal_sparse, option_equal_sparse};
