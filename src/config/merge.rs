//! Deep merge of a loaded tree into the defaults, plus change detection.
//!
//! Loaded values win everywhere except where both sides are objects, in which case
//! the merge recurses. Keys only present in the loaded tree are kept as-is.

use super::{ConfigTree, ConfigValue};

/// Merge `loaded` over `defaults`, returning a new tree
#[must_use]
pub fn merge(defaults: &ConfigTree, loaded: &ConfigTree) -> ConfigTree {
    let mut result = defaults.clone();
    for (key, value) in loaded {
        let merged = match (result.get(key), value) {
            (Some(ConfigValue::Object(existing)), ConfigValue::Object(incoming)) => {
                ConfigValue::Object(merge(existing, incoming))
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Number of non-object values reachable from `tree`
#[must_use]
pub fn leaf_count(tree: &ConfigTree) -> usize {
    tree.values()
        .map(|value| match value {
            ConfigValue::Object(inner) => leaf_count(inner),
            ConfigValue::Null
            | ConfigValue::Bool(_)
            | ConfigValue::Number(_)
            | ConfigValue::String(_)
            | ConfigValue::Array(_) => 1,
        })
        .sum()
}

/// Whether the merge grew the tree beyond what was loaded.
///
/// Only net growth in leaf count is detected.
#[must_use]
pub fn has_new_items(loaded: &ConfigTree, merged: &ConfigTree) -> bool {
    leaf_count(merged) > leaf_count(loaded)
}
