//! Dotted-path access into a configuration tree.
//!
//! `"SYSTEM_OPTIONS.NETWORK.WEBSOCKET_URL"` addresses nested object keys. There is
//! no escaping, so keys containing a literal `.` cannot be addressed.

use super::{ConfigTree, ConfigValue};
use crate::error::{ConfigError, Result};

/// Look up `path`, returning `None` on any missing key or non-object step
#[must_use]
pub fn get_path<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a ConfigValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = tree.get(first)?;
    for segment in segments {
        current = match current {
            ConfigValue::Object(map) => map.get(segment)?,
            ConfigValue::Null
            | ConfigValue::Bool(_)
            | ConfigValue::Number(_)
            | ConfigValue::String(_)
            | ConfigValue::Array(_) => return None,
        };
    }
    Some(current)
}

/// Assign `value` at `path`, creating missing intermediate objects.
///
/// Fails without touching the tree if an existing intermediate value is not an
/// object. New intermediates are only ever created below the last existing one,
/// so a failure never leaves partial structure behind. The empty path addresses
/// the top-level key `""`.
pub fn set_path(tree: &mut ConfigTree, path: &str, value: ConfigValue) -> Result<()> {
    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let mut current = tree;
    for segment in parents.into_iter().flat_map(|parents| parents.split('.')) {
        let entry = current
            .entry(segment)
            .or_insert_with(|| ConfigValue::Object(ConfigTree::new()));
        current = match entry {
            ConfigValue::Object(map) => map,
            _ => {
                return Err(ConfigError::PathConflict {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Whether a stored value counts as "not configured"
#[must_use]
pub fn is_unset(value: Option<&ConfigValue>) -> bool {
    match value {
        None | Some(ConfigValue::Null) => true,
        Some(ConfigValue::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigTree {
        match json!({ "A": { "B": { "C": 7 }, "S": "text" }, "N": null }) {
            ConfigValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_get_nested() {
        let tree = sample();
        assert_eq!(get_path(&tree, "A.B.C"), Some(&json!(7)));
        assert_eq!(get_path(&tree, "A.B"), Some(&json!({ "C": 7 })));
        assert_eq!(get_path(&tree, "N"), Some(&json!(null)));
    }

    #[test]
    fn test_get_missing_or_through_scalar() {
        let tree = sample();
        assert_eq!(get_path(&tree, "X.B.C"), None);
        assert_eq!(get_path(&tree, "A.X.C"), None);
        assert_eq!(get_path(&tree, "A.B.X"), None);
        assert_eq!(get_path(&tree, "A.S.C"), None);
        assert_eq!(get_path(&tree, "N.C"), None);
        assert_eq!(get_path(&tree, ""), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut tree = ConfigTree::new();
        set_path(&mut tree, "X.Y.Z", json!(42)).unwrap();
        assert_eq!(get_path(&tree, "X.Y.Z"), Some(&json!(42)));
    }

    #[test]
    fn test_set_overwrites_leaf() {
        let mut tree = sample();
        set_path(&mut tree, "A.B.C", json!("new")).unwrap();
        assert_eq!(get_path(&tree, "A.B.C"), Some(&json!("new")));
        assert_eq!(get_path(&tree, "A.S"), Some(&json!("text")));
    }

    #[test]
    fn test_set_through_scalar_fails_cleanly() {
        let mut tree = sample();
        let before = tree.clone();
        let err = set_path(&mut tree, "A.S.Deeper", json!(1)).unwrap_err();
        assert!(matches!(err, ConfigError::PathConflict { ref segment, .. } if segment == "S"));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_empty_path_is_the_empty_key() {
        let mut tree = sample();
        set_path(&mut tree, "", json!("root")).unwrap();
        assert_eq!(tree.get(""), Some(&json!("root")));
        assert_eq!(get_path(&tree, ""), Some(&json!("root")));

        set_path(&mut tree, "A.", json!(1)).unwrap();
        assert_eq!(get_path(&tree, "A."), Some(&json!(1)));
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset(None));
        assert!(is_unset(Some(&json!(null))));
        assert!(is_unset(Some(&json!(""))));
        assert!(!is_unset(Some(&json!("id"))));
        assert!(!is_unset(Some(&json!(false))));
    }
}
