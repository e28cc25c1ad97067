use super::ConfigTree;
use crate::error::{ConfigError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read a config file, returning `None` if it doesn't exist
pub fn load_file(path: &Path) -> Result<Option<ConfigTree>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    parse_tree(path, &content).map(Some)
}

fn parse_tree(path: &Path, content: &str) -> Result<ConfigTree> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object at the root, found {}", kind(&other)),
        }),
    }
}

const fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Save a config tree atomically (tmp + rename)
pub fn save_file(path: &Path, tree: &ConfigTree) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut content = serde_json::to_string_pretty(tree)?;
    content.push('\n');

    // Data must be on disk before the rename makes it visible
    let tmp_path = path.with_extension("json.tmp");
    let written = fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}
