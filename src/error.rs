use std::path::PathBuf;
use thiserror::Error;

/// Main error type for confkeep
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error in {path}: {reason}\n\nTroubleshooting:\n- The file must contain a single JSON object\n- Fix or delete the file; defaults are used until then\n- Run with RUST_LOG=debug for more details")]
    Parse { path: PathBuf, reason: String },

    #[error("Config serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cannot set '{path}': '{segment}' holds a non-object value\n\nTroubleshooting:\n- Remove or rename the existing value first\n- Dotted paths can only descend through objects")]
    PathConflict { path: String, segment: String },

    #[error("Device fingerprint error: {0}")]
    Fingerprint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
