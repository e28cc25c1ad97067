//! Configuration module for confkeep
//!
//! Loads config from `<project root>/config/config.json`.
//! Falls back to the embedded default schema if the file doesn't exist or is corrupt.
//! Partial configs are deep-merged into the defaults and written back when the merge
//! added keys the file did not have, so the file converges toward completeness.
//!
//! # Example
//!
//! ```no_run
//! use confkeep::config::ConfigStore;
//! use serde_json::json;
//!
//! let store = ConfigStore::get_instance();
//! let url = store.get("SYSTEM_OPTIONS.NETWORK.OTA_VERSION_URL", json!(null));
//! println!("OTA url: {url}");
//! store.set("WAKE_WORD_OPTIONS.BEEP_VOLUME", json!(0.5));
//! ```

pub mod handle;
pub mod merge;
pub mod path;
pub mod persist;
pub mod schema;
pub mod store;

pub use handle::AsyncConfigStore;
pub use schema::{default_schema, SystemOptions, WakeWordOptions};
pub use store::{ConfigStore, EnsuredValue, StoreOptions};

/// Any value in a configuration tree
pub type ConfigValue = serde_json::Value;

/// A configuration snapshot; always an object at the root
pub type ConfigTree = serde_json::Map<String, ConfigValue>;
