use super::{ConfigStore, ConfigValue};
use crate::error::{ConfigError, Result};
use std::sync::Arc;

/// Async handle that keeps config file I/O off the runtime's worker threads
#[derive(Clone)]
pub struct AsyncConfigStore {
    inner: Arc<ConfigStore>,
}

impl AsyncConfigStore {
    #[must_use]
    pub const fn new(inner: Arc<ConfigStore>) -> Self {
        Self { inner }
    }

    /// Underlying blocking store
    #[must_use]
    pub fn blocking(&self) -> &ConfigStore {
        &self.inner
    }

    /// Reads wait on the same lock a `set` holds while writing, so they run off-thread too
    pub async fn get(&self, path: &str, fallback: ConfigValue) -> Result<ConfigValue> {
        let store = Arc::clone(&self.inner);
        let path = path.to_string();
        tokio::task::spawn_blocking(move || store.get(&path, fallback))
            .await
            .map_err(|e| ConfigError::Other(format!("Config read task failed: {e}")))
    }

    pub async fn set(&self, path: &str, value: ConfigValue) -> Result<bool> {
        let store = Arc::clone(&self.inner);
        let path = path.to_string();
        tokio::task::spawn_blocking(move || store.set(&path, value))
            .await
            .map_err(|e| ConfigError::Other(format!("Config update task failed: {e}")))
    }

    pub async fn reload_config(&self) -> Result<bool> {
        let store = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || store.reload_config())
            .await
            .map_err(|e| ConfigError::Other(format!("Config reload task failed: {e}")))
    }
}
