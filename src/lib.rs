pub mod config;
pub mod error;
pub mod identity;
pub mod locator;

pub use config::{AsyncConfigStore, ConfigStore, ConfigTree, ConfigValue, EnsuredValue, StoreOptions};
pub use error::{ConfigError, Result};
pub use identity::{ensure_client_id, ensure_device_id, FingerprintProvider, SystemFingerprint};
pub use locator::{ProjectLocator, ResourceLocator};
