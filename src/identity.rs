//! One-time bootstrap of the client and device identifiers.
//!
//! Both operations only write when the id is unset (missing, `null` or empty), so
//! calling them on every startup is safe.

use crate::config::{ConfigStore, ConfigTree, EnsuredValue};
use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const CLIENT_ID_PATH: &str = "SYSTEM_OPTIONS.CLIENT_ID";
pub const DEVICE_ID_PATH: &str = "SYSTEM_OPTIONS.DEVICE_ID";

/// Field holding the MAC address in efuse data and fingerprints
pub const MAC_ADDRESS_FIELD: &str = "mac_address";

/// Source of hardware identity
pub trait FingerprintProvider {
    /// MAC address burned into the device, if available
    fn mac_from_efuse(&self) -> Option<String>;

    /// Full device fingerprint; may carry a `mac_address` field
    fn generate_fingerprint(&self) -> Result<ConfigTree>;
}

/// Generate and persist a random client id if none is stored.
///
/// Returns the id in effect afterwards. Concurrent callers all get the same id.
pub fn ensure_client_id(store: &ConfigStore) -> String {
    let outcome = store.set_if_unset(CLIENT_ID_PATH, || {
        Some(Value::String(uuid::Uuid::new_v4().to_string()))
    });

    match outcome {
        EnsuredValue::Existing(id) => id_text(id),
        EnsuredValue::Created { value, persisted } => {
            let client_id = id_text(value);
            if persisted {
                tracing::info!("Generated new client id: {client_id}");
            } else {
                tracing::error!("Failed to save new client id");
            }
            client_id
        }
        EnsuredValue::Rejected(value) => {
            tracing::error!("Failed to store new client id");
            id_text(value)
        }
        EnsuredValue::Unavailable => unreachable!("client id generator always yields an id"),
    }
}

/// Derive and persist the device id from hardware if none is stored.
///
/// Tries the efuse MAC first, then the fingerprint's MAC. Returns `None` and leaves
/// the id unset when neither source has one. The provider is consulted with the
/// store locked, and only when the id is unset.
pub fn ensure_device_id(store: &ConfigStore, provider: &dyn FingerprintProvider) -> Option<String> {
    let outcome = store.set_if_unset(DEVICE_ID_PATH, || {
        provider
            .mac_from_efuse()
            .or_else(|| {
                tracing::warn!("No MAC address from efuse, falling back to device fingerprint");
                mac_from_fingerprint(provider)
            })
            .map(Value::String)
    });

    match outcome {
        EnsuredValue::Existing(id) => Some(id_text(id)),
        EnsuredValue::Created { value, persisted } => {
            let mac = id_text(value);
            if persisted {
                tracing::info!("Device id set from MAC address: {mac}");
            } else {
                tracing::error!("Failed to save device id");
            }
            Some(mac)
        }
        EnsuredValue::Rejected(_) => {
            tracing::error!("Failed to store device id");
            None
        }
        EnsuredValue::Unavailable => {
            tracing::error!("Could not determine a MAC address for the device id");
            None
        }
    }
}

fn id_text(value: Value) -> String {
    match value {
        Value::String(id) => id,
        other => other.to_string(),
    }
}

fn mac_from_fingerprint(provider: &dyn FingerprintProvider) -> Option<String> {
    match provider.generate_fingerprint() {
        Ok(fingerprint) => match fingerprint.get(MAC_ADDRESS_FIELD) {
            Some(Value::String(mac)) if !mac.is_empty() => Some(mac.clone()),
            _ => None,
        },
        Err(e) => {
            tracing::error!("Device fingerprint failed: {e}");
            None
        }
    }
}

/// Fingerprint read from the local machine
///
/// The efuse MAC comes from an `efuse.json` file; the fallback fingerprint is the
/// hostname plus the first non-loopback interface address under `/sys/class/net`.
#[derive(Debug, Clone)]
pub struct SystemFingerprint {
    efuse_path: PathBuf,
    net_dir: PathBuf,
}

impl SystemFingerprint {
    /// Fingerprint using `<config_dir>/efuse.json`
    #[must_use]
    pub fn new(config_dir: &Path) -> Self {
        Self {
            efuse_path: config_dir.join("efuse.json"),
            net_dir: PathBuf::from("/sys/class/net"),
        }
    }

    /// Read interfaces from another directory (for testing)
    #[must_use]
    pub fn with_net_dir(mut self, net_dir: impl Into<PathBuf>) -> Self {
        self.net_dir = net_dir.into();
        self
    }

    fn first_interface_mac(&self) -> Option<String> {
        let mut names: Vec<_> = fs::read_dir(&self.net_dir)
            .ok()?
            .flatten()
            .map(|entry| entry.file_name())
            .filter(|name| name != "lo")
            .collect();
        names.sort();

        names.into_iter().find_map(|name| {
            let address = fs::read_to_string(self.net_dir.join(name).join("address")).ok()?;
            let address = address.trim();
            (!address.is_empty() && address != "00:00:00:00:00:00").then(|| address.to_string())
        })
    }
}

impl FingerprintProvider for SystemFingerprint {
    fn mac_from_efuse(&self) -> Option<String> {
        let content = fs::read_to_string(&self.efuse_path).ok()?;
        let efuse: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Invalid efuse file {}: {e}", self.efuse_path.display());
                return None;
            }
        };
        efuse
            .get(MAC_ADDRESS_FIELD)
            .and_then(Value::as_str)
            .filter(|mac| !mac.is_empty())
            .map(str::to_string)
    }

    fn generate_fingerprint(&self) -> Result<ConfigTree> {
        let mut fingerprint = ConfigTree::new();

        match nix::unistd::gethostname() {
            Ok(hostname) => {
                fingerprint.insert(
                    "hostname".to_string(),
                    Value::String(hostname.to_string_lossy().into_owned()),
                );
            }
            Err(e) => tracing::warn!("Could not read hostname: {e}"),
        }

        if let Some(mac) = self.first_interface_mac() {
            fingerprint.insert(MAC_ADDRESS_FIELD.to_string(), Value::String(mac));
        }

        if fingerprint.is_empty() {
            return Err(ConfigError::Fingerprint(
                "no hostname or network interface available".to_string(),
            ));
        }
        Ok(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ProjectLocator;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    struct FakeFingerprint {
        efuse: Option<String>,
        fingerprint_mac: Option<String>,
        efuse_calls: AtomicU32,
    }

    impl FakeFingerprint {
        fn new(efuse: Option<&str>, fingerprint_mac: Option<&str>) -> Self {
            Self {
                efuse: efuse.map(str::to_string),
                fingerprint_mac: fingerprint_mac.map(str::to_string),
                efuse_calls: AtomicU32::new(0),
            }
        }
    }

    impl FingerprintProvider for FakeFingerprint {
        fn mac_from_efuse(&self) -> Option<String> {
            self.efuse_calls.fetch_add(1, Ordering::SeqCst);
            self.efuse.clone()
        }

        fn generate_fingerprint(&self) -> Result<ConfigTree> {
            let mut map = ConfigTree::new();
            if let Some(mac) = &self.fingerprint_mac {
                map.insert(MAC_ADDRESS_FIELD.to_string(), json!(mac));
            }
            Ok(map)
        }
    }

    fn open(temp_dir: &TempDir) -> ConfigStore {
        ConfigStore::open(ProjectLocator::new(temp_dir.path()))
    }

    #[test]
    fn test_client_id_generated_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let first = ensure_client_id(&store);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        let second = ensure_client_id(&store);
        assert_eq!(first, second);
        assert_eq!(store.get(CLIENT_ID_PATH, Value::Null), json!(first));
    }

    #[test]
    fn test_concurrent_callers_share_one_client_id() {
        const THREADS: usize = 8;

        for _ in 0..50 {
            let temp_dir = TempDir::new().unwrap();
            let store = Arc::new(open(&temp_dir));
            let barrier = Arc::new(Barrier::new(THREADS));

            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        ensure_client_id(&store)
                    })
                })
                .collect();

            let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(ids.len(), 1, "callers saw different client ids: {ids:?}");

            let stored = store.get(CLIENT_ID_PATH, Value::Null);
            assert!(ids.contains(stored.as_str().unwrap()));
        }
    }

    #[test]
    fn test_concurrent_callers_query_hardware_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let provider = FakeFingerprint::new(Some("aa:bb:cc:dd:ee:ff"), None);
        let barrier = Barrier::new(4);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    barrier.wait();
                    assert_eq!(
                        ensure_device_id(&store, &provider).as_deref(),
                        Some("aa:bb:cc:dd:ee:ff")
                    );
                });
            }
        });

        assert_eq!(provider.efuse_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_client_id_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        store.set(CLIENT_ID_PATH, json!(""));

        let id = ensure_client_id(&store);
        assert!(!id.is_empty());
    }

    #[test]
    fn test_device_id_from_efuse() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let provider = FakeFingerprint::new(Some("aa:bb:cc:dd:ee:ff"), Some("11:22:33:44:55:66"));

        let id = ensure_device_id(&store, &provider);
        assert_eq!(id.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(store.get(DEVICE_ID_PATH, Value::Null), json!("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_device_id_falls_back_to_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let provider = FakeFingerprint::new(None, Some("11:22:33:44:55:66"));

        let id = ensure_device_id(&store, &provider);
        assert_eq!(id.as_deref(), Some("11:22:33:44:55:66"));
    }

    #[test]
    fn test_device_id_left_unset_without_sources() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let provider = FakeFingerprint::new(None, None);

        assert!(ensure_device_id(&store, &provider).is_none());
        assert_eq!(store.get(DEVICE_ID_PATH, json!("marker")), Value::Null);
    }

    #[test]
    fn test_existing_device_id_skips_provider() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        store.set(DEVICE_ID_PATH, json!("kept"));
        let provider = FakeFingerprint::new(Some("aa:bb:cc:dd:ee:ff"), None);

        assert_eq!(ensure_device_id(&store, &provider).as_deref(), Some("kept"));
        assert_eq!(provider.efuse_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_system_fingerprint_reads_efuse_and_interfaces() {
        let temp_dir = TempDir::new().unwrap();
        let net_dir = temp_dir.path().join("net");
        for (name, address) in [
            ("lo", "00:00:00:00:00:00"),
            ("eth0", "de:ad:be:ef:00:01"),
            ("wlan0", "de:ad:be:ef:00:02"),
        ] {
            fs::create_dir_all(net_dir.join(name)).unwrap();
            fs::write(net_dir.join(name).join("address"), format!("{address}\n")).unwrap();
        }

        let fingerprint = SystemFingerprint::new(temp_dir.path()).with_net_dir(&net_dir);
        assert!(fingerprint.mac_from_efuse().is_none());

        let generated = fingerprint.generate_fingerprint().unwrap();
        assert_eq!(generated[MAC_ADDRESS_FIELD], json!("de:ad:be:ef:00:01"));

        fs::write(
            temp_dir.path().join("efuse.json"),
            r#"{ "serial_number": "SN1", "mac_address": "02:00:00:00:00:aa" }"#,
        )
        .unwrap();
        assert_eq!(
            fingerprint.mac_from_efuse().as_deref(),
            Some("02:00:00:00:00:aa")
        );
    }
}
