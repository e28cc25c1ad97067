use super::merge::{has_new_items, merge};
use super::path::{get_path, is_unset, set_path};
use super::persist::{load_file, save_file};
use super::schema::default_schema;
use super::{ConfigTree, ConfigValue};
use crate::locator::{ProjectLocator, ResourceLocator};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// File layout the store works with.
///
/// The config directory name comes from the [`ResourceLocator`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub file_name: String,
    pub aux_dirs: Vec<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            file_name: "config.json".to_string(),
            aux_dirs: vec!["models".to_string(), "cache".to_string()],
        }
    }
}

/// Result of [`ConfigStore::set_if_unset`]
#[derive(Debug, Clone, PartialEq)]
pub enum EnsuredValue {
    /// A value was already stored and was left alone
    Existing(ConfigValue),
    /// The generated value was stored; `persisted` is `false` if the file write failed
    Created { value: ConfigValue, persisted: bool },
    /// The generated value could not be placed because the path runs through a non-object
    Rejected(ConfigValue),
    /// The path was unset and the generator had nothing to offer
    Unavailable,
}

/// Outcome of reading the backing file
enum LoadedFile {
    Found(ConfigTree),
    Missing,
    Unreadable,
}

/// Self-healing configuration store
///
/// Holds the merged tree in memory behind a mutex. Every `set` rewrites the whole
/// file while the lock is held, so concurrent writers never lose updates.
pub struct ConfigStore {
    locator: Box<dyn ResourceLocator>,
    options: StoreOptions,
    config_dir: PathBuf,
    config_file: PathBuf,
    tree: Mutex<ConfigTree>,
}

static INSTANCE: OnceLock<Arc<ConfigStore>> = OnceLock::new();

impl ConfigStore {
    /// Open the store with the default file layout
    pub fn open(locator: impl ResourceLocator + 'static) -> Self {
        Self::open_with(locator, StoreOptions::default())
    }

    /// Open the store: resolve paths, create directories, load and merge the file
    pub fn open_with(locator: impl ResourceLocator + 'static, options: StoreOptions) -> Self {
        let config_dir = resolve_config_dir(&locator);
        let config_file = config_dir.join(&options.file_name);
        tracing::info!("Config directory: {}", config_dir.display());
        tracing::info!("Config file: {}", config_file.display());

        ensure_aux_dirs(&locator.project_root(), &options.aux_dirs);

        let mut store = Self {
            locator: Box::new(locator),
            options,
            config_dir,
            config_file,
            tree: Mutex::new(ConfigTree::new()),
        };
        let (tree, _) = store.load_config();
        *store.tree.get_mut().unwrap_or_else(PoisonError::into_inner) = tree;
        store
    }

    /// Process-wide store, opened on first call from the discovered project root.
    ///
    /// Prefer constructing one store at startup with [`ConfigStore::open`] and passing
    /// it around; this exists for callers that have no handle to thread through.
    pub fn get_instance() -> Arc<Self> {
        INSTANCE
            .get_or_init(|| Arc::new(Self::open(ProjectLocator::discover())))
            .clone()
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Value at a dotted path, or `fallback` if any step is missing or not an object
    pub fn get(&self, path: &str, fallback: ConfigValue) -> ConfigValue {
        let tree = self.lock();
        get_path(&tree, path).cloned().unwrap_or(fallback)
    }

    /// Typed read; falls back when the path is missing or the value has another shape
    pub fn get_as<T: DeserializeOwned>(&self, path: &str, fallback: T) -> T {
        let Some(value) = get_path(&self.lock(), path).cloned() else {
            return fallback;
        };
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("Config value at {path} has unexpected type: {e}");
            fallback
        })
    }

    /// Typed view of a whole group, e.g. `section::<WakeWordOptions>("WAKE_WORD_OPTIONS")`
    pub fn section<T: DeserializeOwned + Default>(&self, path: &str) -> T {
        self.get_as(path, T::default())
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> ConfigTree {
        self.lock().clone()
    }

    /// Assign a value at a dotted path and rewrite the file.
    ///
    /// Returns `false` if the path runs through a non-object value or the file could
    /// not be written; in the latter case the new value stays in memory.
    pub fn set(&self, path: &str, value: ConfigValue) -> bool {
        let mut tree = self.lock();
        if let Err(e) = set_path(&mut tree, path, value) {
            tracing::error!("Config update error {path}: {e}");
            return false;
        }
        self.save(&tree)
    }

    /// Store a generated value at `path` only if it is unset (missing, `null` or empty).
    ///
    /// The check, the generator call, the assignment and the save all happen under one
    /// lock, so concurrent callers agree on a single value. `make` runs with the lock
    /// held and must not call back into the store.
    pub fn set_if_unset(
        &self,
        path: &str,
        make: impl FnOnce() -> Option<ConfigValue>,
    ) -> EnsuredValue {
        let mut tree = self.lock();
        if let Some(existing) = get_path(&tree, path).filter(|value| !is_unset(Some(value))) {
            return EnsuredValue::Existing(existing.clone());
        }

        let Some(value) = make() else {
            return EnsuredValue::Unavailable;
        };
        if let Err(e) = set_path(&mut tree, path, value.clone()) {
            tracing::error!("Config update error {path}: {e}");
            return EnsuredValue::Rejected(value);
        }
        let persisted = self.save(&tree);
        EnsuredValue::Created { value, persisted }
    }

    /// Re-read the file, merge it into fresh defaults and replace the in-memory tree.
    ///
    /// Returns `false` if the completed tree needed persisting and that failed. The
    /// in-memory tree is replaced either way.
    pub fn reload_config(&self) -> bool {
        let mut tree = self.lock();
        let (fresh, persisted) = self.load_config();
        *tree = fresh;
        if persisted {
            tracing::info!("Config reloaded");
        } else {
            tracing::error!("Config reloaded but could not be persisted");
        }
        persisted
    }

    fn lock(&self) -> MutexGuard<'_, ConfigTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loader, merger and conditional persist. The flag is `false` only when a
    /// needed save failed.
    fn load_config(&self) -> (ConfigTree, bool) {
        let defaults = default_schema();
        match self.read_file() {
            LoadedFile::Found(loaded) => {
                let merged = merge(&defaults, &loaded);
                if has_new_items(&loaded, &merged) {
                    tracing::info!("Config file is missing entries, adding defaults");
                    let persisted = self.save(&merged);
                    (merged, persisted)
                } else {
                    (merged, true)
                }
            }
            LoadedFile::Missing => {
                tracing::info!("Config file not found, creating default config");
                let persisted = self.save(&defaults);
                (defaults, persisted)
            }
            LoadedFile::Unreadable => {
                tracing::warn!("Using default config; the existing file is left untouched");
                (defaults, true)
            }
        }
    }

    fn read_file(&self) -> LoadedFile {
        let relative = format!("{}/{}", self.locator.config_subdir(), self.options.file_name);
        let path = if let Some(found) = self.locator.find_file(&relative) {
            tracing::debug!("Locator found config file: {}", found.display());
            found
        } else if self.config_file.is_file() {
            tracing::debug!("Using resolved config file: {}", self.config_file.display());
            self.config_file.clone()
        } else {
            return LoadedFile::Missing;
        };

        match load_file(&path) {
            Ok(Some(tree)) => LoadedFile::Found(tree),
            Ok(None) => LoadedFile::Missing,
            Err(e) => {
                tracing::error!("Config load error: {e}");
                LoadedFile::Unreadable
            }
        }
    }

    fn save(&self, tree: &ConfigTree) -> bool {
        match save_file(&self.config_file, tree) {
            Ok(()) => {
                tracing::debug!("Config saved to: {}", self.config_file.display());
                true
            }
            Err(e) => {
                tracing::error!("Config save error: {e}");
                false
            }
        }
    }
}

fn resolve_config_dir(locator: &dyn ResourceLocator) -> PathBuf {
    if let Some(dir) = locator.find_config_dir() {
        return dir;
    }

    let dir = locator.project_root().join(locator.config_subdir());
    match fs::create_dir_all(&dir) {
        Ok(()) => tracing::info!("Created config directory: {}", dir.display()),
        Err(e) => tracing::error!("Failed to create config directory {}: {e}", dir.display()),
    }
    dir
}

fn ensure_aux_dirs(root: &Path, dirs: &[String]) {
    for name in dirs {
        let dir = root.join(name);
        if dir.exists() {
            continue;
        }
        match fs::create_dir_all(&dir) {
            Ok(()) => tracing::info!("Created directory: {}", dir.display()),
            Err(e) => tracing::error!("Failed to create directory {}: {e}", dir.display()),
        }
    }
}
