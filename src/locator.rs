//! Resource location: where the project root and config directory live.

use std::path::{Path, PathBuf};

/// Finds the directories and files the store works with
pub trait ResourceLocator: Send + Sync {
    /// Existing config directory, if any
    fn find_config_dir(&self) -> Option<PathBuf>;

    /// Project root; always resolvable
    fn project_root(&self) -> PathBuf;

    /// Existing file addressed relative to the project root, if any
    fn find_file(&self, relative: &str) -> Option<PathBuf>;

    /// Name of the config directory under the project root
    fn config_subdir(&self) -> &str {
        "config"
    }
}

/// Locator rooted at a single project directory
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    root: PathBuf,
    config_subdir: String,
}

impl ProjectLocator {
    /// Create a locator rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_subdir: "config".to_string(),
        }
    }

    /// Override the config directory name (default `config`)
    #[must_use]
    pub fn with_config_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.config_subdir = subdir.into();
        self
    }

    /// Find the project root by walking up from the working directory.
    ///
    /// The first ancestor holding a `config/` directory wins. Without one, the
    /// working directory is used, then the platform local data directory.
    #[must_use]
    pub fn discover() -> Self {
        let start = std::env::current_dir().ok();

        if let Some(found) = start.as_deref().and_then(find_marked_ancestor) {
            tracing::debug!("Discovered project root: {}", found.display());
            return Self::new(found);
        }

        let root = start
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("confkeep")))
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!("No config directory found, using {}", root.display());
        Self::new(root)
    }
}

fn find_marked_ancestor(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
}

impl ResourceLocator for ProjectLocator {
    fn find_config_dir(&self) -> Option<PathBuf> {
        let dir = self.root.join(&self.config_subdir);
        dir.is_dir().then_some(dir)
    }

    fn project_root(&self) -> PathBuf {
        self.root.clone()
    }

    fn find_file(&self, relative: &str) -> Option<PathBuf> {
        let path = self.root.join(relative);
        path.is_file().then_some(path)
    }

    fn config_subdir(&self) -> &str {
        &self.config_subdir
    }
}
