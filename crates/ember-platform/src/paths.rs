//! OS directory resolution.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while resolving or creating directories.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("platform I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-user directories of the Ember engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// `config.ron`, input bindings.
    pub config_dir: PathBuf,
    /// Atlases and animation tables.
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// JSON log written in debug builds.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "ember-engine";

impl PlatformDirs {
    /// Resolve OS directories without creating them.
    pub fn resolve() -> Result<Self, PlatformError> {
        let app_config = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);

        let data_dir = dirs::data_dir()
            .map_or_else(|| app_config.join("data"), |dir| dir.join(APP_NAME));
        let cache_dir = dirs::cache_dir()
            .map_or_else(|| app_config.join("cache"), |dir| dir.join(APP_NAME));

        Ok(Self {
            config_dir: app_config.join("config"),
            data_dir,
            cache_dir,
            log_dir: app_config.join("logs"),
        })
    }

    /// Directories rooted under `root`, for tests and portable installs.
    pub fn with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.join("config"),
            data_dir: app_dir.join("data"),
            cache_dir: app_dir.join("cache"),
            log_dir: app_dir.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for dir in [&self.config_dir, &self.data_dir, &self.cache_dir, &self.log_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
