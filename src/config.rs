//! Dashboard configuration: which backend to persist into and page tunables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::insurance::DEFAULT_EXPIRING_SOON_DAYS;
#[cfg(feature = "fs")]
use crate::storage::FileStorage;
use crate::storage::{InMemoryStorage, StorageBackend, StorageError};

/// Environment variable that points the dashboard at a data directory.
pub const DATA_DIR_ENV: &str = "BUCCEO_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Values live for the lifetime of the process.
    #[default]
    Memory,
    /// One file per key under `data_dir`.
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    /// Byte budget for the memory backend, mirroring a browser storage quota.
    pub quota_bytes: Option<usize>,
    /// Days before `validUntil` at which a policy shows as expiring soon.
    pub expiring_soon_days: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            backend: BackendKind::Memory,
            data_dir: PathBuf::from("bucceo-data"),
            quota_bytes: None,
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
        }
    }
}

/// Error type for loading configuration and opening the configured backend.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Validation(String),
    #[error("file backend requested but the `fs` feature is disabled")]
    FileBackendUnavailable,
    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),
}

impl DashboardConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Apply `BUCCEO_DATA_DIR` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`. A non-empty data directory also selects
    /// the file backend.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            debug!(data_dir = %dir, "data directory set from environment");
            self.data_dir = PathBuf::from(dir);
            self.backend = BackendKind::File;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::File && self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "file backend needs a data_dir".to_string(),
            ));
        }
        if self.quota_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "quota_bytes must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured backend.
    pub fn open_storage(&self) -> Result<StorageBackend, ConfigError> {
        self.validate()?;
        match self.backend {
            BackendKind::Memory => {
                let storage = match self.quota_bytes {
                    Some(quota) => InMemoryStorage::with_quota(quota),
                    None => InMemoryStorage::new(),
                };
                Ok(StorageBackend::Memory(storage))
            }
            #[cfg(feature = "fs")]
            BackendKind::File => Ok(StorageBackend::File(FileStorage::open(&self.data_dir)?)),
            #[cfg(not(feature = "fs"))]
            BackendKind::File => Err(ConfigError::FileBackendUnavailable),
        }
    }
}
