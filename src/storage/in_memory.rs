//! InMemoryStorage - HashMap-backed key-value storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{KeyValueStore, StorageError};

/// In-memory key-value storage with an optional byte quota.
///
/// Clone-friendly via Arc: clones share the same map, the way two browser
/// tabs share one origin's storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl InMemoryStorage {
    /// Create a new empty storage without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty storage that rejects writes once keys plus values
    /// would exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        InMemoryStorage {
            entries: Arc::new(RwLock::new(HashMap::new())),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> Result<usize, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned("used_bytes"))?;
        Ok(entries.iter().map(|(k, v)| k.len() + v.len()).sum())
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned("keys"))?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

impl KeyValueStore for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned("get"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned("set"))?;

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if requested > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    requested,
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned("remove"))?;
        Ok(entries.remove(key).is_some())
    }
}
