//! CollectionStore - whole-collection JSON persistence over a key-value backend.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::record::Record;
use crate::storage::KeyValueStore;

/// Reads and writes collections (and single JSON or string slots) by key.
///
/// Loads fail soft: a missing key, an unreadable backend or unparseable
/// content all come back as `None` so the caller can fall back to seed data.
/// Saves always serialize and write the full value.
#[derive(Clone, Debug)]
pub struct CollectionStore<S> {
    storage: S,
}

impl<S: KeyValueStore> CollectionStore<S> {
    pub fn new(storage: S) -> Self {
        CollectionStore { storage }
    }

    /// Access the underlying backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load a collection previously written under `key`.
    pub fn load<R: Record>(&self, key: &str) -> Option<Vec<R>> {
        self.load_json(key)
    }

    /// Serialize `records` and write them under `key`, replacing any previous value.
    pub fn save<R: Record>(&self, key: &str, records: &[R]) -> Result<(), StoreError> {
        self.save_json(key, records)
    }

    /// Load any JSON value previously written under `key`.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.load_value(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored value is not parseable, falling back to defaults");
                None
            }
        }
    }

    /// Serialize `value` as JSON and write it under `key`.
    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save_value(key, &raw)
    }

    /// Load a plain string slot.
    pub fn load_value(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value, falling back to defaults");
                None
            }
        }
    }

    /// Write a plain string slot.
    pub fn save_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set(key, value).map_err(|source| {
            warn!(key, error = %source, "failed to persist value");
            StoreError::Write {
                key: key.to_string(),
                source,
            }
        })?;
        debug!(key, bytes = value.len(), "persisted value");
        Ok(())
    }
}
