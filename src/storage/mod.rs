//! Key-value backends that collections are persisted into.

mod error;
#[cfg(feature = "fs")]
mod file;
mod in_memory;

use std::sync::Arc;

pub use error::StorageError;
#[cfg(feature = "fs")]
pub use file::FileStorage;
pub use in_memory::InMemoryStorage;

/// Synchronous string key-value storage. One value per key, last write wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Returns true if it existed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Whether a value is stored under `key`.
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key)
    }

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        (**self).contains(key)
    }
}

/// The backend selected by configuration.
#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory(InMemoryStorage),
    #[cfg(feature = "fs")]
    File(FileStorage),
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            StorageBackend::Memory(storage) => storage.get(key),
            #[cfg(feature = "fs")]
            StorageBackend::File(storage) => storage.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            StorageBackend::Memory(storage) => storage.set(key, value),
            #[cfg(feature = "fs")]
            StorageBackend::File(storage) => storage.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        match self {
            StorageBackend::Memory(storage) => storage.remove(key),
            #[cfg(feature = "fs")]
            StorageBackend::File(storage) => storage.remove(key),
        }
    }
}
