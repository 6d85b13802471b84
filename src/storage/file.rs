//! FileStorage - one file per key under a root directory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{KeyValueStore, StorageError};

const VALUE_EXTENSION: &str = "value";

/// Durable key-value storage backed by a directory.
///
/// Each key maps to `<root>/<key>.value`. Writes go to a temp file in the
/// same directory and are renamed into place, so a crash never leaves a
/// half-written value behind.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            key: root.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(FileStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let safe = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }
}

fn io_error(key: &str, err: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| io_error(key, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| io_error(key, e))?;
        tmp.as_file().sync_all().map_err(|e| io_error(key, e))?;
        tmp.persist(&path).map_err(|e| io_error(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, e)),
        }
    }
}
