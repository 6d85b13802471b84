use thiserror::Error;

/// Error type for key-value backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The write would push the backend past its byte quota. The previous value is kept.
    #[error("storage quota exceeded writing {key} ({requested} bytes requested, {available} available)")]
    QuotaExceeded {
        key: String,
        requested: usize,
        available: usize,
    },
    /// The key cannot be mapped onto the backend (e.g. not a safe file name).
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    /// The underlying lock primitive was poisoned.
    #[error("storage lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// Filesystem failure.
    #[error("storage io error on {key}: {message}")]
    Io { key: String, message: String },
}
