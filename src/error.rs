use thiserror::Error;

use crate::collection::{HydrationError, MutationError};
use crate::storage::StorageError;

/// Error type for persisted collection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The collection is not in the state the operation requires.
    #[error("collection {key}: {source}")]
    Hydration {
        key: String,
        #[source]
        source: HydrationError,
    },
    /// The collection could not be encoded for storage.
    #[error("failed to serialize collection {key}: {message}")]
    Serialize { key: String, message: String },
    /// The backend rejected the write. The mutation is parked as pending
    /// and can be retried.
    #[error("failed to persist collection {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },
    /// A record with this id is already in the collection.
    #[error("collection {key} already contains a record with id {id}")]
    DuplicateId { key: String, id: String },
    /// A field-level mutation was rejected.
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl StoreError {
    /// Whether the failed operation can be retried without user correction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Write { .. })
    }
}
