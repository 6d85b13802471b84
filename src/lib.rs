//! Locally persisted record collections for the Bucceo diver dashboard.
//!
//! Every dashboard page owns one or more collections stored under a single
//! key in a key-value backend. A collection is hydrated exactly once (stored
//! data or seed defaults), and every mutation afterwards is written through
//! to the backend before it becomes visible.
//!
//! ## Example
//!
//! ```ignore
//! use bucceo::{InMemoryStorage, PersistedCollection, InsertAt};
//!
//! let storage = InMemoryStorage::new();
//! let mut certs = PersistedCollection::<Certification, _>::new(storage)
//!     .insert_at(InsertAt::Front);
//! certs.hydrate(default_certifications)?;
//! let id = certs.create(rescue_diver)?;
//! ```

// The derive macro expands to `bucceo::Record`, which must resolve inside this crate too.
extern crate self as bucceo;

mod collection;
mod config;
mod dashboard;
mod domain;
mod editor;
mod error;
mod record;
mod storage;

pub use bucceo_macros::Record;

pub use collection::{
    mutators, CollectionStore, HydrationError, HydrationGuard, HydrationState, InsertAt,
    MutationError, PersistedCollection,
};
pub use config::{BackendKind, ConfigError, DashboardConfig};
pub use dashboard::{Dashboard, DashboardError};
pub use domain::{
    certifications, contacts, equipment, insurance, logbook, payments, profile, settings,
};
pub use editor::{
    format, Draft, EditableDraft, EditorMode, FieldError, FieldErrorKind, FormSession,
    SubmitError, Submission, ValidationErrors,
};
pub use error::StoreError;
pub use record::{IdGenerator, Record, SequentialIds, TimestampIds};
#[cfg(feature = "fs")]
pub use storage::FileStorage;
pub use storage::{InMemoryStorage, KeyValueStore, StorageBackend, StorageError};
