//! Records - addressable items persisted together under one storage key.

mod id;

use serde::{de::DeserializeOwned, Serialize};

pub use id::{IdGenerator, SequentialIds, TimestampIds};

/// Trait for types that live inside a persisted collection.
///
/// Usually derived with `#[derive(Record)]`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The storage key this record type's collection lives under by default
    /// (e.g. "diving_certs_data_v2", "dive_logs").
    const COLLECTION: &'static str;

    /// Returns the identifier, unique within one collection.
    fn id(&self) -> &str;

    /// Overwrites the identifier. Used when a new record is assigned a generated id.
    fn set_id(&mut self, id: String);
}
