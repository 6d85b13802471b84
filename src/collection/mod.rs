//! Collections - ordered record lists persisted under one storage key.
//!
//! - [`CollectionStore`] reads and writes a whole collection as JSON.
//! - [`HydrationGuard`] orders "read persisted state" before "allow writes".
//! - [`mutators`] are pure snapshot transitions.
//! - [`PersistedCollection`] composes the three: every mutation is written
//!   through before it becomes the working snapshot.

mod hydration;
pub mod mutators;
mod persisted;
mod store;

pub use hydration::{HydrationError, HydrationGuard, HydrationState};
pub use mutators::{InsertAt, MutationError};
pub use persisted::PersistedCollection;
pub use store::CollectionStore;
