//! PersistedCollection - one hydration-guarded, write-through collection.

use serde_json::Value;
use tracing::{debug, warn};

use super::mutators::{self, InsertAt, MutationError};
use super::{CollectionStore, HydrationError, HydrationGuard, HydrationState};
use crate::editor::{Draft, FormSession, SubmitError, Submission};
use crate::error::StoreError;
use crate::record::{IdGenerator, Record, TimestampIds};
use crate::storage::KeyValueStore;

/// A collection of `R` persisted under one storage key.
///
/// Lifecycle:
/// - `hydrate` reads the stored collection (or seeds defaults) exactly once.
/// - Reads and writes fail with [`StoreError::Hydration`] until the collection is ready.
/// - Every mutation builds a new snapshot, writes the whole snapshot, and only
///   then makes it the working snapshot.
///
/// When the backend rejects a write, the new snapshot is parked as pending and
/// the working snapshot stays at the last persisted state. `retry_pending`
/// re-attempts the write; `discard_pending` gives up on it. A later mutation
/// starts from the working snapshot and replaces whatever was pending.
pub struct PersistedCollection<R, S> {
    key: String,
    store: CollectionStore<S>,
    guard: HydrationGuard,
    records: Vec<R>,
    pending: Option<Vec<R>>,
    insert_at: InsertAt,
    ids: Box<dyn IdGenerator>,
}

impl<R: Record, S: KeyValueStore> PersistedCollection<R, S> {
    /// A collection stored under `R::COLLECTION`.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, R::COLLECTION)
    }

    /// A collection stored under a custom key (e.g. a second list of the same record type).
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        PersistedCollection {
            key: key.into(),
            store: CollectionStore::new(storage),
            guard: HydrationGuard::new(),
            records: Vec::new(),
            pending: None,
            insert_at: InsertAt::default(),
            ids: Box::new(TimestampIds::new()),
        }
    }

    /// Which end created records are inserted at.
    pub fn insert_at(mut self, at: InsertAt) -> Self {
        self.insert_at = at;
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> HydrationState {
        self.guard.state()
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    // ========================================================================
    // Hydration
    // ========================================================================

    /// Load the stored collection, or fall back to `seed` when nothing usable is stored.
    ///
    /// Seeded data is written once the collection is ready.
    pub fn hydrate(&mut self, seed: impl FnOnce() -> Vec<R>) -> Result<(), StoreError> {
        self.begin_hydration()?;
        match self.load_persisted() {
            Some(records) => self.finish_hydration(records, false),
            None => {
                debug!(key = %self.key, "no stored collection, seeding defaults");
                self.finish_hydration(seed(), true)
            }
        }
    }

    /// `Unloaded -> Loading`. For callers that hydrate several collections together.
    pub fn begin_hydration(&mut self) -> Result<(), StoreError> {
        let result = self.guard.begin();
        result.map_err(|source| self.hydration_error(source))
    }

    /// Read whatever is stored under this collection's key, without touching the working snapshot.
    pub fn load_persisted(&self) -> Option<Vec<R>> {
        self.store.load(&self.key)
    }

    /// Place `records` into working memory and move to `Ready`.
    ///
    /// `persist` writes them immediately (used for seed data).
    pub fn finish_hydration(&mut self, records: Vec<R>, persist: bool) -> Result<(), StoreError> {
        if self.guard.state() != HydrationState::Loading {
            return Err(self.hydration_error(HydrationError::NotLoading(self.guard.state())));
        }
        self.records = records;
        let result = self.guard.complete();
        result.map_err(|source| self.hydration_error(source))?;
        debug!(key = %self.key, records = self.records.len(), "collection ready");

        if persist {
            let snapshot = self.records.clone();
            if let Err(err) = self.store.save(&self.key, &snapshot) {
                warn!(key = %self.key, error = %err, "failed to persist seed data");
                self.pending = Some(snapshot);
                return Err(err);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The working snapshot.
    pub fn records(&self) -> Result<&[R], StoreError> {
        self.ensure_ready()?;
        Ok(&self.records)
    }

    pub fn get(&self, id: &str) -> Result<Option<&R>, StoreError> {
        Ok(self.records()?.iter().find(|record| record.id() == id))
    }

    pub fn contains(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }

    /// The snapshot that failed to persist, if any.
    pub fn pending(&self) -> Option<&[R]> {
        self.pending.as_deref()
    }

    // ========================================================================
    // Write-through mutations
    // ========================================================================

    /// Assign a fresh id to `record`, insert it, and persist. Returns the new id.
    pub fn create(&mut self, mut record: R) -> Result<String, StoreError> {
        self.ensure_ready()?;
        let id = {
            let existing: Vec<&str> = self.records.iter().map(|r| r.id()).collect();
            self.ids.next_id(&existing)
        };
        record.set_id(id.clone());
        let next = mutators::append(&self.records, record, self.insert_at);
        self.commit(next)?;
        Ok(id)
    }

    /// Insert a record that already carries an id (e.g. one moved from another collection).
    pub fn insert(&mut self, record: R) -> Result<(), StoreError> {
        self.ensure_ready()?;
        if mutators::contains_id(&self.records, record.id()) {
            return Err(StoreError::DuplicateId {
                key: self.key.clone(),
                id: record.id().to_string(),
            });
        }
        let next = mutators::append(&self.records, record, self.insert_at);
        self.commit(next)
    }

    /// Insert records that already carry ids, keeping their relative order.
    ///
    /// Ids are only unique within one collection, so records moved in from
    /// another collection may collide:
    /// - a record identical to the one already stored under its id is skipped
    /// - a record whose id is held by a different record gets a fresh id
    ///
    /// Returns the id each record of `batch` is stored under.
    pub fn insert_all(&mut self, batch: Vec<R>) -> Result<Vec<String>, StoreError> {
        self.ensure_ready()?;
        let mut taken: Vec<String> = self.records.iter().map(|r| r.id().to_string()).collect();
        let mut stored_ids = Vec::with_capacity(batch.len());
        let mut added = Vec::with_capacity(batch.len());

        for mut record in batch {
            let duplicate = self
                .records
                .iter()
                .find(|existing| existing.id() == record.id())
                .is_some_and(|existing| same_content(existing, &record));
            if duplicate {
                stored_ids.push(record.id().to_string());
                continue;
            }
            if taken.iter().any(|id| id == record.id()) {
                let existing: Vec<&str> = taken.iter().map(String::as_str).collect();
                let fresh = self.ids.next_id(&existing);
                debug!(key = %self.key, id = record.id(), fresh = %fresh, "id already taken, assigning a fresh one");
                record.set_id(fresh);
            }
            taken.push(record.id().to_string());
            stored_ids.push(record.id().to_string());
            added.push(record);
        }

        let next = mutators::append_all(&self.records, added, self.insert_at);
        self.commit(next)?;
        Ok(stored_ids)
    }

    /// Replace the record with `id`, keeping its position.
    pub fn replace(&mut self, id: &str, record: R) -> Result<(), StoreError> {
        self.ensure_ready()?;
        self.note_missing(id, "replace");
        let next = mutators::replace_by_id(&self.records, id, record);
        self.commit(next)
    }

    /// Remove the record with `id`.
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        self.ensure_ready()?;
        self.note_missing(id, "remove");
        let next = mutators::remove_by_id(&self.records, id);
        self.commit(next)
    }

    /// Make the record with `id` the only one with `flag` set.
    pub fn set_exclusive_flag(&mut self, id: &str, flag: &str) -> Result<(), StoreError> {
        self.ensure_ready()?;
        self.note_missing(id, "set_exclusive_flag");
        let next = mutators::set_exclusive_flag(&self.records, id, flag)?;
        self.commit(next)
    }

    /// Set one field of the record with `id`. Still rewrites the whole collection.
    pub fn update_field(
        &mut self,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), StoreError> {
        self.ensure_ready()?;
        self.note_missing(id, "update_field");
        let next = mutators::update_field(&self.records, id, field, value.into())?;
        self.commit(next)
    }

    /// Edit a copy of the record with `id` in place and persist it.
    pub fn modify(&mut self, id: &str, edit: impl FnOnce(&mut R)) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let next = match self.records.iter().find(|record| record.id() == id) {
            Some(current) => {
                let mut updated = current.clone();
                edit(&mut updated);
                mutators::replace_by_id(&self.records, id, updated)
            }
            None => {
                self.note_missing(id, "modify");
                self.records.clone()
            }
        };
        self.commit(next)
    }

    /// Run an arbitrary snapshot transition and persist its result.
    pub fn mutate(
        &mut self,
        transition: impl FnOnce(&[R]) -> Result<Vec<R>, MutationError>,
    ) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let next = transition(&self.records)?;
        self.commit(next)
    }

    /// Apply a submitted form. Returns the id of the created or updated record.
    pub fn apply(&mut self, submission: Submission<R>) -> Result<String, StoreError> {
        match submission {
            Submission::Create(record) => self.create(record),
            Submission::Update { id, record } => {
                self.replace(&id, record)?;
                Ok(id)
            }
        }
    }

    /// Validate `session`, and apply it when valid.
    ///
    /// On validation failure the session keeps its draft and per-field errors
    /// for correction; nothing is written.
    pub fn submit<D>(&mut self, session: &mut FormSession<D>) -> Result<String, SubmitError>
    where
        D: Draft<Record = R>,
    {
        let submission = session.submit()?;
        Ok(self.apply(submission)?)
    }

    // ========================================================================
    // Failed writes
    // ========================================================================

    /// Re-attempt the pending write. Returns false when nothing was pending.
    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.ensure_ready()?;
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        self.commit(pending)?;
        Ok(true)
    }

    /// Drop the pending write, returning it.
    pub fn discard_pending(&mut self) -> Option<Vec<R>> {
        self.pending.take()
    }

    fn commit(&mut self, next: Vec<R>) -> Result<(), StoreError> {
        match self.store.save(&self.key, &next) {
            Ok(()) => {
                self.records = next;
                self.pending = None;
                Ok(())
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "write failed, mutation kept pending");
                self.pending = Some(next);
                Err(err)
            }
        }
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        self.guard
            .ensure_ready()
            .map_err(|source| self.hydration_error(source))
    }

    fn hydration_error(&self, source: HydrationError) -> StoreError {
        StoreError::Hydration {
            key: self.key.clone(),
            source,
        }
    }

    fn note_missing(&self, id: &str, operation: &'static str) {
        if !mutators::contains_id(&self.records, id) {
            debug!(key = %self.key, id, operation, "record not found, committing unchanged collection");
        }
    }
}

fn same_content<R: Record>(a: &R, b: &R) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
