//! Pure snapshot transitions over a collection.
//!
//! Every function takes the current snapshot by reference and returns a new
//! one; the input is never modified. Operations addressing a missing id
//! return an unchanged copy.

use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

/// Which end of the collection new records are inserted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertAt {
    /// Newest first (logbook, certifications).
    Front,
    /// Newest last (equipment, payment cards, contacts).
    #[default]
    Back,
}

/// Error type for field-addressed mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The record does not serialize to a JSON object.
    #[error("record {id} cannot be addressed by field: {message}")]
    NotAnObject { id: String, message: String },
    /// The record type has no such field.
    #[error("record {id} has no field {field:?}")]
    UnknownField { id: String, field: String },
    /// The value does not fit the field.
    #[error("field {field:?} of record {id} rejected the value: {message}")]
    InvalidValue {
        id: String,
        field: String,
        message: String,
    },
}

/// Insert `record` at the given end.
pub fn append<R: Record>(records: &[R], record: R, at: InsertAt) -> Vec<R> {
    let mut next = Vec::with_capacity(records.len() + 1);
    match at {
        InsertAt::Front => {
            next.push(record);
            next.extend_from_slice(records);
        }
        InsertAt::Back => {
            next.extend_from_slice(records);
            next.push(record);
        }
    }
    next
}

/// Insert `batch` at the given end, keeping the batch's own order.
pub fn append_all<R: Record>(records: &[R], batch: Vec<R>, at: InsertAt) -> Vec<R> {
    let mut next = Vec::with_capacity(records.len() + batch.len());
    match at {
        InsertAt::Front => {
            next.extend(batch);
            next.extend_from_slice(records);
        }
        InsertAt::Back => {
            next.extend_from_slice(records);
            next.extend(batch);
        }
    }
    next
}

/// Swap the record with `id` for `record`, keeping its position.
///
/// The replacement always keeps `id`, whatever id it carried.
pub fn replace_by_id<R: Record>(records: &[R], id: &str, mut record: R) -> Vec<R> {
    record.set_id(id.to_string());
    records
        .iter()
        .map(|existing| {
            if existing.id() == id {
                record.clone()
            } else {
                existing.clone()
            }
        })
        .collect()
}

/// Drop the record with `id`.
pub fn remove_by_id<R: Record>(records: &[R], id: &str) -> Vec<R> {
    records
        .iter()
        .filter(|record| record.id() != id)
        .cloned()
        .collect()
}

/// Set the boolean `flag` on the record with `id` and clear it on every other record.
///
/// If `id` is absent nothing changes, so an existing flag holder keeps its flag.
pub fn set_exclusive_flag<R: Record>(
    records: &[R],
    id: &str,
    flag: &str,
) -> Result<Vec<R>, MutationError> {
    if !contains_id(records, id) {
        return Ok(records.to_vec());
    }
    records
        .iter()
        .map(|record| with_field(record, flag, Value::Bool(record.id() == id)))
        .collect()
}

/// Set a single field on the record with `id`; every other record is copied as-is.
pub fn update_field<R: Record>(
    records: &[R],
    id: &str,
    field: &str,
    value: Value,
) -> Result<Vec<R>, MutationError> {
    records
        .iter()
        .map(|record| {
            if record.id() == id {
                with_field(record, field, value.clone())
            } else {
                Ok(record.clone())
            }
        })
        .collect()
}

pub fn contains_id<R: Record>(records: &[R], id: &str) -> bool {
    records.iter().any(|record| record.id() == id)
}

/// Apply one field change by round-tripping the record through its JSON form.
///
/// The change must survive re-serialization, which catches misspelled field
/// names (serde would otherwise drop them silently) and type mismatches.
/// Assigning null to a field that does not show up in the encoding is
/// accepted: it is indistinguishable from clearing a skipped `None`.
fn with_field<R: Record>(record: &R, field: &str, value: Value) -> Result<R, MutationError> {
    let id = record.id().to_string();

    let mut encoded = serde_json::to_value(record).map_err(|e| MutationError::NotAnObject {
        id: id.clone(),
        message: e.to_string(),
    })?;
    let Value::Object(map) = &mut encoded else {
        return Err(MutationError::NotAnObject {
            id,
            message: "not a JSON object".into(),
        });
    };
    map.insert(field.to_string(), value.clone());

    let updated: R = serde_json::from_value(encoded).map_err(|e| MutationError::InvalidValue {
        id: id.clone(),
        field: field.to_string(),
        message: e.to_string(),
    })?;

    if updated.id() != id {
        return Err(MutationError::InvalidValue {
            id,
            field: field.to_string(),
            message: "the id of a record cannot be changed".into(),
        });
    }

    let reencoded = serde_json::to_value(&updated).map_err(|e| MutationError::NotAnObject {
        id: id.clone(),
        message: e.to_string(),
    })?;
    let landed = match reencoded.get(field) {
        Some(stored) => stored == &value,
        None => value.is_null(),
    };
    if !landed {
        return Err(MutationError::UnknownField {
            id,
            field: field.to_string(),
        });
    }

    Ok(updated)
}
