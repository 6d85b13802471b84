//! Id generators for newly created records.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Produces ids for records created in a collection.
///
/// The returned id is never one of `existing`.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, existing: &[&str]) -> String;
}

/// Millisecond wall-clock ids, strictly increasing per generator.
///
/// Two creations inside the same millisecond get consecutive values instead of
/// colliding.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicI64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self, existing: &[&str]) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self.last.load(Ordering::SeqCst);
        let mut candidate = now.max(previous + 1);

        while existing.contains(&candidate.to_string().as_str()) {
            candidate += 1;
        }

        self.last.fetch_max(candidate, Ordering::SeqCst);
        candidate.to_string()
    }
}

/// Numeric ids counting up from the largest numeric id already present.
///
/// An empty (or entirely non-numeric) collection starts at `floor`.
#[derive(Debug, Clone, Copy)]
pub struct SequentialIds {
    floor: u64,
}

impl SequentialIds {
    pub fn new(floor: u64) -> Self {
        SequentialIds { floor }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, existing: &[&str]) -> String {
        existing
            .iter()
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(self.floor)
            .to_string()
    }
}
