//! Dashboard pages and the collections behind them.

pub mod certifications;
pub mod contacts;
pub mod equipment;
pub mod insurance;
pub mod logbook;
pub mod payments;
pub mod profile;
pub mod settings;

use tracing::warn;

use crate::error::StoreError;

/// Let a page open when only its seed write failed.
///
/// The collection is already `Ready` with the seed parked as pending, so the
/// page is usable and the write can be retried. Other errors pass through.
pub(crate) fn seed_written(
    key: &str,
    result: Result<(), StoreError>,
) -> Result<(), StoreError> {
    match result {
        Err(err) if err.is_retryable() => {
            warn!(key, error = %err, "seed data not persisted, keeping it pending");
            Ok(())
        }
        other => other,
    }
}
