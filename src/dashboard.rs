//! Dashboard - every page store, hydrated against one shared backend.

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, DashboardConfig};
use crate::domain::certifications::Certifications;
use crate::domain::contacts::EmergencyContacts;
use crate::domain::equipment::EquipmentLocker;
use crate::domain::insurance::InsuranceBook;
use crate::domain::logbook::Logbook;
use crate::domain::payments::Wallet;
use crate::domain::profile::ProfilePhoto;
use crate::domain::settings::AccountSettings;
use crate::error::StoreError;
use crate::storage::{KeyValueStore, StorageBackend};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// All pages of the dashboard. Each page hydrates when the dashboard opens.
pub struct Dashboard<S = StorageBackend> {
    storage: S,
    pub certifications: Certifications<S>,
    pub equipment: EquipmentLocker<S>,
    pub insurance: InsuranceBook<S>,
    pub payments: Wallet<S>,
    pub contacts: EmergencyContacts<S>,
    pub logbook: Logbook<S>,
    pub settings: AccountSettings<S>,
    pub profile: ProfilePhoto<S>,
}

impl Dashboard<StorageBackend> {
    /// Open the backend named by `config` and hydrate every page from it.
    pub fn open(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let storage = config.open_storage()?;
        debug!(backend = ?config.backend, "opening dashboard");
        Ok(Self::with_storage(storage, config.expiring_soon_days)?)
    }
}

impl<S: KeyValueStore + Clone> Dashboard<S> {
    /// Hydrate every page from `storage`.
    pub fn with_storage(storage: S, expiring_soon_days: u64) -> Result<Self, StoreError> {
        Ok(Dashboard {
            certifications: Certifications::open(storage.clone())?,
            equipment: EquipmentLocker::open(storage.clone())?,
            insurance: InsuranceBook::open(storage.clone(), expiring_soon_days)?,
            payments: Wallet::open(storage.clone())?,
            contacts: EmergencyContacts::open(storage.clone())?,
            logbook: Logbook::open(storage.clone())?,
            settings: AccountSettings::open(storage.clone()),
            profile: ProfilePhoto::open(storage.clone()),
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether any page has a write, seed data included, waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.certifications.has_pending()
            || self.equipment.has_pending()
            || self.insurance.has_pending()
            || self.payments.has_pending()
            || self.contacts.has_pending()
            || self.logbook.has_pending()
    }

    /// Retry every page's pending write. Returns how many pages were written.
    pub fn retry_pending(&mut self) -> Result<usize, StoreError> {
        let written = [
            self.certifications.retry_pending()?,
            self.equipment.retry_pending()?,
            self.insurance.retry_pending()?,
            self.payments.retry_pending()?,
            self.contacts.retry_pending()?,
            self.logbook.retry_pending()?,
        ];
        let count = written.iter().filter(|&&w| w).count();
        if count > 0 {
            debug!(pages = count, "retried pending writes");
        }
        Ok(count)
    }
}
