//! Insurance policies, kept in an active and an expired list.
//!
//! A policy's status is derived from `validUntil` and the date it is viewed
//! on. It is never stored; legacy `status`/`statusColor`/`warning` values in
//! stored data are ignored.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::seed_written;
use crate::collection::{InsertAt, PersistedCollection};
use crate::editor::{Draft, EditableDraft, FormSession, SubmitError, Submission, ValidationErrors};
use crate::error::StoreError;
use crate::storage::KeyValueStore;
use crate::Record;

pub const ACTIVE_KEY: &str = "active_policies";
pub const EXPIRED_KEY: &str = "expired_policies";

/// Default number of days before `validUntil` at which a policy counts as expiring soon.
pub const DEFAULT_EXPIRING_SOON_DAYS: u64 = 30;

const DATE_FORMATS: [&str; 3] = ["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
#[record(collection = "active_policies")]
pub struct Policy {
    pub id: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub policy_number: String,
    pub valid_from: String,
    pub valid_until: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    pub coverage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStatus {
    Active,
    ExpiringSoon,
    Expired,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStatus::Active => write!(f, "Active"),
            PolicyStatus::ExpiringSoon => write!(f, "Expiring Soon"),
            PolicyStatus::Expired => write!(f, "Expired"),
        }
    }
}

/// Parse a dashboard date ("December 31, 2025", "Dec 31, 2025" or "2025-12-31").
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

impl Policy {
    pub fn valid_until_date(&self) -> Option<NaiveDate> {
        parse_date(&self.valid_until)
    }

    /// Status on `today`. `None` when `validUntil` is not a recognizable date.
    pub fn status_on(&self, today: NaiveDate, expiring_soon_days: u64) -> Option<PolicyStatus> {
        let until = self.valid_until_date()?;
        if until < today {
            return Some(PolicyStatus::Expired);
        }
        let horizon = today
            .checked_add_days(Days::new(expiring_soon_days))
            .unwrap_or(NaiveDate::MAX);
        if until <= horizon {
            Some(PolicyStatus::ExpiringSoon)
        } else {
            Some(PolicyStatus::Active)
        }
    }

    /// Renewal reminder shown while a policy is expiring soon.
    pub fn warning_on(&self, today: NaiveDate, expiring_soon_days: u64) -> Option<String> {
        match self.status_on(today, expiring_soon_days)? {
            PolicyStatus::ExpiringSoon => Some(format!(
                "This policy will expire on {}. Consider renewing to maintain coverage.",
                self.valid_until
            )),
            _ => None,
        }
    }
}

pub fn default_active_policies() -> Vec<Policy> {
    vec![
        Policy {
            id: "1".into(),
            provider: "DAN (Divers Alert Network)".into(),
            kind: "Dive Accident Insurance".into(),
            policy_number: "DAN-2024-8472910".into(),
            valid_from: "January 1, 2025".into(),
            valid_until: "December 31, 2025".into(),
            issue_date: Some("December 15, 2024".into()),
            certificate_number: Some("CERT-9372510".into()),
            coverage: "Worldwide coverage up to $500,000".into(),
        },
        Policy {
            id: "2".into(),
            provider: "World Nomads".into(),
            kind: "Travel Insurance".into(),
            policy_number: "WN-2025-847201".into(),
            valid_from: "March 1, 2025".into(),
            valid_until: "March 31, 2025".into(),
            issue_date: None,
            certificate_number: None,
            coverage: "Medical, trip cancellation, and equipment".into(),
        },
    ]
}

pub fn default_expired_policies() -> Vec<Policy> {
    vec![Policy {
        id: "3".into(),
        provider: "DAN Europe".into(),
        kind: "Dive Accident Insurance".into(),
        policy_number: "DANE-2023-729184".into(),
        valid_from: "January 1, 2024".into(),
        valid_until: "December 31, 2024".into(),
        issue_date: None,
        certificate_number: None,
        coverage: "Standard Dive Coverage".into(),
    }]
}

/// The policy edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDraft {
    pub provider: String,
    pub kind: String,
    pub policy_number: String,
    pub valid_from: String,
    pub valid_until: String,
    pub issue_date: Option<String>,
    pub certificate_number: Option<String>,
    pub coverage: String,
}

impl Draft for PolicyDraft {
    type Record = Policy;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("provider", &self.provider)
            .require("policyNumber", &self.policy_number)
            .require("validFrom", &self.valid_from)
            .require("validUntil", &self.valid_until);
        if !errors.has("validUntil") && parse_date(&self.valid_until).is_none() {
            errors.reject("validUntil", "is not a recognizable date");
        }
        errors.into_result()
    }

    fn into_record(self) -> Policy {
        Policy {
            id: String::new(),
            provider: self.provider,
            kind: self.kind,
            policy_number: self.policy_number.trim().to_string(),
            valid_from: self.valid_from.trim().to_string(),
            valid_until: self.valid_until.trim().to_string(),
            issue_date: self.issue_date,
            certificate_number: self.certificate_number,
            coverage: self.coverage,
        }
    }
}

impl EditableDraft for PolicyDraft {
    fn from_record(record: &Policy) -> Self {
        PolicyDraft {
            provider: record.provider.clone(),
            kind: record.kind.clone(),
            policy_number: record.policy_number.clone(),
            valid_from: record.valid_from.clone(),
            valid_until: record.valid_until.clone(),
            issue_date: record.issue_date.clone(),
            certificate_number: record.certificate_number.clone(),
            coverage: record.coverage.clone(),
        }
    }
}

/// The insurance page: two collections hydrated together.
pub struct InsuranceBook<S> {
    active: PersistedCollection<Policy, S>,
    expired: PersistedCollection<Policy, S>,
    expiring_soon_days: u64,
}

impl<S: KeyValueStore + Clone> InsuranceBook<S> {
    /// Hydrate both lists. Stored data is used only when both keys hold a
    /// readable list; otherwise both lists are reseeded.
    pub fn open(storage: S, expiring_soon_days: u64) -> Result<Self, StoreError> {
        let mut active = PersistedCollection::with_key(storage.clone(), ACTIVE_KEY);
        let mut expired =
            PersistedCollection::with_key(storage, EXPIRED_KEY).insert_at(InsertAt::Front);

        active.begin_hydration()?;
        expired.begin_hydration()?;
        match (active.load_persisted(), expired.load_persisted()) {
            (Some(stored_active), Some(stored_expired)) => {
                active.finish_hydration(stored_active, false)?;
                expired.finish_hydration(stored_expired, false)?;
            }
            (stored_active, stored_expired) => {
                if stored_active.is_some() || stored_expired.is_some() {
                    warn!("only one insurance list is stored, reseeding both");
                }
                // Both lists must leave Loading even if the first seed write fails.
                let seeded_active = active.finish_hydration(default_active_policies(), true);
                let seeded_expired = expired.finish_hydration(default_expired_policies(), true);
                seed_written(ACTIVE_KEY, seeded_active)?;
                seed_written(EXPIRED_KEY, seeded_expired)?;
            }
        }

        Ok(InsuranceBook {
            active,
            expired,
            expiring_soon_days,
        })
    }
}

impl<S: KeyValueStore> InsuranceBook<S> {
    pub fn active(&self) -> Result<&[Policy], StoreError> {
        self.active.records()
    }

    pub fn expired(&self) -> Result<&[Policy], StoreError> {
        self.expired.records()
    }

    /// Whether either list has a write waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.active.pending().is_some() || self.expired.pending().is_some()
    }

    /// Retry both lists. Returns whether anything was written.
    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        let active = self.active.retry_pending()?;
        let expired = self.expired.retry_pending()?;
        Ok(active || expired)
    }

    pub fn expiring_soon_days(&self) -> u64 {
        self.expiring_soon_days
    }

    pub fn find(&self, id: &str) -> Result<Option<&Policy>, StoreError> {
        match self.active.get(id)? {
            Some(policy) => Ok(Some(policy)),
            None => self.expired.get(id),
        }
    }

    pub fn status_of(&self, policy: &Policy, today: NaiveDate) -> Option<PolicyStatus> {
        policy.status_on(today, self.expiring_soon_days)
    }

    /// Replace the policy wherever it lives. Both lists are rewritten.
    pub fn save_policy(&mut self, id: &str, policy: Policy) -> Result<(), StoreError> {
        self.active.replace(id, policy.clone())?;
        self.expired.replace(id, policy)
    }

    /// Add a newly scanned or uploaded policy to the active list.
    pub fn add_policy(&mut self, policy: Policy) -> Result<String, StoreError> {
        self.active.create(policy)
    }

    pub fn submit(&mut self, session: &mut FormSession<PolicyDraft>) -> Result<String, SubmitError> {
        match session.submit()? {
            Submission::Create(policy) => Ok(self.add_policy(policy)?),
            Submission::Update { id, record } => {
                self.save_policy(&id, record)?;
                Ok(id)
            }
        }
    }

    /// Move every active policy that has expired by `today` to the front of the
    /// expired list, in their active-list order. Returns how many moved.
    ///
    /// A moved policy whose id is already used by a different expired policy
    /// is stored under a fresh id.
    pub fn archive_expired(&mut self, today: NaiveDate) -> Result<usize, StoreError> {
        let lapsed: Vec<Policy> = self
            .active()?
            .iter()
            .filter(|p| p.status_on(today, self.expiring_soon_days) == Some(PolicyStatus::Expired))
            .cloned()
            .collect();

        if lapsed.is_empty() {
            return Ok(0);
        }

        // Insert first: a failed remove leaves a duplicate, never a loss.
        self.expired.insert_all(lapsed.clone())?;
        self.active.mutate(|records| {
            Ok(records
                .iter()
                .filter(|p| !lapsed.iter().any(|gone| gone.id == p.id))
                .cloned()
                .collect())
        })?;
        debug!(moved = lapsed.len(), "archived expired policies");
        Ok(lapsed.len())
    }
}
