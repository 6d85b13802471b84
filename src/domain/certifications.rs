//! Diving certifications, newest first.

use serde::{Deserialize, Serialize};

use super::seed_written;
use crate::collection::{InsertAt, PersistedCollection};
use crate::editor::{Draft, FormSession, SubmitError, ValidationErrors};
use crate::error::StoreError;
use crate::storage::KeyValueStore;
use crate::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
#[record(collection = "diving_certs_data_v2")]
pub struct Certification {
    pub id: String,
    pub title: String,
    pub agency: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    pub certifying_agency: String,
}

impl Certification {
    /// A certification with only a title and an issuing agency filled in.
    pub fn new(title: impl Into<String>, agency: impl Into<String>) -> Self {
        let agency = agency.into();
        Certification {
            id: String::new(),
            title: title.into(),
            agency: agency.clone(),
            kind: "Specialty".into(),
            number: "N/A".into(),
            date: "Not set".into(),
            expiry_date: None,
            certifying_agency: agency,
        }
    }
}

pub fn default_certifications() -> Vec<Certification> {
    let padi = |id: &str, title: &str, kind: &str, number: &str, date: &str| Certification {
        id: id.into(),
        title: title.into(),
        agency: "PADI".into(),
        kind: kind.into(),
        number: number.into(),
        date: date.into(),
        expiry_date: None,
        certifying_agency: "PADI".into(),
    };
    vec![
        padi("1", "Advanced Open Water Diver", "Advanced", "PADI-10387291", "March 12, 2022"),
        padi("2", "Deep Diver Specialty", "Specialty", "PADI-59271847", "November 20, 2024"),
        padi("3", "Wreck Diver Specialty", "Specialty", "PADI-58029183", "July 8, 2023"),
    ]
}

/// The "add certification" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationDraft {
    pub title: String,
    pub agency: String,
    pub number: String,
    pub date: String,
    pub expiry_date: String,
    pub kind: String,
}

impl Default for CertificationDraft {
    fn default() -> Self {
        CertificationDraft {
            title: String::new(),
            agency: String::new(),
            number: String::new(),
            date: String::new(),
            expiry_date: String::new(),
            kind: "Specialty".into(),
        }
    }
}

impl Draft for CertificationDraft {
    type Record = Certification;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("title", &self.title)
            .require("agency", &self.agency)
            .require("date", &self.date);
        errors.into_result()
    }

    fn into_record(self) -> Certification {
        let number = self.number.trim();
        let expiry = self.expiry_date.trim();
        Certification {
            id: String::new(),
            title: self.title.trim().to_string(),
            agency: self.agency.trim().to_string(),
            kind: self.kind,
            number: if number.is_empty() { "N/A".into() } else { number.to_string() },
            date: self.date.trim().to_string(),
            expiry_date: (!expiry.is_empty()).then(|| expiry.to_string()),
            certifying_agency: self.agency.trim().to_string(),
        }
    }
}

/// The certifications page.
pub struct Certifications<S> {
    collection: PersistedCollection<Certification, S>,
}

impl<S: KeyValueStore> Certifications<S> {
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let mut collection = PersistedCollection::new(storage).insert_at(InsertAt::Front);
        let seeded = collection.hydrate(default_certifications);
        seed_written(collection.key(), seeded)?;
        Ok(Certifications { collection })
    }

    /// Whether a write, the seed included, is waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.collection.pending().is_some()
    }

    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.collection.retry_pending()
    }

    pub fn list(&self) -> Result<&[Certification], StoreError> {
        self.collection.records()
    }

    /// Add a new certification at the top of the list.
    pub fn add(&mut self, certification: Certification) -> Result<String, StoreError> {
        self.collection.create(certification)
    }

    pub fn submit(
        &mut self,
        session: &mut FormSession<CertificationDraft>,
    ) -> Result<String, SubmitError> {
        self.collection.submit(session)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.collection.remove(id)
    }
}
