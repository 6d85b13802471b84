//! Emergency contacts.

use serde::{Deserialize, Serialize};

use super::seed_written;
use crate::collection::PersistedCollection;
use crate::editor::{Draft, EditableDraft, FormSession, SubmitError, ValidationErrors};
use crate::error::StoreError;
use crate::storage::KeyValueStore;
use crate::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "user_emergency_contacts_v1")]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub relation: String,
    pub phone: String,
    pub email: String,
}

pub fn default_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            id: "1".into(),
            name: "Michael Martinez".into(),
            relation: "Spouse".into(),
            phone: "+1 (555) 234-5678".into(),
            email: "michael.m@email.com".into(),
        },
        EmergencyContact {
            id: "2".into(),
            name: "Dr. Jennifer Park".into(),
            relation: "Primary Care Physician".into(),
            phone: "+1 (555) 876-5432".into(),
            email: "dr.park@healthclinic.com".into(),
        },
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub relation: String,
    pub phone: String,
    pub email: String,
}

impl Draft for ContactDraft {
    type Record = EmergencyContact;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("name", &self.name)
            .require("relation", &self.relation)
            .require("phone", &self.phone)
            .require("email", &self.email);
        errors.into_result()
    }

    fn into_record(self) -> EmergencyContact {
        EmergencyContact {
            id: String::new(),
            name: self.name.trim().to_string(),
            relation: self.relation.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

impl EditableDraft for ContactDraft {
    fn from_record(record: &EmergencyContact) -> Self {
        ContactDraft {
            name: record.name.clone(),
            relation: record.relation.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
        }
    }
}

/// Emergency contacts on the personal data page.
pub struct EmergencyContacts<S> {
    contacts: PersistedCollection<EmergencyContact, S>,
}

impl<S: KeyValueStore> EmergencyContacts<S> {
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let mut contacts = PersistedCollection::new(storage);
        let seeded = contacts.hydrate(default_contacts);
        seed_written(contacts.key(), seeded)?;
        Ok(EmergencyContacts { contacts })
    }

    /// Whether a write, the seed included, is waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.contacts.pending().is_some()
    }

    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.contacts.retry_pending()
    }

    pub fn list(&self) -> Result<&[EmergencyContact], StoreError> {
        self.contacts.records()
    }

    pub fn get(&self, id: &str) -> Result<Option<&EmergencyContact>, StoreError> {
        self.contacts.get(id)
    }

    pub fn submit(&mut self, session: &mut FormSession<ContactDraft>) -> Result<String, SubmitError> {
        self.contacts.submit(session)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        self.contacts.remove(id)
    }
}
