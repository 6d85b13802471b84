//! Dive gear, grouped into sections.
//!
//! The whole locker (every section and its items) is one collection keyed by
//! section title; item edits rewrite the owning section.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::seed_written;
use crate::collection::{mutators, InsertAt, PersistedCollection};
use crate::editor::{Draft, EditableDraft, FormSession, SubmitError, Submission, ValidationErrors};
use crate::error::StoreError;
use crate::record::{IdGenerator, TimestampIds};
use crate::storage::KeyValueStore;
use crate::Record;

/// One piece of gear. Lives inside an [`EquipmentSection`], not in a collection of its own.
///
/// Items are stored as part of their section under the sections key; the
/// `COLLECTION` name below only labels that nesting and is never read or
/// written on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "diveEquipmentData.items")]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    pub size: String,
    pub eu: String,
    pub us: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "diveEquipmentData")]
pub struct EquipmentSection {
    #[record(id)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<EquipmentItem>,
}

impl EquipmentSection {
    pub fn new(title: impl Into<String>, items: Vec<EquipmentItem>) -> Self {
        EquipmentSection {
            title: title.into(),
            items,
        }
    }

    /// Badge text, e.g. "1 item", "2 items".
    pub fn count_label(&self) -> String {
        match self.items.len() {
            1 => "1 item".to_string(),
            n => format!("{} items", n),
        }
    }
}

fn item(id: &str, name: &str, size: &str, eu: &str, us: &str, note: &str) -> EquipmentItem {
    EquipmentItem {
        id: id.into(),
        name: name.into(),
        size: size.into(),
        eu: eu.into(),
        us: us.into(),
        note: note.into(),
    }
}

pub fn default_sections() -> Vec<EquipmentSection> {
    vec![
        EquipmentSection::new(
            "Wetsuits & Drysuits",
            vec![
                item("w-1", "5mm Full Wetsuit", "M", "EU 48", "US M", "Standard 5mm neoprene"),
                item("w-2", "3mm Shorty Wetsuit", "M", "EU 48", "US M", "Tropical water shorty"),
            ],
        ),
        EquipmentSection::new(
            "Fins",
            vec![item("f-1", "Split Fins", "L", "EU 44", "US 10", "Open heel fins")],
        ),
        EquipmentSection::new(
            "Masks & Snorkels",
            vec![item("m-1", "Frameless Mask", "OS", "N/A", "N/A", "Black silicone")],
        ),
        EquipmentSection::new(
            "BCDs",
            vec![item("b-1", "Back-inflate BCD", "M", "EU 48", "US M", "Travel lightweight")],
        ),
        EquipmentSection::new(
            "Regulators",
            vec![item("r-1", "Sealed 1st Stage", "DIN", "N/A", "N/A", "Cold water rated")],
        ),
        EquipmentSection::new(
            "Dive Computers",
            vec![item("d-1", "OLED Computer", "Wrist", "N/A", "N/A", "Bluetooth sync enabled")],
        ),
        EquipmentSection::new(
            "Accessories",
            vec![
                item("a-1", "SMB & Spool", "15m", "N/A", "N/A", "High-viz orange"),
                item("a-2", "Dive Knife", "Small", "N/A", "N/A", "Titanium blade"),
            ],
        ),
    ]
}

/// The item edit modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentItemDraft {
    pub name: String,
    pub size: String,
    pub eu: String,
    pub us: String,
    pub note: String,
}

impl Draft for EquipmentItemDraft {
    type Record = EquipmentItem;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.into_result()
    }

    fn into_record(self) -> EquipmentItem {
        EquipmentItem {
            id: String::new(),
            name: self.name.trim().to_string(),
            size: self.size,
            eu: self.eu,
            us: self.us,
            note: self.note,
        }
    }
}

impl EditableDraft for EquipmentItemDraft {
    fn from_record(record: &EquipmentItem) -> Self {
        EquipmentItemDraft {
            name: record.name.clone(),
            size: record.size.clone(),
            eu: record.eu.clone(),
            us: record.us.clone(),
            note: record.note.clone(),
        }
    }
}

/// The equipment page.
pub struct EquipmentLocker<S> {
    sections: PersistedCollection<EquipmentSection, S>,
    item_ids: TimestampIds,
}

impl<S: KeyValueStore> EquipmentLocker<S> {
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let mut sections = PersistedCollection::new(storage).insert_at(InsertAt::Back);
        let seeded = sections.hydrate(default_sections);
        seed_written(sections.key(), seeded)?;
        Ok(EquipmentLocker {
            sections,
            item_ids: TimestampIds::new(),
        })
    }

    /// Whether a write, the seed included, is waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.sections.pending().is_some()
    }

    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.sections.retry_pending()
    }

    pub fn sections(&self) -> Result<&[EquipmentSection], StoreError> {
        self.sections.records()
    }

    /// The section holding `item_id`, and the item itself.
    pub fn find_item(
        &self,
        item_id: &str,
    ) -> Result<Option<(&EquipmentSection, &EquipmentItem)>, StoreError> {
        Ok(self.sections()?.iter().find_map(|section| {
            section
                .items
                .iter()
                .find(|item| item.id == item_id)
                .map(|item| (section, item))
        }))
    }

    /// Live note editing: rewrites the item's note and persists the whole locker.
    pub fn update_note(&mut self, item_id: &str, note: &str) -> Result<(), StoreError> {
        self.update_item_field(item_id, "note", Value::from(note))
    }

    /// Set one field of an item wherever it lives.
    pub fn update_item_field(
        &mut self,
        item_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.sections.mutate(|sections| {
            sections
                .iter()
                .map(|section| {
                    if !mutators::contains_id(&section.items, item_id) {
                        return Ok(section.clone());
                    }
                    let items = mutators::update_field(&section.items, item_id, field, value.clone())?;
                    Ok(EquipmentSection {
                        title: section.title.clone(),
                        items,
                    })
                })
                .collect()
        })
    }

    /// Swap an item for an edited copy, keeping its position and id.
    pub fn replace_item(&mut self, item_id: &str, item: EquipmentItem) -> Result<(), StoreError> {
        self.sections.mutate(|sections| {
            Ok(sections
                .iter()
                .map(|section| EquipmentSection {
                    title: section.title.clone(),
                    items: mutators::replace_by_id(&section.items, item_id, item.clone()),
                })
                .collect())
        })
    }

    /// Append a new item to the section titled `section`, creating the section
    /// if it does not exist yet. Returns the item id.
    pub fn add_item(&mut self, section: &str, mut item: EquipmentItem) -> Result<String, StoreError> {
        let id = {
            let existing: Vec<&str> = self
                .sections()?
                .iter()
                .flat_map(|s| s.items.iter().map(|i| i.id.as_str()))
                .collect();
            self.item_ids.next_id(&existing)
        };
        item.id = id.clone();

        self.sections.mutate(|sections| {
            if !mutators::contains_id(sections, section) {
                let created = EquipmentSection::new(section, vec![item]);
                return Ok(mutators::append(sections, created, InsertAt::Back));
            }
            Ok(sections
                .iter()
                .map(|s| {
                    if s.title == section {
                        EquipmentSection {
                            title: s.title.clone(),
                            items: mutators::append(&s.items, item.clone(), InsertAt::Back),
                        }
                    } else {
                        s.clone()
                    }
                })
                .collect())
        })?;
        Ok(id)
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<(), StoreError> {
        self.sections.mutate(|sections| {
            Ok(sections
                .iter()
                .map(|section| EquipmentSection {
                    title: section.title.clone(),
                    items: mutators::remove_by_id(&section.items, item_id),
                })
                .collect())
        })
    }

    /// Submit an item form. New items go to the end of `section`; edits stay where they are.
    pub fn submit(
        &mut self,
        section: &str,
        session: &mut FormSession<EquipmentItemDraft>,
    ) -> Result<String, SubmitError> {
        match session.submit()? {
            Submission::Create(item) => Ok(self.add_item(section, item)?),
            Submission::Update { id, record } => {
                self.replace_item(&id, record)?;
                Ok(id)
            }
        }
    }
}
