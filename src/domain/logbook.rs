//! The dive logbook, newest dive first.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::seed_written;
use crate::collection::{InsertAt, PersistedCollection};
use crate::editor::{Draft, FormSession, SubmitError, ValidationErrors};
use crate::error::StoreError;
use crate::record::SequentialIds;
use crate::storage::KeyValueStore;
use crate::Record;

/// Dives logged before this logbook existed. Counted in the total.
pub const HISTORICAL_DIVES: usize = 244;

/// Id given to the first dive logged into an empty logbook.
pub const FIRST_LOG_ID: u64 = 248;

pub const NEW_DIVE_NOTES: &str = "New dive logged successfully.";
pub const NEW_DIVE_EQUIPMENT: &str = "Standard Gear";

/// Dates in the logbook look like "Nov 27, 2025".
pub const LOG_DATE_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "dive_logs")]
pub struct DiveLog {
    pub id: String,
    pub site: String,
    pub location: String,
    pub date: String,
    pub rating: u8,
    pub depth: String,
    pub duration: String,
    pub visibility: String,
    pub temp: String,
    pub buddy: String,
    #[serde(default)]
    pub cosigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
}

impl DiveLog {
    /// Case-insensitive match against site, location and buddy.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || [&self.site, &self.location, &self.buddy]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
    }
}

pub fn default_logs() -> Vec<DiveLog> {
    vec![
        DiveLog {
            id: "247".into(),
            site: "Great Blue Hole".into(),
            location: "Belize".into(),
            date: "Nov 27, 2025".into(),
            rating: 5,
            depth: "42m".into(),
            duration: "38 min".into(),
            visibility: "Excellent (30m+)".into(),
            temp: "28°C".into(),
            buddy: "Malek Chen".into(),
            cosigned: true,
            notes: Some("Incredible visibility. Saw three reef sharks near the stalactites.".into()),
            equipment: Some("5mm Wetsuit, Nitrox 32%".into()),
        },
        DiveLog {
            id: "246".into(),
            site: "Great Blue Hole".into(),
            location: "Belize".into(),
            date: "Nov 27, 2025".into(),
            rating: 5,
            depth: "38m".into(),
            duration: "35 min".into(),
            visibility: "Excellent (30m+)".into(),
            temp: "28°C".into(),
            buddy: "Maria Chen".into(),
            cosigned: true,
            notes: Some("Second dive of the day. Slightly more current than the morning.".into()),
            equipment: Some("5mm Wetsuit, Air".into()),
        },
        DiveLog {
            id: "245".into(),
            site: "SS Thistlegorm - Stern".into(),
            location: "Red Sea, Egypt".into(),
            date: "Oct 15, 2025".into(),
            rating: 5,
            depth: "32m".into(),
            duration: "42 min".into(),
            visibility: "Good (20m)".into(),
            temp: "25°C".into(),
            buddy: "James Wilson".into(),
            cosigned: false,
            notes: Some("Explored the locomotive and the stern guns. Remarkable wreck.".into()),
            equipment: Some("3mm Wetsuit, Nitrox 30%".into()),
        },
    ]
}

pub fn format_log_date(date: NaiveDate) -> String {
    date.format(LOG_DATE_FORMAT).to_string()
}

/// The "log a dive" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiveDraft {
    pub site: String,
    pub location: String,
    pub date: String,
    pub rating: u8,
    pub depth: String,
    pub duration: String,
    pub visibility: String,
    pub temp: String,
    pub buddy: String,
}

impl DiveDraft {
    /// An empty draft dated `date`, rated 5.
    pub fn on(date: NaiveDate) -> Self {
        DiveDraft {
            site: String::new(),
            location: String::new(),
            date: format_log_date(date),
            rating: 5,
            depth: String::new(),
            duration: String::new(),
            visibility: String::new(),
            temp: String::new(),
            buddy: String::new(),
        }
    }

    /// An empty draft dated today (local time).
    pub fn today() -> Self {
        Self::on(Local::now().date_naive())
    }
}

impl Draft for DiveDraft {
    type Record = DiveLog;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("site", &self.site)
            .require("location", &self.location);
        if !(1..=5).contains(&self.rating) {
            errors.reject("rating", "must be between 1 and 5");
        }
        errors.into_result()
    }

    fn into_record(self) -> DiveLog {
        DiveLog {
            id: String::new(),
            site: self.site.trim().to_string(),
            location: self.location.trim().to_string(),
            date: self.date,
            rating: self.rating,
            depth: self.depth,
            duration: self.duration,
            visibility: self.visibility,
            temp: self.temp,
            buddy: self.buddy,
            cosigned: false,
            notes: Some(NEW_DIVE_NOTES.into()),
            equipment: Some(NEW_DIVE_EQUIPMENT.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogbookStats {
    pub total_dives: usize,
    pub logged: usize,
    pub cosigned: usize,
}

/// The logbook page.
pub struct Logbook<S> {
    logs: PersistedCollection<DiveLog, S>,
}

impl<S: KeyValueStore> Logbook<S> {
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let mut logs = PersistedCollection::new(storage)
            .insert_at(InsertAt::Front)
            .with_id_generator(SequentialIds::new(FIRST_LOG_ID));
        let seeded = logs.hydrate(default_logs);
        seed_written(logs.key(), seeded)?;
        Ok(Logbook { logs })
    }

    /// Whether a write, the seed included, is waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.logs.pending().is_some()
    }

    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.logs.retry_pending()
    }

    pub fn entries(&self) -> Result<&[DiveLog], StoreError> {
        self.logs.records()
    }

    pub fn get(&self, id: &str) -> Result<Option<&DiveLog>, StoreError> {
        self.logs.get(id)
    }

    pub fn search(&self, query: &str) -> Result<Vec<&DiveLog>, StoreError> {
        Ok(self.entries()?.iter().filter(|log| log.matches(query)).collect())
    }

    /// Log a dive at the top of the book. Returns its id.
    pub fn log_dive(&mut self, session: &mut FormSession<DiveDraft>) -> Result<String, SubmitError> {
        self.logs.submit(session)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.logs.remove(id)
    }

    pub fn stats(&self) -> Result<LogbookStats, StoreError> {
        let entries = self.entries()?;
        Ok(LogbookStats {
            total_dives: entries.len() + HISTORICAL_DIVES,
            logged: entries.len(),
            cosigned: entries.iter().filter(|log| log.cosigned).count(),
        })
    }
}
