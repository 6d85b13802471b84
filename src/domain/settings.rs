//! Account settings: notification/privacy toggles and dropdown preferences.
//!
//! Toggles are stored together as one JSON object. Each dropdown preference is
//! stored on its own key as its plain display string.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collection::CollectionStore;
use crate::error::StoreError;
use crate::storage::KeyValueStore;

pub const FLAGS_KEY: &str = "bucceo_settings";

/// One on/off setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingsFlag {
    TwoFactor,
    LoginNotifications,
    ShowOnFeeds,
    ShareEquipment,
    EmailBooking,
    EmailBuddy,
    EmailInsurance,
    EmailSpecial,
    PushUpcoming,
    PushCosign,
    PushMessages,
}

impl SettingsFlag {
    pub const ALL: [SettingsFlag; 11] = [
        SettingsFlag::TwoFactor,
        SettingsFlag::LoginNotifications,
        SettingsFlag::ShowOnFeeds,
        SettingsFlag::ShareEquipment,
        SettingsFlag::EmailBooking,
        SettingsFlag::EmailBuddy,
        SettingsFlag::EmailInsurance,
        SettingsFlag::EmailSpecial,
        SettingsFlag::PushUpcoming,
        SettingsFlag::PushCosign,
        SettingsFlag::PushMessages,
    ];

    /// The key this flag is stored under.
    pub fn key(self) -> &'static str {
        match self {
            SettingsFlag::TwoFactor => "twoFactor",
            SettingsFlag::LoginNotifications => "loginNotifications",
            SettingsFlag::ShowOnFeeds => "showOnFeeds",
            SettingsFlag::ShareEquipment => "shareEquipment",
            SettingsFlag::EmailBooking => "emailBooking",
            SettingsFlag::EmailBuddy => "emailBuddy",
            SettingsFlag::EmailInsurance => "emailInsurance",
            SettingsFlag::EmailSpecial => "emailSpecial",
            SettingsFlag::PushUpcoming => "pushUpcoming",
            SettingsFlag::PushCosign => "pushCosign",
            SettingsFlag::PushMessages => "pushMessages",
        }
    }
}

impl fmt::Display for SettingsFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every toggle on the settings page. Missing keys take their default and
/// unknown keys are dropped when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsFlags {
    pub two_factor: bool,
    pub login_notifications: bool,
    pub show_on_feeds: bool,
    pub share_equipment: bool,
    pub email_booking: bool,
    pub email_buddy: bool,
    pub email_insurance: bool,
    pub email_special: bool,
    pub push_upcoming: bool,
    pub push_cosign: bool,
    pub push_messages: bool,
}

impl Default for SettingsFlags {
    fn default() -> Self {
        SettingsFlags {
            two_factor: true,
            login_notifications: true,
            show_on_feeds: true,
            share_equipment: true,
            email_booking: true,
            email_buddy: true,
            email_insurance: true,
            email_special: false,
            push_upcoming: true,
            push_cosign: true,
            push_messages: true,
        }
    }
}

impl SettingsFlags {
    pub fn get(&self, flag: SettingsFlag) -> bool {
        match flag {
            SettingsFlag::TwoFactor => self.two_factor,
            SettingsFlag::LoginNotifications => self.login_notifications,
            SettingsFlag::ShowOnFeeds => self.show_on_feeds,
            SettingsFlag::ShareEquipment => self.share_equipment,
            SettingsFlag::EmailBooking => self.email_booking,
            SettingsFlag::EmailBuddy => self.email_buddy,
            SettingsFlag::EmailInsurance => self.email_insurance,
            SettingsFlag::EmailSpecial => self.email_special,
            SettingsFlag::PushUpcoming => self.push_upcoming,
            SettingsFlag::PushCosign => self.push_cosign,
            SettingsFlag::PushMessages => self.push_messages,
        }
    }

    pub fn set(&mut self, flag: SettingsFlag, value: bool) {
        let slot = match flag {
            SettingsFlag::TwoFactor => &mut self.two_factor,
            SettingsFlag::LoginNotifications => &mut self.login_notifications,
            SettingsFlag::ShowOnFeeds => &mut self.show_on_feeds,
            SettingsFlag::ShareEquipment => &mut self.share_equipment,
            SettingsFlag::EmailBooking => &mut self.email_booking,
            SettingsFlag::EmailBuddy => &mut self.email_buddy,
            SettingsFlag::EmailInsurance => &mut self.email_insurance,
            SettingsFlag::EmailSpecial => &mut self.email_special,
            SettingsFlag::PushUpcoming => &mut self.push_upcoming,
            SettingsFlag::PushCosign => &mut self.push_cosign,
            SettingsFlag::PushMessages => &mut self.push_messages,
        };
        *slot = value;
    }
}

/// A dropdown setting persisted under its own key as its display label.
pub trait Preference: Copy + Eq + fmt::Debug + 'static {
    const KEY: &'static str;
    const OPTIONS: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        Self::OPTIONS
            .iter()
            .copied()
            .find(|option| option.label() == label)
    }

    fn read(preferences: &Preferences) -> Self;
    fn write(self, preferences: &mut Preferences);
}

macro_rules! preference {
    (
        $(#[$meta:meta])*
        $name:ident, key = $key:literal, field = $field:ident,
        default = $default:ident,
        { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Preference for $name {
            const KEY: &'static str = $key;
            const OPTIONS: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            fn read(preferences: &Preferences) -> Self {
                preferences.$field
            }

            fn write(self, preferences: &mut Preferences) {
                preferences.$field = self;
            }
        }
    };
}

preference!(
    /// Who can see the profile.
    ProfileVisibility, key = "bucceo_profile_vis", field = profile_visibility,
    default = Everyone,
    { Everyone => "Everyone", FriendsOnly => "Friends Only", Private => "Private" }
);

preference!(
    /// Who can see the logbook.
    LogbookVisibility, key = "bucceo_logbook_vis", field = logbook_visibility,
    default = DiveBuddiesOnly,
    { DiveBuddiesOnly => "Dive buddies only", Everyone => "Everyone", Private => "Private" }
);

preference!(
    Language, key = "bucceo_lang", field = language,
    default = English,
    { English => "English", Spanish => "Spanish", French => "French" }
);

preference!(
    Units, key = "bucceo_units", field = units,
    default = Metric,
    { Metric => "Metric", Imperial => "Imperial" }
);

/// Current value of every dropdown preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub profile_visibility: ProfileVisibility,
    pub logbook_visibility: LogbookVisibility,
    pub language: Language,
    pub units: Units,
}

/// The settings page.
pub struct AccountSettings<S> {
    store: CollectionStore<S>,
    flags: SettingsFlags,
    preferences: Preferences,
}

impl<S: KeyValueStore> AccountSettings<S> {
    /// Read stored settings. Anything missing or unreadable takes its default;
    /// nothing is written until a setting changes.
    pub fn open(storage: S) -> Self {
        let store = CollectionStore::new(storage);
        let flags = store.load_json(FLAGS_KEY).unwrap_or_default();
        let preferences = Preferences {
            profile_visibility: load_preference(&store),
            logbook_visibility: load_preference(&store),
            language: load_preference(&store),
            units: load_preference(&store),
        };
        AccountSettings {
            store,
            flags,
            preferences,
        }
    }

    pub fn flags(&self) -> &SettingsFlags {
        &self.flags
    }

    pub fn is_enabled(&self, flag: SettingsFlag) -> bool {
        self.flags.get(flag)
    }

    /// Flip `flag` and persist every toggle. Returns the new value.
    pub fn toggle(&mut self, flag: SettingsFlag) -> Result<bool, StoreError> {
        let value = !self.flags.get(flag);
        self.set_flag(flag, value)?;
        Ok(value)
    }

    pub fn set_flag(&mut self, flag: SettingsFlag, value: bool) -> Result<(), StoreError> {
        let mut next = self.flags;
        next.set(flag, value);
        self.store.save_json(FLAGS_KEY, &next)?;
        self.flags = next;
        Ok(())
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preference<P: Preference>(&self) -> P {
        P::read(&self.preferences)
    }

    pub fn set_preference<P: Preference>(&mut self, value: P) -> Result<(), StoreError> {
        self.store.save_value(P::KEY, value.label())?;
        value.write(&mut self.preferences);
        Ok(())
    }
}

fn load_preference<P: Preference + Default, S: KeyValueStore>(store: &CollectionStore<S>) -> P {
    let Some(label) = store.load_value(P::KEY) else {
        return P::default();
    };
    P::from_label(&label).unwrap_or_else(|| {
        warn!(key = P::KEY, value = %label, "unknown preference value, using default");
        P::default()
    })
}
