//! Integration tests for the dashboard pages.

use bucceo::certifications::{CertificationDraft, Certifications};
use bucceo::contacts::{ContactDraft, EmergencyContacts};
use bucceo::equipment::{EquipmentItemDraft, EquipmentLocker};
use bucceo::insurance::{
    default_active_policies, default_expired_policies, InsuranceBook, Policy, PolicyDraft,
    PolicyStatus, ACTIVE_KEY, EXPIRED_KEY,
};
use bucceo::logbook::{DiveDraft, Logbook};
use bucceo::payments::{CardBrand, CardDraft, Wallet};
use bucceo::settings::{AccountSettings, LogbookVisibility, ProfileVisibility, SettingsFlag};
use bucceo::{
    Dashboard, EditorMode, FieldErrorKind, FormSession, InMemoryStorage, KeyValueStore,
    SubmitError,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Certifications
// ============================================================================

#[test]
fn invalid_certification_form_stays_open_for_correction() {
    let storage = InMemoryStorage::new();
    let mut certs = Certifications::open(storage.clone()).unwrap();
    let stored_before = storage.get("diving_certs_data_v2").unwrap();

    let mut session = FormSession::create(CertificationDraft {
        title: "Nitrox Diver".into(),
        ..Default::default()
    });
    let err = certs.submit(&mut session).unwrap_err();
    let SubmitError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.for_field("agency").unwrap().kind, FieldErrorKind::Required);
    assert_eq!(session.errors().len(), 2);
    assert_eq!(storage.get("diving_certs_data_v2").unwrap(), stored_before);

    session.draft_mut().agency = "SSI".into();
    session.draft_mut().date = "June 1, 2026".into();
    let id = certs.submit(&mut session).unwrap();

    let newest = &certs.list().unwrap()[0];
    assert_eq!(newest.id, id);
    assert_eq!(newest.number, "N/A");
    assert!(session.errors().is_empty());
}

// ============================================================================
// Equipment
// ============================================================================

#[test]
fn equipment_items_are_added_edited_and_removed() {
    let mut locker = EquipmentLocker::open(InMemoryStorage::new()).unwrap();

    let mut session = FormSession::create(EquipmentItemDraft {
        name: "Reef Hook".into(),
        ..Default::default()
    });
    let id = locker.submit("Accessories", &mut session).unwrap();
    let (section, item) = locker.find_item(&id).unwrap().unwrap();
    assert_eq!(section.title, "Accessories");
    assert_eq!(section.items.last().unwrap().id, id);
    assert_eq!(item.name, "Reef Hook");

    let (_, fins) = locker.find_item("f-1").unwrap().unwrap();
    let mut edit = FormSession::<EquipmentItemDraft>::edit(fins);
    assert_eq!(edit.mode(), &EditorMode::Edit { id: "f-1".into() });
    edit.draft_mut().size = "XL".into();
    locker.submit("Fins", &mut edit).unwrap();
    let (_, fins) = locker.find_item("f-1").unwrap().unwrap();
    assert_eq!(fins.size, "XL");
    assert_eq!(fins.name, "Split Fins");

    locker.remove_item(&id).unwrap();
    assert!(locker.find_item(&id).unwrap().is_none());
}

#[test]
fn equipment_item_added_to_unknown_section_creates_it() {
    let mut locker = EquipmentLocker::open(InMemoryStorage::new()).unwrap();
    let before = locker.sections().unwrap().len();

    let mut session = FormSession::create(EquipmentItemDraft {
        name: "Drysuit Undergarment".into(),
        ..Default::default()
    });
    locker.submit("Thermal Layers", &mut session).unwrap();

    let sections = locker.sections().unwrap();
    assert_eq!(sections.len(), before + 1);
    assert_eq!(sections.last().unwrap().title, "Thermal Layers");
    assert_eq!(sections.last().unwrap().count_label(), "1 item");
}

// ============================================================================
// Insurance
// ============================================================================

#[test]
fn insurance_reseeds_both_lists_when_one_key_is_missing() {
    let storage = InMemoryStorage::new();
    storage.set(ACTIVE_KEY, "[]").unwrap();

    let book = InsuranceBook::open(storage.clone(), 30).unwrap();

    assert_eq!(book.active().unwrap().len(), 2);
    assert_eq!(book.expired().unwrap().len(), 1);
    assert!(storage.get(EXPIRED_KEY).unwrap().is_some());
}

#[test]
fn insurance_uses_stored_lists_when_both_exist() {
    let storage = InMemoryStorage::new();
    storage.set(ACTIVE_KEY, "[]").unwrap();
    storage.set(EXPIRED_KEY, "[]").unwrap();

    let book = InsuranceBook::open(storage, 30).unwrap();

    assert!(book.active().unwrap().is_empty());
    assert!(book.expired().unwrap().is_empty());
}

#[test]
fn policy_edit_is_saved_and_status_rederived() {
    let mut book = InsuranceBook::open(InMemoryStorage::new(), 30).unwrap();
    let travel = book.find("2").unwrap().unwrap().clone();
    assert_eq!(book.status_of(&travel, date(2025, 3, 15)), Some(PolicyStatus::ExpiringSoon));

    let mut session = FormSession::<PolicyDraft>::edit(&travel);
    session.draft_mut().valid_until = "March 31, 2026".into();
    book.submit(&mut session).unwrap();

    let renewed = book.find("2").unwrap().unwrap();
    assert_eq!(renewed.valid_until, "March 31, 2026");
    assert_eq!(book.status_of(renewed, date(2025, 3, 15)), Some(PolicyStatus::Active));
    assert_eq!(book.expired().unwrap().len(), 1);
}

#[test]
fn archive_moves_lapsed_policies_to_front_of_expired() {
    let storage = InMemoryStorage::new();
    let mut book = InsuranceBook::open(storage.clone(), 30).unwrap();

    assert_eq!(book.archive_expired(date(2025, 6, 1)).unwrap(), 1);

    let active: Vec<&str> = book.active().unwrap().iter().map(|p| p.id.as_str()).collect();
    let expired: Vec<&str> = book.expired().unwrap().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(active, ["1"]);
    assert_eq!(expired, ["2", "3"]);

    let reopened = InsuranceBook::open(storage, 30).unwrap();
    assert_eq!(reopened.expired().unwrap().len(), 2);
    assert_eq!(book.archive_expired(date(2025, 6, 1)).unwrap(), 0);
}

fn lapsed_policy(id: &str, provider: &str, valid_until: &str) -> Policy {
    let mut policy = default_active_policies()[1].clone();
    policy.id = id.into();
    policy.provider = provider.into();
    policy.valid_until = valid_until.into();
    policy
}

fn store_policies(storage: &InMemoryStorage, key: &str, policies: &[Policy]) {
    storage
        .set(key, &serde_json::to_string(policies).unwrap())
        .unwrap();
}

#[test]
fn archive_keeps_both_policies_when_ids_collide() {
    let storage = InMemoryStorage::new();
    store_policies(
        &storage,
        ACTIVE_KEY,
        &[lapsed_policy("3", "Lapsed Travel Cover", "March 31, 2025")],
    );
    store_policies(&storage, EXPIRED_KEY, &default_expired_policies());
    let old_provider = default_expired_policies()[0].provider.clone();

    let mut book = InsuranceBook::open(storage.clone(), 30).unwrap();
    assert_eq!(book.archive_expired(date(2025, 6, 1)).unwrap(), 1);

    assert!(book.active().unwrap().is_empty());
    let expired = book.expired().unwrap();
    assert_eq!(expired.len(), 2);
    assert_eq!(expired[0].provider, "Lapsed Travel Cover");
    assert_ne!(expired[0].id, "3");
    assert_eq!(expired[1].id, "3");
    assert_eq!(expired[1].provider, old_provider);

    let reopened = InsuranceBook::open(storage, 30).unwrap();
    let providers: Vec<&str> =
        reopened.expired().unwrap().iter().map(|p| p.provider.as_str()).collect();
    assert_eq!(providers, ["Lapsed Travel Cover", old_provider.as_str()]);
}

#[test]
fn archive_keeps_lapsed_policies_in_their_active_order() {
    let storage = InMemoryStorage::new();
    store_policies(
        &storage,
        ACTIVE_KEY,
        &[
            lapsed_policy("2", "World Nomads", "March 31, 2025"),
            lapsed_policy("5", "DiveAssure", "March 31, 2027"),
            lapsed_policy("9", "Divers Shield", "April 30, 2025"),
        ],
    );
    store_policies(&storage, EXPIRED_KEY, &default_expired_policies());

    let mut book = InsuranceBook::open(storage, 30).unwrap();
    assert_eq!(book.archive_expired(date(2025, 6, 1)).unwrap(), 2);

    let active: Vec<&str> = book.active().unwrap().iter().map(|p| p.id.as_str()).collect();
    let expired: Vec<&str> = book.expired().unwrap().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(active, ["5"]);
    assert_eq!(expired, ["2", "9", "3"]);
}

#[test]
fn stored_status_fields_do_not_survive_a_save() {
    let storage = InMemoryStorage::new();
    let mut legacy = serde_json::to_value(default_active_policies()).unwrap();
    for policy in legacy.as_array_mut().unwrap() {
        policy["status"] = "Active".into();
        policy["statusColor"] = "bg-green-50 text-green-700".into();
    }
    storage.set(ACTIVE_KEY, &legacy.to_string()).unwrap();
    storage.set(EXPIRED_KEY, "[]").unwrap();

    let mut book = InsuranceBook::open(storage.clone(), 30).unwrap();
    let policy = book.find("1").unwrap().unwrap().clone();
    book.save_policy("1", policy).unwrap();

    let stored = storage.get(ACTIVE_KEY).unwrap().unwrap();
    assert!(!stored.contains("statusColor"));
    assert!(!stored.contains("\"status\""));
}

// ============================================================================
// Payments
// ============================================================================

#[test]
fn first_card_in_empty_wallet_becomes_default() {
    let storage = InMemoryStorage::new();
    storage.set("user_payment_methods_v2", "[]").unwrap();
    let mut wallet = Wallet::open(storage).unwrap();

    let mut draft = CardDraft {
        holder: "Sarah Martinez".into(),
        cvv: "999".into(),
        ..Default::default()
    };
    draft.set_number("5500 0000 0000 0004");
    draft.set_expiry("1129");
    let first = wallet.submit(&mut FormSession::create(draft.clone())).unwrap();
    let second = wallet.submit(&mut FormSession::create(draft)).unwrap();

    let cards = wallet.cards().unwrap();
    assert_eq!(cards[0].id, first);
    assert!(cards[0].is_default);
    assert_eq!(cards[0].brand, CardBrand::Mastercard);
    assert_eq!(cards[0].expiry, "11/29");
    assert_eq!(cards[1].id, second);
    assert!(!cards[1].is_default);
}

#[test]
fn default_card_can_move_and_disappear() {
    let mut wallet = Wallet::open(InMemoryStorage::new()).unwrap();
    assert_eq!(wallet.default_card().unwrap().unwrap().id, "1");

    wallet.set_default("2").unwrap();
    assert_eq!(wallet.default_card().unwrap().unwrap().id, "2");

    wallet.set_default("missing").unwrap();
    assert_eq!(wallet.default_card().unwrap().unwrap().id, "2");

    wallet.remove("2").unwrap();
    assert!(wallet.default_card().unwrap().is_none());
}

// ============================================================================
// Contacts
// ============================================================================

#[test]
fn contact_edit_replaces_in_place() {
    let mut contacts = EmergencyContacts::open(InMemoryStorage::new()).unwrap();
    let spouse = contacts.get("1").unwrap().unwrap().clone();

    let mut session = FormSession::<ContactDraft>::edit(&spouse);
    session.draft_mut().phone = "+1 (555) 111-2222".into();
    assert_eq!(contacts.submit(&mut session).unwrap(), "1");

    let list = contacts.list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].phone, "+1 (555) 111-2222");
    assert_eq!(list[0].name, "Michael Martinez");
}

#[test]
fn cancelled_contact_form_writes_nothing() {
    let storage = InMemoryStorage::new();
    let contacts = EmergencyContacts::open(storage.clone()).unwrap();
    let before = storage.get("user_emergency_contacts_v1").unwrap();

    let mut session = FormSession::create(ContactDraft::default());
    session.draft_mut().name = "Half typed".into();
    session.cancel();

    assert_eq!(storage.get("user_emergency_contacts_v1").unwrap(), before);
    assert_eq!(contacts.list().unwrap().len(), 2);
}

// ============================================================================
// Logbook
// ============================================================================

#[test]
fn logged_dives_count_up_from_newest() {
    let mut logbook = Logbook::open(InMemoryStorage::new()).unwrap();

    let mut draft = DiveDraft::on(date(2026, 1, 9));
    draft.site = "Manta Point".into();
    draft.location = "Nusa Penida".into();
    draft.rating = 4;
    let id = logbook.log_dive(&mut FormSession::create(draft)).unwrap();

    assert_eq!(id, "248");
    let newest = &logbook.entries().unwrap()[0];
    assert_eq!(newest.date, "Jan 9, 2026");
    assert_eq!(logbook.stats().unwrap().total_dives, 248);

    logbook.delete("248").unwrap();
    assert_eq!(logbook.stats().unwrap().total_dives, 247);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_survive_reopen() {
    let storage = InMemoryStorage::new();
    let mut settings = AccountSettings::open(storage.clone());
    assert!(settings.is_enabled(SettingsFlag::TwoFactor));

    assert!(!settings.toggle(SettingsFlag::TwoFactor).unwrap());
    settings.set_preference(ProfileVisibility::Private).unwrap();

    let reopened = AccountSettings::open(storage);
    assert!(!reopened.is_enabled(SettingsFlag::TwoFactor));
    assert!(reopened.is_enabled(SettingsFlag::PushCosign));
    assert_eq!(reopened.preference::<ProfileVisibility>(), ProfileVisibility::Private);
    assert_eq!(
        reopened.preference::<LogbookVisibility>(),
        LogbookVisibility::DiveBuddiesOnly
    );
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let storage = InMemoryStorage::new();
    storage.set("bucceo_settings", "{\"twoFactor\":").unwrap();
    let settings = AccountSettings::open(storage);
    assert!(settings.is_enabled(SettingsFlag::TwoFactor));
    assert!(!settings.is_enabled(SettingsFlag::EmailSpecial));
}

// ============================================================================
// Dashboard
// ============================================================================

#[test]
fn dashboard_pages_share_one_backend() {
    let storage = InMemoryStorage::new();
    {
        let mut dashboard = Dashboard::with_storage(storage.clone(), 30).unwrap();
        dashboard.payments.set_default("2").unwrap();
        dashboard.certifications.delete("1").unwrap();
        dashboard.settings.toggle(SettingsFlag::EmailSpecial).unwrap();
    }

    let dashboard = Dashboard::with_storage(storage, 30).unwrap();
    assert_eq!(dashboard.payments.default_card().unwrap().unwrap().id, "2");
    assert_eq!(dashboard.certifications.list().unwrap().len(), 2);
    assert!(dashboard.settings.is_enabled(SettingsFlag::EmailSpecial));
}
