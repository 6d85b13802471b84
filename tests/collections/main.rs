//! Integration tests for persisted collections: hydration, write-through
//! mutators and the collection laws.


use bucceo::certifications::{default_certifications, Certification, Certifications};
use bucceo::contacts::EmergencyContact;
use bucceo::equipment::{default_sections, EquipmentItem, EquipmentLocker, EquipmentSection};
use bucceo::insurance::{InsuranceBook, ACTIVE_KEY, EXPIRED_KEY};
use bucceo::payments::{Card, CardBrand};
use bucceo::{
    CollectionStore, Dashboard, HydrationError, HydrationState, InsertAt, MutationError, PersistedCollection,
    Record, SequentialIds, StoreError,
};
use proptest::prelude::*;
use proptest::test_runner::Config;
use support::SpyStorage;

fn card(id: &str, is_default: bool) -> Card {
    Card {
        id: id.into(),
        brand: CardBrand::Visa,
        last4: "4242".into(),
        name: "Sarah Martinez".into(),
        expiry: "12/26".into(),
        is_default,
        email: None,
    }
}

fn contact(id: &str, name: &str) -> EmergencyContact {
    EmergencyContact {
        id: id.into(),
        name: name.into(),
        relation: "Buddy".into(),
        phone: "+1 (555) 000-0000".into(),
        email: "buddy@example.com".into(),
    }
}

fn equipment_items() -> Vec<EquipmentItem> {
    default_sections()
        .into_iter()
        .flat_map(|section| section.items)
        .collect()
}

fn ready<R: Record>(storage: &SpyStorage, key: &str, seed: Vec<R>) -> PersistedCollection<R, SpyStorage> {
    let mut collection = PersistedCollection::with_key(storage.clone(), key);
    collection.hydrate(|| seed).unwrap();
    collection
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn certifications_append_new_record_at_front() {
    let storage = SpyStorage::new();
    let mut certs = PersistedCollection::<Certification, _>::new(storage.clone())
        .insert_at(InsertAt::Front);
    certs.hydrate(default_certifications).unwrap();
    assert_eq!(certs.key(), "diving_certs_data_v2");

    let id = certs.create(Certification::new("Rescue Diver", "PADI")).unwrap();

    let records = certs.records().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].title, "Rescue Diver");
    assert_eq!(records[0].id, id);
    assert!(records[1..].iter().all(|c| c.id != id));
}

#[test]
fn payment_default_moves_to_selected_card() {
    let storage = SpyStorage::new();
    let mut cards = ready(
        &storage,
        Card::COLLECTION,
        vec![card("card-1", true), card("card-2", false)],
    );

    cards.set_exclusive_flag("card-2", "isDefault").unwrap();

    let records = cards.records().unwrap();
    assert!(!records[0].is_default);
    assert!(records[1].is_default);
}

#[test]
fn equipment_note_edit_changes_only_that_field() {
    let storage = SpyStorage::new();
    let mut items = ready(&storage, "equipment_items", equipment_items());
    let before: Vec<String> = items
        .records()
        .unwrap()
        .iter()
        .map(|item| serde_json::to_string(item).unwrap())
        .collect();
    let writes = storage.set_calls();

    items.update_field("w-1", "note", "New note").unwrap();

    assert_eq!(storage.set_calls(), writes + 1);
    let after = items.records().unwrap();
    assert_eq!(after[0].note, "New note");
    let mut expected = after[0].clone();
    expected.note = equipment_items()[0].note.clone();
    assert_eq!(serde_json::to_string(&expected).unwrap(), before[0]);
    for (item, original) in after.iter().zip(&before).skip(1) {
        assert_eq!(&serde_json::to_string(item).unwrap(), original);
    }

    let stored: Vec<EquipmentItem> =
        serde_json::from_str(&storage.raw("equipment_items").unwrap()).unwrap();
    assert_eq!(stored, after);
}

#[test]
fn equipment_locker_note_edit_rewrites_whole_locker() {
    let storage = SpyStorage::new();
    let mut locker = EquipmentLocker::open(storage.clone()).unwrap();
    let writes = storage.set_calls();

    locker.update_note("w-1", "New note").unwrap();

    assert_eq!(storage.set_calls(), writes + 1);
    let (section, item) = locker.find_item("w-1").unwrap().unwrap();
    assert_eq!(section.title, "Wetsuits & Drysuits");
    assert_eq!(item.note, "New note");
    let stored: Vec<EquipmentSection> =
        serde_json::from_str(&storage.raw(EquipmentSection::COLLECTION).unwrap()).unwrap();
    assert_eq!(stored, locker.sections().unwrap());
}

#[test]
fn removing_missing_id_still_commits_once() {
    let storage = SpyStorage::new();
    let mut contacts = ready(
        &storage,
        EmergencyContact::COLLECTION,
        vec![contact("1", "Ana"), contact("2", "Ben")],
    );
    let before = contacts.records().unwrap().to_vec();
    let writes = storage.set_calls();

    contacts.remove("does-not-exist").unwrap();

    assert_eq!(contacts.records().unwrap(), before.as_slice());
    assert_eq!(storage.set_calls(), writes + 1);
}

#[test]
fn unknown_field_is_rejected_without_writing() {
    let storage = SpyStorage::new();
    let mut items = ready(&storage, "equipment_items", equipment_items());
    let writes = storage.set_calls();

    let err = items.update_field("w-1", "colour", "black").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Mutation(MutationError::UnknownField { .. })
    ));
    assert_eq!(storage.set_calls(), writes);
}

// ============================================================================
// Hydration
// ============================================================================

#[test]
fn stored_data_hydrates_without_writing() {
    let storage = SpyStorage::new();
    let stored = vec![contact("7", "Cleo")];
    storage.seed(
        EmergencyContact::COLLECTION,
        &serde_json::to_string(&stored).unwrap(),
    );

    let contacts = ready(&storage, EmergencyContact::COLLECTION, vec![contact("1", "Ana")]);

    assert_eq!(contacts.records().unwrap(), stored.as_slice());
    assert_eq!(storage.set_calls(), 0);
}

#[test]
fn unparseable_stored_data_falls_back_to_seed() {
    let storage = SpyStorage::new();
    storage.seed(EmergencyContact::COLLECTION, "{not json");

    let contacts = ready(&storage, EmergencyContact::COLLECTION, vec![contact("1", "Ana")]);

    assert_eq!(contacts.records().unwrap().len(), 1);
    assert_eq!(storage.written_keys(), [EmergencyContact::COLLECTION]);
}

#[test]
fn hydration_runs_once() {
    let storage = SpyStorage::new();
    let mut contacts = ready(&storage, EmergencyContact::COLLECTION, vec![contact("1", "Ana")]);

    let err = contacts.hydrate(Vec::new).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Hydration {
            source: HydrationError::AlreadyStarted(HydrationState::Ready),
            ..
        }
    ));
    assert_eq!(contacts.records().unwrap().len(), 1);
}

#[test]
fn nothing_is_written_while_loading() {
    let storage = SpyStorage::new();
    let mut contacts = PersistedCollection::<EmergencyContact, _>::new(storage.clone());
    contacts.begin_hydration().unwrap();
    assert_eq!(contacts.state(), HydrationState::Loading);

    assert!(contacts.create(contact("", "Dee")).is_err());
    assert!(contacts.remove("1").is_err());
    assert!(contacts.update_field("1", "name", "Eve").is_err());
    assert_eq!(storage.set_calls(), 0);

    contacts.finish_hydration(vec![contact("1", "Ana")], false).unwrap();
    assert_eq!(storage.set_calls(), 0);
    assert_eq!(contacts.state(), HydrationState::Ready);
}

// ============================================================================
// Failed writes
// ============================================================================

#[test]
fn failed_write_parks_mutation_until_retry() {
    let storage = SpyStorage::new();
    let mut contacts = ready(&storage, EmergencyContact::COLLECTION, vec![contact("1", "Ana")]);
    storage.fail_writes(true);

    let err = contacts.create(contact("", "Ben")).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(contacts.records().unwrap().len(), 1);
    assert_eq!(contacts.pending().map(<[_]>::len), Some(2));

    storage.fail_writes(false);
    assert!(contacts.retry_pending().unwrap());
    assert_eq!(contacts.records().unwrap().len(), 2);
    assert!(contacts.pending().is_none());

    let reloaded: Vec<EmergencyContact> = CollectionStore::new(storage.clone())
        .load(EmergencyContact::COLLECTION)
        .unwrap();
    assert_eq!(reloaded, contacts.records().unwrap());
}

#[test]
fn discarding_pending_keeps_last_persisted_state() {
    let storage = SpyStorage::new();
    let mut contacts = ready(&storage, EmergencyContact::COLLECTION, vec![contact("1", "Ana")]);
    storage.fail_writes(true);
    assert!(contacts.remove("1").is_err());

    let dropped = contacts.discard_pending().unwrap();
    assert!(dropped.is_empty());
    assert_eq!(contacts.records().unwrap().len(), 1);
    assert!(!contacts.retry_pending().unwrap());
}

#[test]
fn page_opens_with_seed_pending_when_seed_write_fails() {
    let storage = SpyStorage::new();
    storage.fail_writes(true);

    let mut certs = Certifications::open(storage.clone()).unwrap();
    assert_eq!(certs.list().unwrap(), default_certifications().as_slice());
    assert!(certs.has_pending());
    assert!(storage.raw(Certification::COLLECTION).is_none());

    storage.fail_writes(false);
    assert!(certs.retry_pending().unwrap());
    assert!(!certs.has_pending());
    assert!(storage.raw(Certification::COLLECTION).is_some());
}

#[test]
fn insurance_seed_failure_keeps_both_lists_ready() {
    let storage = SpyStorage::new();
    storage.fail_writes(true);

    let mut book = InsuranceBook::open(storage.clone(), 30).unwrap();
    assert_eq!(book.active().unwrap().len(), 2);
    assert_eq!(book.expired().unwrap().len(), 1);
    assert!(book.has_pending());
    assert_eq!(storage.written_keys(), [ACTIVE_KEY, EXPIRED_KEY]);

    storage.fail_writes(false);
    assert!(book.retry_pending().unwrap());
    assert!(!book.has_pending());
    assert!(storage.raw(ACTIVE_KEY).is_some());
    assert!(storage.raw(EXPIRED_KEY).is_some());
}

#[test]
fn dashboard_opens_on_full_storage_and_retries_every_seed() {
    let storage = SpyStorage::new();
    storage.fail_writes(true);

    let mut dashboard = Dashboard::with_storage(storage.clone(), 30).unwrap();
    assert!(dashboard.has_pending());
    assert_eq!(dashboard.logbook.entries().unwrap().len(), 3);

    storage.fail_writes(false);
    assert_eq!(dashboard.retry_pending().unwrap(), 6);
    assert!(!dashboard.has_pending());
    assert_eq!(dashboard.retry_pending().unwrap(), 0);
    for key in [Certification::COLLECTION, Card::COLLECTION, ACTIVE_KEY, EXPIRED_KEY] {
        assert!(storage.raw(key).is_some(), "{} not written", key);
    }
}

// ============================================================================
// Laws
// ============================================================================

fn arb_contact() -> impl Strategy<Value = EmergencyContact> {
    (
        "[0-9]{1,6}",
        "[A-Za-z .]{0,16}",
        "[A-Za-z]{0,10}",
        "[0-9 +()-]{0,14}",
        "[a-z@.]{0,16}",
    )
        .prop_map(|(id, name, relation, phone, email)| EmergencyContact {
            id,
            name,
            relation,
            phone,
            email,
        })
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn save_then_load_round_trips(contacts in prop::collection::vec(arb_contact(), 0..12)) {
        let store = CollectionStore::new(SpyStorage::new());
        store.save(EmergencyContact::COLLECTION, &contacts).unwrap();
        let loaded: Vec<EmergencyContact> = store.load(EmergencyContact::COLLECTION).unwrap();
        prop_assert_eq!(loaded, contacts);
    }

    #[test]
    fn hydrating_twice_yields_identical_collections(contacts in prop::collection::vec(arb_contact(), 0..12)) {
        let storage = SpyStorage::new();
        storage.seed(EmergencyContact::COLLECTION, &serde_json::to_string(&contacts).unwrap());

        let first = ready::<EmergencyContact>(&storage, EmergencyContact::COLLECTION, Vec::new());
        let second = ready::<EmergencyContact>(&storage, EmergencyContact::COLLECTION, Vec::new());
        prop_assert_eq!(first.records().unwrap(), second.records().unwrap());
        prop_assert_eq!(storage.set_calls(), 0);
    }

    #[test]
    fn created_ids_are_distinct(creates in 1usize..40, sequential in any::<bool>()) {
        let storage = SpyStorage::new();
        let mut contacts = PersistedCollection::<EmergencyContact, _>::new(storage.clone());
        if sequential {
            contacts = contacts.with_id_generator(SequentialIds::new(248));
        }
        contacts.hydrate(|| vec![contact("1", "Ana"), contact("2", "Ben")]).unwrap();

        for n in 0..creates {
            contacts.create(contact("", &format!("diver {}", n))).unwrap();
        }

        let mut ids: Vec<&str> = contacts.records().unwrap().iter().map(|c| c.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }

    #[test]
    fn exclusive_flag_has_one_holder(
        defaults in prop::collection::vec(any::<bool>(), 0..8),
        pick in any::<prop::sample::Index>()
    ) {
        let storage = SpyStorage::new();
        let cards: Vec<Card> = defaults
            .iter()
            .enumerate()
            .map(|(i, &is_default)| card(&format!("card-{}", i), is_default))
            .collect();
        let mut wallet = ready(&storage, Card::COLLECTION, cards.clone());

        let target = if cards.is_empty() {
            "card-0".to_string()
        } else {
            cards[pick.index(cards.len())].id.clone()
        };
        wallet.set_exclusive_flag(&target, "isDefault").unwrap();

        let holders: Vec<&Card> = wallet.records().unwrap().iter().filter(|c| c.is_default).collect();
        if cards.is_empty() {
            prop_assert!(holders.is_empty());
        } else {
            prop_assert_eq!(holders.len(), 1);
            prop_assert_eq!(&holders[0].id, &target);
        }
    }

    #[test]
    fn no_write_before_ready(ops in prop::collection::vec(0u8..5, 0..10), begin in any::<bool>()) {
        let storage = SpyStorage::new();
        let mut contacts = PersistedCollection::<EmergencyContact, _>::new(storage.clone());
        if begin {
            contacts.begin_hydration().unwrap();
        }

        for op in ops {
            let result = match op {
                0 => contacts.create(contact("", "Ana")).map(|_| ()),
                1 => contacts.remove("1"),
                2 => contacts.replace("1", contact("1", "Ben")),
                3 => contacts.update_field("1", "name", "Cleo"),
                _ => contacts.retry_pending().map(|_| ()),
            };
            prop_assert!(result.is_err());
        }
        prop_assert_eq!(storage.set_calls(), 0);
    }
}
