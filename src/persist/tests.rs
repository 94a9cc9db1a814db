use serde_json::{json, Value};

use super::{DiscardReason, LoadOutcome, Persisted, MASTER_PROJECTS_KEY, SCHEDULE_KEY};
use crate::domain::{Day, Hour, MasterProject, ScheduledProject, WeeklySchedule};
use crate::migration::{MigrationError, MigrationStep, Migrator, CURRENT_DATA_VERSION};
use crate::store::memory::MemoryStore;
use crate::validate::{validate_master_project_array, validate_weekly_schedule};

fn projects_slot() -> Persisted<Vec<MasterProject>> {
    Persisted::new(MASTER_PROJECTS_KEY, validate_master_project_array)
}

fn schedule_slot() -> Persisted<WeeklySchedule> {
    Persisted::new(SCHEDULE_KEY, validate_weekly_schedule)
}

fn sample_projects() -> Vec<MasterProject> {
    vec![
        MasterProject {
            id: "deep-work-1a2b".into(),
            name: "Deep Work".into(),
            color: "#3B82F6".into(),
        },
        MasterProject {
            id: "learning-9f00".into(),
            name: "Learning".into(),
            color: "#22C55E".into(),
        },
    ]
}

fn fallback() -> Vec<MasterProject> {
    vec![MasterProject {
        id: "fallback".into(),
        name: "Fallback".into(),
        color: "#000".into(),
    }]
}

fn stored_json(store: &MemoryStore, key: &str) -> Value {
    serde_json::from_str(&store.raw(key).expect("key should be stored")).expect("stored json")
}

#[test]
fn missing_key_yields_default() {
    let store = MemoryStore::new();
    let (value, outcome) = projects_slot().load_with_outcome(&store, fallback());
    assert_eq!(value, fallback());
    assert_eq!(outcome, LoadOutcome::Absent);
}

#[test]
fn save_wraps_value_in_current_envelope_and_loads_back() {
    let store = MemoryStore::new();
    let slot = projects_slot();
    slot.save(&store, &sample_projects());

    let stored = stored_json(&store, MASTER_PROJECTS_KEY);
    assert_eq!(stored["version"], json!(CURRENT_DATA_VERSION));
    assert_eq!(stored["data"][0]["name"], "Deep Work");

    let (loaded, outcome) = slot.load_with_outcome(&store, Vec::new());
    assert_eq!(loaded, sample_projects());
    assert_eq!(outcome, LoadOutcome::Loaded);
}

#[test]
fn schedule_round_trips_through_the_store() {
    let store = MemoryStore::new();
    let slot = schedule_slot();
    let mut week = WeeklySchedule::new();
    week.upsert_entry(
        Day::Wednesday,
        Hour::new(14).expect("hour"),
        ScheduledProject::from_master(&sample_projects()[1], "occ-1".into(), 0.7),
    );
    slot.save(&store, &week);

    let stored = stored_json(&store, SCHEDULE_KEY);
    assert_eq!(stored["data"]["Wednesday"]["14"][0]["masterId"], "learning-9f00");
    assert_eq!(slot.load(&store, WeeklySchedule::new()), week);
}

#[test]
fn saving_empty_values_removes_the_key() {
    let store = MemoryStore::new();
    let slot = projects_slot();
    slot.save(&store, &sample_projects());
    assert!(store.contains(MASTER_PROJECTS_KEY));

    slot.save(&store, &Vec::new());
    assert!(!store.contains(MASTER_PROJECTS_KEY));

    let schedule = schedule_slot();
    store.insert_raw(SCHEDULE_KEY, "{\"version\":1,\"data\":{}}");
    schedule.save(&store, &WeeklySchedule::new());
    assert!(!store.contains(SCHEDULE_KEY));
}

#[test]
fn legacy_bare_value_is_accepted_as_version_zero() {
    let legacy = serde_json::to_string(&sample_projects()).expect("serialize");
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &legacy);
    let slot = projects_slot();

    let (loaded, outcome) = slot.load_with_outcome(&store, Vec::new());
    assert_eq!(loaded, sample_projects());
    assert_eq!(outcome, LoadOutcome::Migrated { from_version: 0 });

    slot.save(&store, &loaded);
    assert_eq!(
        stored_json(&store, MASTER_PROJECTS_KEY)["version"],
        json!(CURRENT_DATA_VERSION)
    );
}

#[test]
fn legacy_bare_schedule_object_is_accepted() {
    let raw = r##"{"Monday":{"9":[{"id":"a","masterId":"p","name":"P","color":"#fff","probability":1.0}]}}"##;
    let store = MemoryStore::with_entry(SCHEDULE_KEY, raw);
    let loaded = schedule_slot().load(&store, WeeklySchedule::new());
    assert_eq!(loaded.slot(Day::Monday, Hour::new(9).expect("hour")).len(), 1);
}

#[test]
fn padded_hour_key_fails_validation_instead_of_decoding() {
    let raw = r##"{"version":1,"data":{"Monday":{"09":[{"id":"a","masterId":"p","name":"P","color":"#fff","probability":0.5}]}}}"##;
    let store = MemoryStore::with_entry(SCHEDULE_KEY, raw);
    let (week, outcome) = schedule_slot().load_with_outcome(&store, WeeklySchedule::new());
    assert!(week.is_empty());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::Invalid(_))
    ));
}

#[test]
fn newer_version_is_discarded_and_wiped() {
    let raw = json!({"version": CURRENT_DATA_VERSION + 1, "data": sample_projects()}).to_string();
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);

    let (value, outcome) = projects_slot().load_with_outcome(&store, fallback());
    assert_eq!(value, fallback());
    assert_eq!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::VersionTooNew {
            stored: CURRENT_DATA_VERSION + 1,
            current: CURRENT_DATA_VERSION,
        })
    );
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}

#[test]
fn invalid_data_is_discarded_and_wiped() {
    let raw = json!({"version": 1, "data": [{"id": "p1", "name": "No color"}]}).to_string();
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);

    let (value, outcome) = projects_slot().load_with_outcome(&store, fallback());
    assert_eq!(value, fallback());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::Invalid(_))
    ));
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}

#[test]
fn unparsable_json_is_discarded_and_wiped() {
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, "{not json");
    let (value, outcome) = projects_slot().load_with_outcome(&store, Vec::new());
    assert!(value.is_empty());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::Unparsable(_))
    ));
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}

#[test]
fn negative_or_fractional_versions_are_rejected() {
    for version in [json!(-1), json!(1.5)] {
        let raw = json!({"version": version, "data": sample_projects()}).to_string();
        let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);
        let (_, outcome) = projects_slot().load_with_outcome(&store, Vec::new());
        assert_eq!(outcome, LoadOutcome::Discarded(DiscardReason::BadVersion));
        assert!(!store.contains(MASTER_PROJECTS_KEY));
    }
}

#[test]
fn versioned_envelope_without_data_fails_validation() {
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, "{\"version\":1}");
    let (_, outcome) = projects_slot().load_with_outcome(&store, Vec::new());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::Invalid(_))
    ));
}

#[test]
fn read_failure_falls_back_to_default() {
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, "[]");
    store.fail_reads(true);
    let (value, outcome) = projects_slot().load_with_outcome(&store, fallback());
    assert_eq!(value, fallback());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::ReadFailed(_))
    ));
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}

#[test]
fn write_failure_is_contained() {
    let store = MemoryStore::new();
    store.fail_writes(true);
    projects_slot().save(&store, &sample_projects());
    projects_slot().save(&store, &Vec::new());
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}

fn rename_colour(mut data: Value) -> Result<Value, MigrationError> {
    if let Some(items) = data.as_array_mut() {
        for item in items {
            if let Some(object) = item.as_object_mut() {
                if let Some(colour) = object.remove("colour") {
                    object.insert("color".to_string(), colour);
                }
            }
        }
    }
    Ok(data)
}

fn reject_everything(_: Value) -> Result<Value, MigrationError> {
    Err(MigrationError {
        step: "reject_everything",
        reason: "boom".to_string(),
    })
}

static RENAME_STEPS: [MigrationStep; 1] = [MigrationStep {
    from_version: 1,
    name: "rename_colour",
    apply: rename_colour,
}];

static FAILING_STEPS: [MigrationStep; 1] = [MigrationStep {
    from_version: 1,
    name: "reject_everything",
    apply: reject_everything,
}];

#[test]
fn registered_migration_reshapes_old_data_before_validation() {
    let raw = json!({"version": 1, "data": [{"id": "p1", "name": "Old", "colour": "#abc"}]})
        .to_string();
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);
    let slot = projects_slot().with_migrator(Migrator::new(2, &RENAME_STEPS));

    let (loaded, outcome) = slot.load_with_outcome(&store, Vec::new());
    assert_eq!(outcome, LoadOutcome::Migrated { from_version: 1 });
    assert_eq!(loaded[0].color, "#abc");

    slot.save(&store, &loaded);
    assert_eq!(stored_json(&store, MASTER_PROJECTS_KEY)["version"], json!(2));
}

#[test]
fn failed_migration_still_loads_when_last_good_state_validates() {
    let raw = json!({"version": 1, "data": sample_projects()}).to_string();
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);
    let slot = projects_slot().with_migrator(Migrator::new(2, &FAILING_STEPS));

    let (loaded, outcome) = slot.load_with_outcome(&store, Vec::new());
    assert_eq!(loaded, sample_projects());
    assert_eq!(outcome, LoadOutcome::Migrated { from_version: 1 });
}

#[test]
fn failed_migration_with_invalid_state_falls_back() {
    let raw = json!({"version": 1, "data": [{"id": "p1", "name": "Old", "colour": "#abc"}]})
        .to_string();
    let store = MemoryStore::with_entry(MASTER_PROJECTS_KEY, &raw);
    let slot = projects_slot().with_migrator(Migrator::new(2, &FAILING_STEPS));

    let (loaded, outcome) = slot.load_with_outcome(&store, fallback());
    assert_eq!(loaded, fallback());
    assert!(matches!(
        outcome,
        LoadOutcome::Discarded(DiscardReason::Invalid(_))
    ));
    assert!(!store.contains(MASTER_PROJECTS_KEY));
}
