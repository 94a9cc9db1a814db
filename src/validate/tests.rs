use serde_json::json;

use super::{
    validate_day_template, validate_day_template_array, validate_master_project,
    validate_master_project_array, validate_scheduled_project, validate_weekly_schedule,
};

fn scheduled(probability: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "occ-1",
        "masterId": "deep-work-1a2b",
        "name": "Deep Work",
        "color": "#3B82F6",
        "probability": probability,
    })
}

#[test]
fn accepts_well_formed_master_projects() {
    let value = json!([
        {"id": "p1", "name": "Deep Work", "color": "#3B82F6"},
        {"id": "p2", "name": "Learning", "color": "#22C55E"},
    ]);
    assert!(validate_master_project_array(&value).is_ok());
}

#[test]
fn rejects_master_project_with_missing_or_empty_fields() {
    let missing_color = json!({"id": "p1", "name": "Deep Work"});
    let err = validate_master_project(&missing_color).expect_err("color is required");
    assert_eq!(err.path, "$.color");

    let empty_name = json!({"id": "p1", "name": "  ", "color": "#fff"});
    assert!(validate_master_project(&empty_name).is_err());

    let wrong_type = json!({"id": 7, "name": "Deep Work", "color": "#fff"});
    assert!(validate_master_project(&wrong_type).is_err());
}

#[test]
fn array_error_reports_offending_index() {
    let value = json!([
        {"id": "p1", "name": "Deep Work", "color": "#3B82F6"},
        {"id": "p2", "name": "Learning"},
    ]);
    let err = validate_master_project_array(&value).expect_err("second entry is broken");
    assert_eq!(err.path, "$[1].color");
    assert!(validate_master_project_array(&json!({"not": "an array"})).is_err());
}

#[test]
fn scheduled_project_probability_must_be_a_fraction() {
    assert!(validate_scheduled_project(&scheduled(json!(0.5))).is_ok());
    assert!(validate_scheduled_project(&scheduled(json!(1.0005))).is_ok());
    assert!(validate_scheduled_project(&scheduled(json!(0))).is_ok());
    assert!(validate_scheduled_project(&scheduled(json!(45))).is_err());
    assert!(validate_scheduled_project(&scheduled(json!(-0.1))).is_err());
    assert!(validate_scheduled_project(&scheduled(json!("0.5"))).is_err());
}

#[test]
fn scheduled_project_requires_master_reference() {
    let mut value = scheduled(json!(0.5));
    value
        .as_object_mut()
        .expect("object")
        .remove("masterId");
    let err = validate_scheduled_project(&value).expect_err("masterId is required");
    assert_eq!(err.path, "$.masterId");
}

#[test]
fn weekly_schedule_restricts_day_and_hour_keys() {
    let valid = json!({"Monday": {"9": [scheduled(json!(0.3))], "23": []}});
    assert!(validate_weekly_schedule(&valid).is_ok());
    assert!(validate_weekly_schedule(&json!({})).is_ok());

    let bad_day = json!({"Funday": {"9": [scheduled(json!(0.3))]}});
    let err = validate_weekly_schedule(&bad_day).expect_err("unknown day");
    assert_eq!(err.path, "$.Funday");

    for bad_hour in ["24", "-1", "9.5", "nine", "009", "09", "00", ""] {
        let value = json!({"Monday": {bad_hour: [scheduled(json!(0.3))]}});
        assert!(
            validate_weekly_schedule(&value).is_err(),
            "hour key {bad_hour:?} should be rejected"
        );
    }

    let not_a_list = json!({"Monday": {"9": scheduled(json!(0.3))}});
    assert!(validate_weekly_schedule(&not_a_list).is_err());
    assert!(validate_weekly_schedule(&json!([])).is_err());
}

#[test]
fn nested_entry_errors_are_located() {
    let value = json!({"Tuesday": {"14": [scheduled(json!(0.3)), {"id": "x"}]}});
    let err = validate_weekly_schedule(&value).expect_err("second entry is broken");
    assert_eq!(err.path, "$.Tuesday.14[1].masterId");
}

#[test]
fn day_template_validation_covers_schedule() {
    let valid = json!({
        "id": "T-1",
        "name": "Workday",
        "schedule": {"9": [scheduled(json!(1.0))]},
    });
    assert!(validate_day_template(&valid).is_ok());
    assert!(validate_day_template_array(&json!([valid])).is_ok());

    let missing_schedule = json!({"id": "T-1", "name": "Workday"});
    assert!(validate_day_template(&missing_schedule).is_err());

    let bad_hour = json!({"id": "T-1", "name": "Workday", "schedule": {"99": []}});
    assert!(validate_day_template(&bad_hour).is_err());
}
