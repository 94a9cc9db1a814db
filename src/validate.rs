//! Structural checks for data read back from the store.
//!
//! Everything loaded from disk passes through one of these before it is
//! deserialized into domain types. A failure rejects the whole value; nothing
//! is partially trusted.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Day, Hour, EPSILON, FULL_ALLOCATION};

pub type Validator = fn(&Value) -> Result<(), ValidationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
pub fn validate_master_project(value: &Value) -> Result<(), ValidationError> {
    check_master_project(value, "$")
}

#[cfg(test)]
pub fn validate_scheduled_project(value: &Value) -> Result<(), ValidationError> {
    check_scheduled_project(value, "$")
}

#[cfg(test)]
pub fn validate_day_template(value: &Value) -> Result<(), ValidationError> {
    check_day_template(value, "$")
}

pub fn validate_weekly_schedule(value: &Value) -> Result<(), ValidationError> {
    let days = as_object(value, "$")?;
    for (day_key, hours) in days {
        let path = format!("$.{day_key}");
        if !Day::ALL.iter().any(|day| day.as_str() == day_key) {
            return Err(ValidationError::new(&path, "unknown day"));
        }
        check_day_schedule(hours, &path)?;
    }
    Ok(())
}

pub fn validate_master_project_array(value: &Value) -> Result<(), ValidationError> {
    check_array(value, check_master_project)
}

pub fn validate_day_template_array(value: &Value) -> Result<(), ValidationError> {
    check_array(value, check_day_template)
}

fn check_array(
    value: &Value,
    check: fn(&Value, &str) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::new("$", "expected an array"))?;
    for (index, item) in items.iter().enumerate() {
        check(item, &format!("$[{index}]"))?;
    }
    Ok(())
}

fn check_master_project(value: &Value, path: &str) -> Result<(), ValidationError> {
    let object = as_object(value, path)?;
    require_non_empty(object, "id", path)?;
    require_non_empty(object, "name", path)?;
    require_string(object, "color", path)?;
    Ok(())
}

fn check_scheduled_project(value: &Value, path: &str) -> Result<(), ValidationError> {
    let object = as_object(value, path)?;
    require_non_empty(object, "id", path)?;
    require_non_empty(object, "masterId", path)?;
    require_string(object, "name", path)?;
    require_string(object, "color", path)?;

    let probability = object
        .get("probability")
        .and_then(Value::as_f64)
        .ok_or_else(|| ValidationError::new(&format!("{path}.probability"), "expected a number"))?;
    if !probability.is_finite() || !(0.0..=FULL_ALLOCATION + EPSILON).contains(&probability) {
        return Err(ValidationError::new(
            &format!("{path}.probability"),
            format!("{probability} is outside 0..={FULL_ALLOCATION}"),
        ));
    }
    Ok(())
}

fn check_day_template(value: &Value, path: &str) -> Result<(), ValidationError> {
    let object = as_object(value, path)?;
    require_non_empty(object, "id", path)?;
    require_non_empty(object, "name", path)?;
    let schedule = object
        .get("schedule")
        .ok_or_else(|| ValidationError::new(&format!("{path}.schedule"), "missing field"))?;
    check_day_schedule(schedule, &format!("{path}.schedule"))
}

fn check_day_schedule(value: &Value, path: &str) -> Result<(), ValidationError> {
    let hours = as_object(value, path)?;
    for (hour_key, entries) in hours {
        let hour_path = format!("{path}.{hour_key}");
        if !is_hour_key(hour_key) {
            return Err(ValidationError::new(&hour_path, "hour key must be 0-23"));
        }
        let items = entries
            .as_array()
            .ok_or_else(|| ValidationError::new(&hour_path, "expected an array"))?;
        for (index, item) in items.iter().enumerate() {
            check_scheduled_project(item, &format!("{hour_path}[{index}]"))?;
        }
    }
    Ok(())
}

fn is_hour_key(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= 2
        && raw.bytes().all(|byte| byte.is_ascii_digit())
        && raw
            .parse::<u8>()
            .is_ok_and(|value| Hour::new(value).is_ok() && raw == value.to_string())
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(path, "expected an object"))
}

fn require_string<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a str, ValidationError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new(&format!("{path}.{field}"), "expected a string"))
}

fn require_non_empty<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a str, ValidationError> {
    let value = require_string(object, field, path)?;
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            &format!("{path}.{field}"),
            "must not be empty",
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests;
