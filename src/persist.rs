//! Binds one in-memory collection to one key of a [`KeyValueStore`].
//!
//! Values are written as `{"version": N, "data": ...}`. Loading accepts that
//! envelope or a bare legacy value (treated as version 0), runs the
//! migrations, validates the result and only then deserializes it. Any
//! failure along the way is logged, the stored key is removed, and the
//! caller's default is returned. Nothing here returns an error.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::migration::Migrator;
use crate::store::KeyValueStore;
use crate::validate::{ValidationError, Validator};

pub const MASTER_PROJECTS_KEY: &str = "masterProjects";
pub const SCHEDULE_KEY: &str = "schedule";
pub const TEMPLATES_KEY: &str = "templates";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Absent,
    Loaded,
    Migrated { from_version: u64 },
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscardReason {
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("stored value is not valid JSON: {0}")]
    Unparsable(String),
    #[error("envelope version is not a non-negative integer")]
    BadVersion,
    #[error("stored version {stored} is newer than supported version {current}")]
    VersionTooNew { stored: u64, current: u64 },
    #[error("validation failed at {0}")]
    Invalid(ValidationError),
    #[error("could not decode validated data: {0}")]
    Undecodable(String),
}

pub struct Persisted<T> {
    key: &'static str,
    validator: Validator,
    migrator: Migrator<'static>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(key: &'static str, validator: Validator) -> Self {
        Self {
            key,
            validator,
            migrator: Migrator::default(),
            _marker: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn with_migrator(mut self, migrator: Migrator<'static>) -> Self {
        self.migrator = migrator;
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    #[cfg(test)]
    pub fn load(&self, store: &dyn KeyValueStore, default: T) -> T {
        self.load_with_outcome(store, default).0
    }

    pub fn load_with_outcome(&self, store: &dyn KeyValueStore, default: T) -> (T, LoadOutcome) {
        match self.try_load(store) {
            Ok(Some((value, outcome))) => (value, outcome),
            Ok(None) => (default, LoadOutcome::Absent),
            Err(reason) => {
                tracing::warn!(key = self.key, reason = %reason, "discarding stored value");
                self.wipe(store);
                (default, LoadOutcome::Discarded(reason))
            }
        }
    }

    fn try_load(&self, store: &dyn KeyValueStore) -> Result<Option<(T, LoadOutcome)>, DiscardReason> {
        let raw = match store.get(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(err) => return Err(DiscardReason::ReadFailed(err.to_string())),
        };

        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|err| DiscardReason::Unparsable(err.to_string()))?;
        let (data, from_version) = split_envelope(parsed)?;

        let current = self.migrator.current_version();
        if from_version > current {
            return Err(DiscardReason::VersionTooNew {
                stored: from_version,
                current,
            });
        }
        if from_version == 0 {
            tracing::info!(key = self.key, "found unversioned data");
        }

        let migrated = self.migrator.migrate(data, from_version);
        (self.validator)(&migrated).map_err(DiscardReason::Invalid)?;
        let value = serde_json::from_value(migrated)
            .map_err(|err| DiscardReason::Undecodable(err.to_string()))?;

        let outcome = if from_version == current {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Migrated { from_version }
        };
        Ok(Some((value, outcome)))
    }

    /// Writes the current envelope, or removes the key when `value` serializes
    /// to `null`, `[]` or `{}`.
    pub fn save(&self, store: &dyn KeyValueStore, value: &T) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(key = self.key, error = %err, "failed to serialize value");
                return;
            }
        };

        if is_empty(&data) {
            if let Err(err) = store.delete(self.key) {
                tracing::error!(key = self.key, error = %err, "failed to remove empty value");
            }
            return;
        }

        let envelope = json!({
            "version": self.migrator.current_version(),
            "data": data,
        });
        if let Err(err) = store.set(self.key, &envelope.to_string()) {
            tracing::error!(key = self.key, error = %err, "failed to write value");
        }
    }

    fn wipe(&self, store: &dyn KeyValueStore) {
        if let Err(err) = store.delete(self.key) {
            tracing::error!(key = self.key, error = %err, "failed to remove discarded value");
        }
    }
}

fn split_envelope(parsed: Value) -> Result<(Value, u64), DiscardReason> {
    let is_versioned = parsed
        .as_object()
        .and_then(|object| object.get("version"))
        .is_some_and(Value::is_number);
    if !is_versioned {
        return Ok((parsed, 0));
    }

    let Value::Object(mut object) = parsed else {
        return Err(DiscardReason::BadVersion);
    };
    let version = object
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(DiscardReason::BadVersion)?;
    let data = object.remove("data").unwrap_or(Value::Null);
    Ok((data, version))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests;
