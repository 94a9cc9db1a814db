use serde_json::Value;
use thiserror::Error;

/// Version written into every envelope. Bump it together with a new entry in
/// `MIGRATIONS` whose `from_version` is the previous value.
pub const CURRENT_DATA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("migration '{step}' failed: {reason}")]
pub struct MigrationError {
    pub step: &'static str,
    pub reason: String,
}

pub struct MigrationStep {
    pub from_version: u64,
    pub name: &'static str,
    pub apply: fn(Value) -> Result<Value, MigrationError>,
}

// Version 0 (unversioned) data already has the version 1 shape.
static MIGRATIONS: [MigrationStep; 0] = [];

pub struct Migrator<'a> {
    current_version: u64,
    steps: &'a [MigrationStep],
}

impl Default for Migrator<'static> {
    fn default() -> Self {
        Self::new(CURRENT_DATA_VERSION, &MIGRATIONS)
    }
}

impl<'a> Migrator<'a> {
    pub fn new(current_version: u64, steps: &'a [MigrationStep]) -> Self {
        Self {
            current_version,
            steps,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// Brings `data` from `from_version` up to the current version, one step
    /// at a time. A missing step is a passthrough. A failing step stops the
    /// run and the last successfully migrated value is returned, so the
    /// caller must still validate the result.
    pub fn migrate(&self, data: Value, from_version: u64) -> Value {
        if from_version >= self.current_version {
            return data;
        }

        tracing::info!(
            from = from_version,
            to = self.current_version,
            "migrating stored data"
        );

        let mut migrated = data;
        for version in from_version..self.current_version {
            let Some(step) = self.step_for(version) else {
                continue;
            };
            tracing::info!(step = step.name, from = version, to = version + 1, "applying migration");
            // Each step consumes its input, so keep a copy to fall back on.
            let snapshot = migrated.clone();
            match (step.apply)(migrated) {
                Ok(next) => migrated = next,
                Err(err) => {
                    tracing::error!(error = %err, from = version, "migration halted");
                    return snapshot;
                }
            }
        }
        migrated
    }

    fn step_for(&self, version: u64) -> Option<&MigrationStep> {
        self.steps.iter().find(|step| step.from_version == version)
    }
}
