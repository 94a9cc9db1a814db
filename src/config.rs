use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::focus::DEFAULT_REROLL_INTERVAL;

pub const DEFAULT_DB_PATH: &str = ".weekplan/state.sqlite";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    db_path: Option<String>,
    reroll_interval_secs: Option<u64>,
    log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: Option<String>,
    pub reroll_interval: Duration,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            reroll_interval: DEFAULT_REROLL_INTERVAL,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads `explicit`, or the default location when none is given. A file
    /// that does not exist yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let file: RawConfig = toml::from_str(raw)?;
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            if db_path.trim().is_empty() {
                return Err(ConfigError::Invalid("db_path must not be empty".to_string()));
            }
            config.db_path = Some(db_path);
        }
        if let Some(secs) = file.reroll_interval_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "reroll_interval_secs must be greater than zero".to_string(),
                ));
            }
            config.reroll_interval = Duration::from_secs(secs);
        }
        if let Some(filter) = file.log_filter {
            config.log_filter = filter;
        }
        Ok(config)
    }

    /// Flag (or its env var) first, then the file, then the built-in default.
    pub fn resolve_db_path(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

fn config_path_from(xdg: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match xdg.filter(|value| !value.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => PathBuf::from(home.filter(|value| !value.is_empty())?).join(".config"),
    };
    Some(base.join("weekplan").join("config.toml"))
}
