use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_filter: String,
    pub sweep_interval_secs: u64,
    pub event_bus_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".qa/reviews.db"),
            host: "127.0.0.1".to_string(),
            port: 4830,
            log_filter: "info".to_string(),
            sweep_interval_secs: 300,
            event_bus_capacity: 1024,
        }
    }
}

impl Config {
    /// Reads the optional TOML file, then applies `QA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup("QA_DB_PATH") {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("QA_HOST") {
            self.host = value;
        }
        if let Some(value) = lookup("QA_PORT") {
            self.port = parse("QA_PORT", value)?;
        }
        if let Some(value) = lookup("QA_LOG") {
            self.log_filter = value;
        }
        if let Some(value) = lookup("QA_SWEEP_INTERVAL_SECS") {
            self.sweep_interval_secs = parse("QA_SWEEP_INTERVAL_SECS", value)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval_secs",
                value: "0".to_string(),
            });
        }
        if self.event_bus_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_bus_capacity",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
