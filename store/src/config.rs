//! Configuration management for the record store.

use std::env;
use std::path::PathBuf;

/// Default per-value size limit, matching the per-entry ceiling of common
/// mobile key/value stores.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_DATA_DIR: &str = "./garage-data";
const DEFAULT_LOG_FILTER: &str = "garage_store=info";

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one JSON file per collection
    pub data_dir: PathBuf,
    /// Largest value accepted by `set`, `None` for no limit
    pub max_value_bytes: Option<usize>,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Config {
    /// Configuration for `data_dir` with every other setting at its default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_value_bytes: Some(DEFAULT_MAX_VALUE_BYTES),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("GARAGE_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let max_value_bytes = match lookup("GARAGE_MAX_VALUE_BYTES") {
            None => Some(DEFAULT_MAX_VALUE_BYTES),
            Some(raw) => match raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidMaxValueBytes(raw.clone()))?
            {
                0 => None,
                limit => Some(limit),
            },
        };

        let log_filter = lookup("GARAGE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            max_value_bytes,
            log_filter,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid GARAGE_MAX_VALUE_BYTES value: {0:?}")]
    InvalidMaxValueBytes(String),
}
