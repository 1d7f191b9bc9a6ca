//! Facade configuration
//!
//! # Example
//! ```rust,ignore
//! use tidepool_kv::KvConfig;
//!
//! // From environment
//! let config = KvConfig::from_env()?;
//!
//! // Or explicit configuration
//! let config = KvConfig::new("redis://cache:6379")
//!     .db_index(3)
//!     .ignore_key_case(false);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{KvError, KvResult};

pub const ENV_URL: &str = "TIDEPOOL_REDIS_URL";
pub const ENV_DB: &str = "TIDEPOOL_REDIS_DB";
pub const ENV_IGNORE_KEY_CASE: &str = "TIDEPOOL_IGNORE_KEY_CASE";
pub const ENV_SCAN_PAGE_SIZE: &str = "TIDEPOOL_SCAN_PAGE_SIZE";

/// Facade configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    /// Redis URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Database selected right after connecting
    pub db_index: i64,
    /// Lower-case keys unless a [`crate::Key`] says otherwise
    pub ignore_key_case: bool,
    /// COUNT hint for each SCAN page in pattern deletion
    pub scan_page_size: usize,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            db_index: 0,
            ignore_key_case: true,
            scan_page_size: 100,
        }
    }
}

impl KvConfig {
    /// Create a config for the given URL with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the database index
    pub fn db_index(mut self, index: i64) -> Self {
        self.db_index = index;
        self
    }

    /// Set the default key case policy
    pub fn ignore_key_case(mut self, ignore: bool) -> Self {
        self.ignore_key_case = ignore;
        self
    }

    /// Set the SCAN page size
    pub fn scan_page_size(mut self, size: usize) -> Self {
        self.scan_page_size = size;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `TIDEPOOL_REDIS_URL`, `TIDEPOOL_REDIS_DB`,
    /// `TIDEPOOL_IGNORE_KEY_CASE` and `TIDEPOOL_SCAN_PAGE_SIZE`; unset
    /// variables keep their defaults.
    pub fn from_env() -> KvResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`KvConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> KvResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let url = lookup(ENV_URL).unwrap_or(defaults.url);
        let db_index = parse_var(&lookup, ENV_DB, defaults.db_index)?;
        let ignore_key_case = match lookup(ENV_IGNORE_KEY_CASE) {
            Some(raw) => parse_bool(ENV_IGNORE_KEY_CASE, &raw)?,
            None => defaults.ignore_key_case,
        };
        let scan_page_size = parse_var(&lookup, ENV_SCAN_PAGE_SIZE, defaults.scan_page_size)?;

        Ok(Self {
            url,
            db_index,
            ignore_key_case,
            scan_page_size,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> KvResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            KvError::Configuration(format!("Invalid value for {}: '{}' ({})", name, raw, e))
        }),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, raw: &str) -> KvResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(KvError::Configuration(format!(
            "Invalid value for {}: '{}' (expected true or false)",
            name, other
        ))),
    }
}
