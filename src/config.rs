//! Delivery configuration: where the filter-update endpoint lives and which
//! credentials to post with each update.
//!
//! ```toml
//! endpoint = "https://functions.example.com"
//! api_key = "..."
//! timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides `api_key` from the file.
pub const API_KEY_ENV: &str = "SEGFIX_API_KEY";

const UPDATE_PATH: &str = "/API/mailing_list.html";

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the site-functions host, without the API path.
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Config {
    /// Parse TOML text, apply the environment override and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on syntax errors or missing values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Self::parse_with_key_override(input, std::env::var(API_KEY_ENV).ok())
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O, syntax or validation failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    fn parse_with_key_override(input: &str, api_key: Option<String>) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(input)?;
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            config.api_key = key;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api_key must be set in the file or via {API_KEY_ENV}"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Full URL of the filter-update API.
    #[must_use]
    pub fn update_url(&self) -> String {
        format!("{}{UPDATE_PATH}", self.endpoint.trim_end_matches('/'))
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
