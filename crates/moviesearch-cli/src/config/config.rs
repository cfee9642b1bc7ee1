//! `AppConfig` struct and TOML loading.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `omdb.api_key`.
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// OMDb client settings.
    #[serde(default)]
    pub omdb: OmdbConfig,
    /// New search term notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// OMDb client configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OmdbConfig {
    /// OMDb API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Notification configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Webhook receiving `{"term": ...}` for each new search term.
    /// New terms are only logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl OmdbConfig {
    /// Picks the API key: a non-empty `env_value` wins over `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source provides a key.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Result<String> {
        if let Some(key) = env_value.filter(|k| !k.is_empty()) {
            return Ok(key);
        }
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        bail!("OMDb API key is required: set {API_KEY_ENV} or omdb.api_key in config.toml")
    }
}
