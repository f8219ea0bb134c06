//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SPREADSHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const ENV_API_KEY: &str = "GOOGLE_SHEETS_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_SHEETS_ACCESS_TOKEN";
pub const ENV_MAX_CONCURRENT: &str = "MAX_CONCURRENT_GOOGLE_SHEET_REQUESTS";
pub const ENV_DELAY_BETWEEN_REQUESTS: &str = "DELAY_BETWEEN_GOOGLE_SHEET_REQUESTS";
pub const ENV_MAX_RETRIES: &str = "GOOGLE_SHEETS_MAX_RETRIES";
pub const ENV_BIND: &str = "CHOIR_RSVP_BIND";

/// Compiled defaults used when no other source provides a value
pub struct CompiledDefaults;

impl CompiledDefaults {
    pub const MEMBERS_RANGE: &'static str = "Members!A:B";
    pub const RESPONSES_RANGE: &'static str = "Responses!A:H";
    pub const BIND: &'static str = "127.0.0.1:5730";
    pub const MAX_CONCURRENT: usize = 3;
    pub const DELAY_BETWEEN_REQUESTS_MS: u64 = 100;
    pub const MAX_RETRIES: u32 = 3;
}

/// Partial configuration: one layer of the priority order.
///
/// Used both for the TOML file and for CLI/environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub members_range: Option<String>,
    pub responses_range: Option<String>,
    pub bind: Option<String>,
    pub max_concurrent: Option<usize>,
    pub delay_between_requests_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl ConfigLayer {
    /// Parse a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load the TOML layer.
    ///
    /// An explicitly requested file must exist. Without one, the platform
    /// config file is used when present; a missing file yields an empty layer.
    pub fn load_file(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_toml_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_toml_file(&path),
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "No config file found, using environment and compiled defaults"
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Read the layer from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            spreadsheet_id: env_string(ENV_SPREADSHEET_ID),
            api_key: env_string(ENV_API_KEY),
            access_token: env_string(ENV_ACCESS_TOKEN),
            members_range: None,
            responses_range: None,
            bind: env_string(ENV_BIND),
            max_concurrent: env_parsed(ENV_MAX_CONCURRENT)?,
            delay_between_requests_ms: env_parsed(ENV_DELAY_BETWEEN_REQUESTS)?,
            max_retries: env_parsed(ENV_MAX_RETRIES)?,
        })
    }

    /// Fill unset fields of `self` from `lower`
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            spreadsheet_id: self.spreadsheet_id.or(lower.spreadsheet_id),
            api_key: self.api_key.or(lower.api_key),
            access_token: self.access_token.or(lower.access_token),
            members_range: self.members_range.or(lower.members_range),
            responses_range: self.responses_range.or(lower.responses_range),
            bind: self.bind.or(lower.bind),
            max_concurrent: self.max_concurrent.or(lower.max_concurrent),
            delay_between_requests_ms: self
                .delay_between_requests_ms
                .or(lower.delay_between_requests_ms),
            max_retries: self.max_retries.or(lower.max_retries),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_string(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got {:?}", name, raw))),
        None => Ok(None),
    }
}

/// Platform config file: `<config_dir>/choir/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("choir").join("config.toml"))
}

/// How requests to the Sheets API are authorized
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsCredentials {
    /// OAuth bearer token; required for appends
    AccessToken(String),
    /// API key; read-only access to shared sheets
    ApiKey(String),
}

impl fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetsCredentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            SheetsCredentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub spreadsheet_id: String,
    pub credentials: SheetsCredentials,
    pub members_range: String,
    pub responses_range: String,
    pub bind: String,
    /// Upper bound on Sheets calls in flight at once
    pub max_concurrent: usize,
    /// Wait applied before each dispatched Sheets call
    pub delay_between_requests: Duration,
    pub max_retries: u32,
}

impl ServiceConfig {
    /// Apply compiled defaults to a merged layer and validate it
    pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
        let spreadsheet_id = layer
            .spreadsheet_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("Spreadsheet id is required (set {})", ENV_SPREADSHEET_ID))
            })?;

        // A token wins over a key since only tokens can append rows
        let credentials = match (layer.access_token, layer.api_key) {
            (Some(token), _) if !token.is_empty() => SheetsCredentials::AccessToken(token),
            (_, Some(key)) if !key.is_empty() => SheetsCredentials::ApiKey(key),
            _ => {
                return Err(Error::Config(format!(
                    "Sheets credentials are required (set {} or {})",
                    ENV_ACCESS_TOKEN, ENV_API_KEY
                )))
            }
        };

        let max_concurrent = layer.max_concurrent.unwrap_or(CompiledDefaults::MAX_CONCURRENT);
        if max_concurrent == 0 {
            return Err(Error::Config("max_concurrent must be at least 1".to_string()));
        }

        Ok(Self {
            spreadsheet_id,
            credentials,
            members_range: layer
                .members_range
                .unwrap_or_else(|| CompiledDefaults::MEMBERS_RANGE.to_string()),
            responses_range: layer
                .responses_range
                .unwrap_or_else(|| CompiledDefaults::RESPONSES_RANGE.to_string()),
            bind: layer.bind.unwrap_or_else(|| CompiledDefaults::BIND.to_string()),
            max_concurrent,
            delay_between_requests: Duration::from_millis(
                layer
                    .delay_between_requests_ms
                    .unwrap_or(CompiledDefaults::DELAY_BETWEEN_REQUESTS_MS),
            ),
            max_retries: layer.max_retries.unwrap_or(CompiledDefaults::MAX_RETRIES),
        })
    }

    /// Resolve from CLI overrides, environment, config file and defaults
    pub fn resolve(cli: ConfigLayer, config_file: Option<&Path>) -> Result<Self> {
        let env = ConfigLayer::from_env()?;
        let file = ConfigLayer::load_file(config_file)?;
        Self::from_layer(cli.or(env).or(file))
    }
}
