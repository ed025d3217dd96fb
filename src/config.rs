//! Configuration management for bq-wordlist.
//!
//! Handles loading configuration from a TOML file and environment variables, and
//! resolving the final warehouse settings together with command-line overrides.

use crate::error::{Result, WordlistError};
use crate::warehouse::{
    BigQueryConfig, DEFAULT_API_URL, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Credentials file used when nothing else names one.
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Warehouse connection settings.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Directory whose files shadow bundled templates by relative name.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

/// Warehouse connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Project that runs the query jobs.
    pub project: Option<String>,

    /// Path to the service-account JSON key.
    pub credentials: Option<PathBuf>,

    /// BigQuery REST base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Rows requested per result page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between job status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Job location (e.g. "US").
    pub location: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project: None,
            credentials: None,
            api_url: default_api_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            location: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct WarehouseOverrides {
    pub project: Option<String>,
    pub credentials: Option<PathBuf>,
    pub page_size: Option<u32>,
}

impl WarehouseConfig {
    /// Applies environment variables (GOOGLE_CLOUD_PROJECT, GOOGLE_APPLICATION_CREDENTIALS)
    /// as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.project.is_none() {
            self.project = std::env::var("GOOGLE_CLOUD_PROJECT").ok();
        }
        if self.credentials.is_none() {
            self.credentials = std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
                .ok()
                .map(PathBuf::from);
        }
    }

    /// Resolves the final client settings: overrides > file > environment > defaults.
    ///
    /// Fails if the project is empty or the credentials file does not exist.
    pub fn resolve(&self, overrides: &WarehouseOverrides) -> Result<BigQueryConfig> {
        let mut merged = self.clone();
        if overrides.project.is_some() {
            merged.project = overrides.project.clone();
        }
        if overrides.credentials.is_some() {
            merged.credentials = overrides.credentials.clone();
        }
        if let Some(page_size) = overrides.page_size {
            merged.page_size = page_size;
        }
        merged.apply_env_defaults();

        let project = merged
            .project
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                WordlistError::config(
                    "project is required, provide it using the --project parameter.",
                )
            })?;

        let credentials = merged
            .credentials
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
        if !credentials.is_file() {
            return Err(WordlistError::config(format!(
                "credentials file {} not found, either save credentials.json in this folder \
                 or provide the credentials file path via the --credentials parameter.",
                credentials.display()
            )));
        }

        if merged.page_size == 0 {
            return Err(WordlistError::config("page_size must be at least 1"));
        }

        let api_url = Url::parse(&merged.api_url)
            .map_err(|e| WordlistError::config(format!("Invalid api_url: {e}")))?;
        if api_url.scheme() != "https" && api_url.scheme() != "http" {
            return Err(WordlistError::config(format!(
                "Invalid api_url scheme '{}'. Expected 'https' or 'http'",
                api_url.scheme()
            )));
        }

        Ok(BigQueryConfig {
            project,
            credentials,
            api_url: merged.api_url,
            page_size: merged.page_size,
            timeout_secs: merged.timeout_secs,
            poll_interval: Duration::from_millis(merged.poll_interval_ms),
            location: merged.location,
        })
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bq-wordlist")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| WordlistError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            WordlistError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
