//! # Configuration
//!
//! JSON configuration file with per-field defaults, overlaid by the
//! process environment.
//!
//! | Variable                 | Field                  |
//! |--------------------------|------------------------|
//! | `WORKFLOW_ACTOR_TABLE`   | `actor_table`          |
//! | `UPLOAD_BUCKET`          | `upload_bucket`        |
//! | `AWS_ENDPOINT_URL`       | `endpoint_url`         |
//! | `UPLOAD_BASE_URL`        | `upload_base_url`      |
//! | `UPLOAD_SIGNING_SECRET`  | `upload_signing_secret`|
//! | `UPLOAD_URL_EXPIRY_SECS` | `upload_expiry_secs`   |
//! | `LOG_LEVEL`              | `log_level`            |

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Table holding actor records
    #[serde(default = "default_actor_table")]
    pub actor_table: String,

    /// Bucket new uploads are written to
    #[serde(default = "default_upload_bucket")]
    pub upload_bucket: String,

    /// Store endpoint override
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,

    #[serde(default)]
    pub upload_signing_secret: String,

    /// Lifetime of an upload URL in seconds
    #[serde(default = "default_upload_expiry_secs")]
    pub upload_expiry_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_actor_table() -> String {
    "workflow-actors".to_string()
}
fn default_upload_bucket() -> String {
    "uploads".to_string()
}
fn default_upload_base_url() -> String {
    "https://s3.amazonaws.com".to_string()
}
fn default_upload_expiry_secs() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            actor_table: default_actor_table(),
            upload_bucket: default_upload_bucket(),
            endpoint_url: None,
            upload_base_url: default_upload_base_url(),
            upload_signing_secret: String::new(),
            upload_expiry_secs: default_upload_expiry_secs(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, overlay the process environment, validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load from a JSON file, overlay values from `lookup`, validate
    pub fn load_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid by the process environment
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = AppConfig::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from `lookup`; unset or empty variables are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("WORKFLOW_ACTOR_TABLE") {
            self.actor_table = v;
        }
        if let Some(v) = get("UPLOAD_BUCKET") {
            self.upload_bucket = v;
        }
        if let Some(v) = get("AWS_ENDPOINT_URL") {
            self.endpoint_url = Some(v);
        }
        if let Some(v) = get("UPLOAD_BASE_URL") {
            self.upload_base_url = v;
        }
        if let Some(v) = get("UPLOAD_SIGNING_SECRET") {
            self.upload_signing_secret = v;
        }
        if let Some(v) = get("UPLOAD_URL_EXPIRY_SECS").and_then(|v| v.parse().ok()) {
            self.upload_expiry_secs = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.actor_table.is_empty() {
            return Err(ConfigError::invalid("actor_table", "must not be empty"));
        }
        if self.upload_bucket.is_empty() {
            return Err(ConfigError::invalid("upload_bucket", "must not be empty"));
        }
        if self.upload_expiry_secs == 0 {
            return Err(ConfigError::invalid("upload_expiry_secs", "must be > 0"));
        }
        self.severity()?;
        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: crate::observability::ObservabilityError| {
                ConfigError::invalid("log_level", e.to_string())
            })
    }
}
