//! Injected configuration for the validation core.
//!
//! The shell owns where the backend lives; the core never reads ambient
//! globals. A config either comes in through [`crate::Model::with_config`]
//! or through [`crate::Event::Configure`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_ADMIN_NAME, DEFAULT_API_BASE_URL, DEFAULT_LOAD_TIMEOUT_MS,
    DEFAULT_SUCCESS_NOTIFICATION_MS, MAX_TIMEOUT_MS,
};

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("admin name cannot be empty")]
    EmptyAdminName,

    #[error("{field} must be between 1 and {max} ms, got {value}")]
    InvalidTimeout {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub api_base_url: String,
    /// Sent as `admin_nom` with every decision. There is no authentication
    /// layer, so this is a display name only.
    pub admin_name: String,
    pub action_timeout_ms: u64,
    pub load_timeout_ms: u64,
    pub success_notification_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            admin_name: DEFAULT_ADMIN_NAME.to_string(),
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            success_notification_ms: DEFAULT_SUCCESS_NOTIFICATION_MS,
        }
    }
}

impl AdminConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_admin_name(mut self, name: impl Into<String>) -> Self {
        self.admin_name = name.into();
        self
    }

    #[must_use]
    pub fn with_action_timeout_ms(mut self, ms: u64) -> Self {
        self.action_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn with_load_timeout_ms(mut self, ms: u64) -> Self {
        self.load_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn with_success_notification_ms(mut self, ms: u64) -> Self {
        self.success_notification_ms = ms;
        self
    }

    /// Parses a JSON document (missing keys fall back to defaults) and
    /// validates the result.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.api_base_url)?;

        if self.admin_name.trim().is_empty() {
            return Err(ConfigError::EmptyAdminName);
        }

        for (field, value) in [
            ("action_timeout_ms", self.action_timeout_ms),
            ("load_timeout_ms", self.load_timeout_ms),
            ("success_notification_ms", self.success_notification_ms),
        ] {
            if value == 0 || value > MAX_TIMEOUT_MS {
                return Err(ConfigError::InvalidTimeout {
                    field,
                    value,
                    max: MAX_TIMEOUT_MS,
                });
            }
        }

        Ok(())
    }
}

fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: truncate_url(raw),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(invalid("URL cannot be empty".to_string()));
    }

    if raw.len() > MAX_URL_LENGTH {
        return Err(invalid(format!(
            "URL exceeds maximum length of {MAX_URL_LENGTH} bytes"
        )));
    }

    let parsed = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(invalid(format!(
            "invalid scheme '{scheme}', only 'http' and 'https' are allowed"
        )));
    }

    if parsed.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials in URL are not allowed".to_string()));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid(
            "base URL cannot carry a query or fragment".to_string(),
        ));
    }

    Ok(())
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}
