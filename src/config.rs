//! Client configuration
//!
//! Defaults match the marketplace backend's development deployment. Every
//! value can be overridden from the environment.

use crate::error::{ClientError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL; candidate paths are resolved against it
    pub base_url: String,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
    /// Interval of the unread-count polling timer
    pub poll_interval: Duration,
    /// Interval of the elapsed-time display timer
    pub tick_interval: Duration,
    /// Directory for the file-backed key-value store (None = in-memory)
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Create config from environment or defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("AGROLINK_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let request_timeout = std::env::var("AGROLINK_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        let poll_interval = std::env::var("AGROLINK_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let tick_interval = std::env::var("AGROLINK_TICK_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let storage_dir = std::env::var("AGROLINK_STORAGE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            request_timeout,
            poll_interval,
            tick_interval,
            storage_dir,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ValidationFailed(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::ValidationFailed(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() || self.tick_interval.is_zero() {
            return Err(ClientError::ValidationFailed(
                "timer intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a relative resource path against the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
