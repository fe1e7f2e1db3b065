//! Session configuration for spa-sync
//!
//! A `SessionConfig` is built once per suite session and shared read-only by
//! every readiness check afterwards.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Session-wide readiness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Block after every browser-mutating keyword until the page is ready
    pub block_until_page_ready: bool,

    /// Delay in seconds that lets the browser finish its current tick
    pub browser_breath_delay: f64,

    /// Inject jQuery into pages that lack it during page readiness
    pub ensure_jq: bool,

    /// Delay in seconds between two polls of a condition
    pub poll_frequency: f64,

    /// Default wait in seconds for element and framework readiness
    pub implicit_wait: f64,

    /// Default wait in seconds for page readiness and user-facing waits
    pub timeout: f64,

    /// Log level
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            block_until_page_ready: true,
            browser_breath_delay: 0.05,
            ensure_jq: true,
            poll_frequency: 0.2,
            implicit_wait: 15.0,
            timeout: 5.0,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Start a builder from the defaults
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: SessionConfig::default(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = SessionConfig::default();

        if let Ok(block) = env::var("SPA_SYNC_BLOCK_UNTIL_PAGE_READY") {
            config.block_until_page_ready = block
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_BLOCK_UNTIL_PAGE_READY"))?;
        }

        if let Ok(delay) = env::var("SPA_SYNC_BROWSER_BREATH_DELAY") {
            config.browser_breath_delay = delay
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_BROWSER_BREATH_DELAY"))?;
        }

        if let Ok(ensure_jq) = env::var("SPA_SYNC_ENSURE_JQ") {
            config.ensure_jq = ensure_jq
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_ENSURE_JQ"))?;
        }

        if let Ok(poll) = env::var("SPA_SYNC_POLL_FREQUENCY") {
            config.poll_frequency = poll
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_POLL_FREQUENCY"))?;
        }

        if let Ok(implicit_wait) = env::var("SPA_SYNC_IMPLICIT_WAIT") {
            config.implicit_wait = implicit_wait
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_IMPLICIT_WAIT"))?;
        }

        if let Ok(timeout) = env::var("SPA_SYNC_TIMEOUT") {
            config.timeout = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid SPA_SYNC_TIMEOUT"))?;
        }

        if let Ok(log_level) = env::var("SPA_SYNC_LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the polling loops cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.poll_frequency.is_finite() || self.poll_frequency <= 0.0 {
            return Err(Error::configuration("poll_frequency must be greater than zero"));
        }
        for (name, value) in [
            ("browser_breath_delay", self.browser_breath_delay),
            ("implicit_wait", self.implicit_wait),
            ("timeout", self.timeout),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::configuration(format!("{} must be a non-negative number", name)));
            }
        }
        Ok(())
    }

    pub fn breath_delay(&self) -> Duration {
        seconds(self.browser_breath_delay)
    }

    pub fn poll_interval(&self) -> Duration {
        seconds(self.poll_frequency)
    }

    pub fn implicit_wait_duration(&self) -> Duration {
        seconds(self.implicit_wait)
    }

    pub fn timeout_duration(&self) -> Duration {
        seconds(self.timeout)
    }
}

/// Out-of-range values (negative, NaN) read as zero
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn block_until_page_ready(mut self, block: bool) -> Self {
        self.config.block_until_page_ready = block;
        self
    }

    pub fn browser_breath_delay(mut self, seconds: f64) -> Self {
        self.config.browser_breath_delay = seconds;
        self
    }

    pub fn ensure_jq(mut self, ensure: bool) -> Self {
        self.config.ensure_jq = ensure;
        self
    }

    pub fn poll_frequency(mut self, seconds: f64) -> Self {
        self.config.poll_frequency = seconds;
        self
    }

    pub fn implicit_wait(mut self, seconds: f64) -> Self {
        self.config.implicit_wait = seconds;
        self
    }

    pub fn timeout(mut self, seconds: f64) -> Self {
        self.config.timeout = seconds;
        self
    }

    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Validate and finish
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
