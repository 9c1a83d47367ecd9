//! # Configuration
//!
//! Runtime settings loaded from environment variables.

use crate::constants::{DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS};
use std::time::Duration;

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Synchronization settings
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Timeout of a single object store request (seconds)
    /// An expired request surfaces as a store timeout without retrying
    pub request_timeout_secs: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::parse(DEFAULT_LOG_FORMAT),
            enable_metrics: true,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: lookup("LOG_LEVEL")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: LogFormat::parse(
                lookup("LOG_FORMAT").as_deref().unwrap_or(DEFAULT_LOG_FORMAT),
            ),
            enable_metrics: lookup("ENABLE_METRICS").map_or(true, |v| parse_bool(&v)),
        }
    }

    /// Get the request timeout duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_bool(value: &str) -> bool {
    let v_lower = value.to_lowercase();
    v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
}
