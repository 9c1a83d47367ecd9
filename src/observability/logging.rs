//! # Logging
//!
//! Installs the global `tracing` subscriber.

use crate::config::{LogFormat, SyncConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter(config: &SyncConfig) -> String {
    format!("remote_secret_controller={}", config.log_level)
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured log level. Fails if a subscriber is already installed.
pub fn init_tracing(config: &SyncConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!("failed to install the tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        let config = SyncConfig {
            log_level: "debug".to_string(),
            ..SyncConfig::default()
        };
        assert_eq!(default_filter(&config), "remote_secret_controller=debug");
    }
}
