//! Tracing subscriber setup.
//!
//! Plain fmt or JSON output with env-filter; the log level comes from
//! `RUST_LOG` when set, otherwise from configuration.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to log lines.
    pub service_name: String,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable output.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "news-insight-engine".to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Create a configuration for the given service name.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set the fallback log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Builder: toggle JSON output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Error initializing the subscriber.
#[derive(Debug)]
pub struct TracingInitError(pub String);

impl std::fmt::Display for TracingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to initialize tracing: {}", self.0)
    }
}

impl std::error::Error for TracingInitError {}

/// Install the global subscriber.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_filter(filter))
            .try_init()
            .map_err(|e| TracingInitError(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_filter(filter))
            .try_init()
            .map_err(|e| TracingInitError(e.to_string()))?;
    }

    info!(service = %config.service_name, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = TracingConfig::new("engine-test")
            .with_log_level("debug")
            .with_json(true);
        assert_eq!(config.service_name, "engine-test");
        assert_eq!(config.log_level, "debug");
        assert!(config.json);
    }
}
