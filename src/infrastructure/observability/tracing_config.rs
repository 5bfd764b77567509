use crate::presentation::config::{Environment, LoggingSettings};

const DEFAULT_FILTER: &str = "info,chat_relay=debug,tower_http=debug";

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: Environment,
    pub json_format: bool,
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
}

impl TracingConfig {
    pub fn from_settings(environment: Environment, logging: &LoggingSettings) -> Self {
        Self {
            environment,
            json_format: logging.json_format.unwrap_or(environment == Environment::Prod),
            filter: logging
                .filter
                .clone()
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            json_format: false,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}
