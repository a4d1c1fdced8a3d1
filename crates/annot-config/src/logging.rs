//! Logging configuration and tracing subscriber setup.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_level() -> String {
    "warn".to_string()
}

fn default_env_var() -> String {
    "ANNOT_LOG".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Fallback filter directive when the env var is unset (e.g. `"debug"`,
    /// `"annot_catalog=trace"`).
    #[serde(default = "default_level")]
    pub level: String,

    /// Environment variable holding an `EnvFilter` directive that overrides
    /// `level`.
    #[serde(default = "default_env_var")]
    pub env_var: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            env_var: default_env_var(),
        }
    }
}

/// Install a global `fmt` subscriber filtered by `config`.
///
/// The library crates only emit `tracing` events; binaries embedding them call
/// this once at startup.
///
/// # Errors
///
/// Returns `ConfigError::Tracing` if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(&config.env_var)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ConfigError::Tracing(error.to_string()))
}
