//! Replay configuration

use serde::Deserialize;

use core_kernel::Currency;
use crate::error::ReplayError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Replay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Ledger currency code used when a scenario does not name one
    pub currency: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            currency: "ETH".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ReplayConfig {
    /// Loads configuration from `ESCROW_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::with_prefix("ESCROW"))
    }

    /// Loads configuration from an environment source, falling back to defaults per key
    pub fn from_source(env: config::Environment) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("currency", defaults.currency)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Parses the configured currency
    pub fn currency(&self) -> Result<Currency, ReplayError> {
        Ok(self.currency.parse()?)
    }
}
