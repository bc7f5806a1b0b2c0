//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::WatchConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the node URL.
pub const FULL_NODE_ENV: &str = "TRON_FULL_NODE";
/// Comma-separated addresses appended to the initial watchlist.
pub const MONITORED_ADDRESSES_ENV: &str = "TRON_MONITORED_ADDRESSES";
/// Overrides the poll interval.
pub const POLL_INTERVAL_ENV: &str = "TRON_POLL_INTERVAL_MS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    /// A required environment variable is missing or malformed.
    Env { var: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Env { var, reason } => write!(f, "Environment variable {}: {}", var, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<WatchConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: WatchConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults and environment only.
pub fn load_from_env() -> Result<WatchConfig, ConfigError> {
    let mut config = WatchConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut WatchConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(FULL_NODE_ENV).filter(|v| !v.trim().is_empty()) {
        config.rpc.full_host = url.trim().to_string();
    }

    if let Some(list) = lookup(MONITORED_ADDRESSES_ENV) {
        for address in list.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            if !config.monitor.watch_addresses.iter().any(|a| a == address) {
                config.monitor.watch_addresses.push(address.to_string());
            }
        }
    }

    if let Some(interval) = lookup(POLL_INTERVAL_ENV) {
        config.monitor.poll_interval_ms = interval.trim().parse().map_err(|e| ConfigError::Env {
            var: POLL_INTERVAL_ENV.to_string(),
            reason: format!("{}", e),
        })?;
    }

    Ok(())
}
