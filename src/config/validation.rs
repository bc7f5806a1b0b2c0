//! Configuration validation.
//!
//! Semantic checks run after serde has handled syntax: URLs parse, intervals
//! are non-zero, every initial watch address is a valid TRON address. All
//! problems are reported together, and nothing security-relevant is
//! defaulted silently.

use crate::blockchain::address::TronAddress;
use crate::config::schema::WatchConfig;
use std::fmt;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &WatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.rpc.full_host) {
        errors.push(ValidationError::new("rpc.full_host", e.to_string()));
    }
    for (i, failover) in config.rpc.failover_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(format!("rpc.failover_urls[{}]", i), e.to_string()));
        }
    }
    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than 0"));
    }

    if config.monitor.poll_interval_ms == 0 {
        errors.push(ValidationError::new("monitor.poll_interval_ms", "must be greater than 0"));
    }
    if config.monitor.max_blocks_per_tick == 0 {
        errors.push(ValidationError::new("monitor.max_blocks_per_tick", "must be greater than 0"));
    }
    for address in &config.monitor.watch_addresses {
        if !TronAddress::is_valid(address) {
            errors.push(ValidationError::new(
                "monitor.watch_addresses",
                format!("invalid TRON address '{}'", address),
            ));
        }
    }

    if config.reconciler.interval_ms == 0 {
        errors.push(ValidationError::new("reconciler.interval_ms", "must be greater than 0"));
    }

    if let Some(contract) = &config.token.contract_address {
        if !TronAddress::is_valid(contract) {
            errors.push(ValidationError::new(
                "token.contract_address",
                format!("invalid TRON address '{}'", contract),
            ));
        }
    }
    if config.token.decimals > 36 {
        errors.push(ValidationError::new("token.decimals", "must be at most 36"));
    }

    if config.vault.key_env.trim().is_empty() {
        errors.push(ValidationError::new("vault.key_env", "must name an environment variable"));
    }

    if config.events.capacity == 0 {
        errors.push(ValidationError::new("events.capacity", "must be greater than 0"));
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new("admin.bind_address", "must be a socket address"));
        }
        if config.admin.api_key_env.trim().is_empty() {
            errors.push(ValidationError::new("admin.api_key_env", "must name an environment variable"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
