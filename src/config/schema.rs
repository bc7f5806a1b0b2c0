//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.
//! Secrets never live here: sections name the environment variables that
//! hold them.

use serde::{Deserialize, Serialize};

/// Root configuration for the monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Node connection settings.
    pub rpc: RpcConfig,

    /// Block scanning settings.
    pub monitor: MonitorConfig,

    /// Pending transaction reconciliation settings.
    pub reconciler: ReconcilerConfig,

    /// The monitored TRC20 token.
    pub token: TokenConfig,

    /// Key vault settings.
    pub vault: VaultConfig,

    /// Processed transaction persistence.
    pub store: StoreConfig,

    /// Event fan-out.
    pub events: EventsConfig,

    /// Admin API.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Full node HTTP API base URL.
    pub full_host: String,

    /// Failover base URLs, tried in order after the primary.
    pub failover_urls: Vec<String>,

    /// Environment variable holding the TronGrid API key, if any.
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            full_host: "https://api.shasta.trongrid.io".to_string(),
            failover_urls: Vec::new(),
            api_key_env: Some("TRON_API_KEY".to_string()),
            timeout_secs: 10,
        }
    }
}

/// Block scanning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick interval in milliseconds (one TRON block is ~3s).
    pub poll_interval_ms: u64,

    /// Addresses watched from startup.
    pub watch_addresses: Vec<String>,

    /// Upper bound on blocks processed in one tick while catching up.
    pub max_blocks_per_tick: u64,

    /// Resume scanning after this height instead of the chain head.
    pub start_height: Option<u64>,

    /// Base delay for startup retries in milliseconds.
    pub startup_backoff_ms: u64,

    /// Cap on startup retry delay in milliseconds.
    pub startup_backoff_max_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            watch_addresses: Vec::new(),
            max_blocks_per_tick: 100,
            start_height: None,
            startup_backoff_ms: 500,
            startup_backoff_max_ms: 30_000,
        }
    }
}

/// Reconciler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Sweep interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { interval_ms: 10_000 }
    }
}

/// Monitored token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Token contract; when set, token transfers on other contracts are ignored.
    pub contract_address: Option<String>,

    /// Display symbol for logs.
    pub symbol: String,

    /// Decimal scale of the token.
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            symbol: "USDT".to_string(),
            decimals: 6,
        }
    }
}

/// Key vault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Environment variable holding the 64-char hex master key.
    pub key_env: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_env: "ENCRYPTION_KEY".to_string(),
        }
    }
}

/// Transaction store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file backing the store; in-memory only when absent.
    pub path: Option<String>,
}

/// Event publisher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the oldest are dropped.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Bind address.
    pub bind_address: String,

    /// Environment variable holding the Bearer token.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key_env: "TRON_WATCH_ADMIN_KEY".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
