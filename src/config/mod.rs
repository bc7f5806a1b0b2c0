//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → WatchConfig (validated, immutable)
//!     → handed to startup, which builds every component from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new watch addresses are merged into the live watchlist
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets come from environment variables named by the config, never the file

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::WatchConfig;
pub use schema::{
    AdminConfig, EventsConfig, MonitorConfig, ObservabilityConfig, ReconcilerConfig, RpcConfig,
    StoreConfig, TokenConfig, VaultConfig,
};
