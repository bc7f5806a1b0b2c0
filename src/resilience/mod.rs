//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Node call:
//!     → client timeout + provider failover (blockchain/client.rs)
//!     → On startup failure: backoff.rs (exponential delay with jitter, retry)
//! ```

pub mod backoff;

pub use backoff::calculate_backoff;
