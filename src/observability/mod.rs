//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Poller, reconciler, RPC client:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (optional)
//! ```

pub mod logging;
pub mod metrics;
