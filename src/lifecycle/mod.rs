//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → secrets → node client → store → scanners → admin API
//!
//! Periodic work (task.rs):
//!     start() spawns one non-overlapping tick loop; stop() lets the current tick finish
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop scanners → flush store → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod task;

pub use shutdown::Shutdown;
pub use startup::{StartupError, WatchService};
