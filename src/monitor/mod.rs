//! Ledger monitor.
//!
//! # Data Flow
//! ```text
//! ChainPoller tick (poller.rs):
//!     → height + blocks from ChainRpc
//!     → processor.rs (decode invocations, match against watchlist.rs)
//!     → status lookup → pending.rs (if PENDING) + store
//!     → publisher.rs (one event per observation)
//!
//! PendingReconciler tick (reconciler.rs):
//!     → stored PENDING records re-admitted to pending.rs
//!     → status lookup per pending entry
//!     → terminal: remove from pending.rs, update store, publish
//! ```

pub mod pending;
pub mod poller;
pub mod processor;
pub mod publisher;
pub mod reconciler;
pub mod types;
pub mod watchlist;

pub use pending::PendingSet;
pub use poller::{ChainPoller, PollOutcome, PollerSettings, PollerState};
pub use processor::{match_transaction, TransferFilter};
pub use publisher::EventPublisher;
pub use reconciler::{PendingReconciler, ReconcileOutcome};
pub use types::{ProcessedTransaction, TransactionEvent};
pub use watchlist::Watchlist;
