//! TRON ledger monitor.
//!
//! Watches a set of addresses for native TRX and TRC20 transfers, tracks
//! each matched transaction until it succeeds or fails, publishes an event
//! for every observed state, and protects wallet key material at rest.
//!
//! # Architecture Overview
//!
//! ```text
//!   TRON full node ──▶ blockchain::client ──▶ monitor::poller ──▶ monitor::processor
//!                                │                  │                    │
//!                                │                  ▼                    ▼
//!                                └──────▶ monitor::reconciler ◀── monitor::pending
//!                                                   │
//!                                                   ▼
//!                        store (records) ◀── monitor::publisher ──▶ subscribers
//!
//!   admin (HTTP) reads/mutates watchlist, pending set and store
//!   security::vault seals private keys for an external signer
//! ```

// Core subsystems
pub mod blockchain;
pub mod monitor;
pub mod security;
pub mod store;

// Operator surface
pub mod admin;
pub mod config;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::WatchConfig;
pub use lifecycle::{Shutdown, WatchService};
