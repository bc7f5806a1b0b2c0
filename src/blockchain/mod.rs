//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! TRON full node (HTTP API)
//!     → client.rs (timeouts, failover, JSON → typed blocks)
//!     → decoder.rs (contract invocation → transfer intent)
//!     → address.rs (raw 21-byte ↔ Base58Check)
//! ```
//!
//! # Constraints
//! - All RPC calls have configurable timeouts
//! - RPC failures are transient; callers retry on their next cycle
//! - Decoding never fails loudly: uninterpretable invocations are skipped

pub mod address;
pub mod client;
pub mod decoder;
pub mod types;

pub use address::{AddressError, TronAddress};
pub use client::{ChainRpc, TronHttpClient};
pub use decoder::{decode_invocation, decode_transfer_call};
pub use types::{
    AssetKind, ChainBlock, ChainTransaction, ContractInvocation, DecodedTransfer, FeeInfo,
    RpcError, RpcResult, TransactionStatus, TxStatusReport,
};
