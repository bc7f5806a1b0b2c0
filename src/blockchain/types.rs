//! Chain-specific types and error definitions.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::address::TronAddress;

// Re-export RpcConfig from config module to avoid duplication
pub use crate::config::schema::RpcConfig;

/// Contract type tag of a native TRX balance transfer.
pub const NATIVE_TRANSFER_KIND: &str = "TransferContract";

/// Contract type tag of a smart-contract invocation.
pub const CONTRACT_CALL_KIND: &str = "TriggerSmartContract";

/// Errors that can occur while talking to a node. All of them are transient
/// from the monitor's point of view: the operation is retried next cycle.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP transport failure or non-success status.
    #[error("RPC error: {0}")]
    Transport(String),

    /// Request exceeded its deadline.
    #[error("RPC {operation} timed out after {secs} seconds")]
    Timeout { operation: &'static str, secs: u64 },

    /// The node answered with a payload we could not interpret.
    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    /// Every configured endpoint failed.
    #[error("All RPC providers failed to {0}")]
    AllProvidersFailed(&'static str),
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// One contract invocation inside a transaction, with addresses already
/// hex-decoded into raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractInvocation {
    /// Contract type tag (`TransferContract`, `TriggerSmartContract`, ...).
    pub kind: String,
    /// Raw 21-byte owner (sender) address.
    pub owner_address: Option<Vec<u8>>,
    /// Raw 21-byte recipient for native transfers.
    pub to_address: Option<Vec<u8>>,
    /// Native amount in minor units (sun).
    pub amount: Option<u64>,
    /// Raw 21-byte address of the invoked contract.
    pub contract_address: Option<Vec<u8>>,
    /// ABI call data for contract invocations.
    pub data: Option<Vec<u8>>,
}

/// A transaction as returned inside a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTransaction {
    pub tx_id: String,
    /// Milliseconds since epoch, from the transaction's raw data.
    pub timestamp: i64,
    pub invocations: Vec<ContractInvocation>,
    /// The node's original JSON record.
    pub raw: serde_json::Value,
}

/// A block with its transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainBlock {
    pub number: u64,
    pub timestamp: i64,
    pub transactions: Vec<ChainTransaction>,
}

/// Resource usage and fee reported for an executed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInfo {
    /// Total fee burned, in sun.
    pub fee: Option<u64>,
    pub energy_usage_total: Option<u64>,
    pub net_usage: Option<u64>,
    pub net_fee: Option<u64>,
    /// Raw receipt result string (`SUCCESS`, `REVERT`, `OUT_OF_ENERGY`, ...).
    pub receipt_result: Option<String>,
}

/// Status report for a transaction known to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStatusReport {
    /// True once the node has execution info for the transaction.
    pub terminal: bool,
    pub success: bool,
    pub block_number: Option<u64>,
    pub fee_info: Option<FeeInfo>,
    /// Failure reason reported by the node, if any.
    pub error: Option<String>,
}

/// Lifecycle status of a tracked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    /// SUCCESS and FAILED never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl From<Option<&TxStatusReport>> for TransactionStatus {
    fn from(report: Option<&TxStatusReport>) -> Self {
        match report {
            Some(r) if r.terminal && r.success => TransactionStatus::Success,
            Some(r) if r.terminal => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which asset a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// TRX balance transfer.
    Native,
    /// TRC20 `transfer(address,uint256)` call.
    Token,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Token => "token",
        }
    }
}

/// A transfer intent recovered from one contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransfer {
    pub asset_kind: AssetKind,
    pub sender: TronAddress,
    pub recipient: TronAddress,
    /// Amount in minor units, exact.
    pub amount_minor: U256,
    /// Decimal scale of `amount_minor`.
    pub decimals: u32,
    /// The invoked token contract, for token transfers.
    pub contract_address: Option<TronAddress>,
}

impl DecodedTransfer {
    /// Human amount (`amount_minor / 10^decimals`).
    pub fn amount(&self) -> f64 {
        scale_amount(self.amount_minor, self.decimals)
    }
}

/// Convert minor units to a human amount.
pub fn scale_amount(minor: U256, decimals: u32) -> f64 {
    let divisor = 10f64.powi(decimals as i32);
    match u128::try_from(minor) {
        Ok(value) => value as f64 / divisor,
        Err(_) => minor.to_string().parse::<f64>().unwrap_or(f64::MAX) / divisor,
    }
}
