//! Monitor record and event types.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::address::TronAddress;
use crate::blockchain::types::{AssetKind, FeeInfo, TransactionStatus, TxStatusReport};

/// A transaction touching a watched address, keyed by `tx_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub tx_id: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    /// Block the transaction was found in or executed at.
    pub block_number: Option<u64>,
    pub sender: TronAddress,
    pub recipient: TronAddress,
    /// Human amount.
    pub amount: f64,
    /// Exact amount in minor units.
    pub amount_minor: U256,
    pub asset_kind: AssetKind,
    pub contract_address: Option<TronAddress>,
    /// Contract type tag of the matched invocation.
    pub contract_kind: String,
    pub status: TransactionStatus,
    pub fee_info: Option<FeeInfo>,
    pub error: Option<String>,
    /// The node's original transaction record.
    pub raw: serde_json::Value,
}

impl ProcessedTransaction {
    /// Fold a status lookup into the record. A missing report means PENDING.
    pub fn apply_status(&mut self, report: Option<&TxStatusReport>) {
        self.status = TransactionStatus::from(report);
        if let Some(report) = report {
            if report.block_number.is_some() {
                self.block_number = report.block_number;
            }
            self.fee_info = report.fee_info.clone();
            self.error = report.error.clone();
        }
    }
}

/// Notification emitted on every observed state of a tracked transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub event_id: Uuid,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub sender: TronAddress,
    pub recipient: TronAddress,
    pub amount: f64,
    pub asset_kind: AssetKind,
    pub contract_address: Option<TronAddress>,
    pub block_number: Option<u64>,
    pub fee_info: Option<FeeInfo>,
    pub error: Option<String>,
}

impl From<&ProcessedTransaction> for TransactionEvent {
    fn from(tx: &ProcessedTransaction) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            transaction_id: tx.tx_id.clone(),
            status: tx.status,
            sender: tx.sender,
            recipient: tx.recipient,
            amount: tx.amount,
            asset_kind: tx.asset_kind,
            contract_address: tx.contract_address,
            block_number: tx.block_number,
            fee_info: tx.fee_info.clone(),
            error: tx.error.clone(),
        }
    }
}
