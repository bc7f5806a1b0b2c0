//! Watchlist matching for decoded transfers.

use crate::blockchain::address::{AddressError, TronAddress};
use crate::blockchain::decoder::decode_invocation;
use crate::blockchain::types::{AssetKind, ChainTransaction, TransactionStatus};
use crate::config::TokenConfig;
use crate::monitor::types::ProcessedTransaction;
use crate::monitor::watchlist::Watchlist;

/// Decoding parameters for the monitored token.
#[derive(Debug, Clone)]
pub struct TransferFilter {
    /// Only token transfers on this contract are tracked, when set.
    pub token_contract: Option<TronAddress>,
    pub token_decimals: u32,
}

impl Default for TransferFilter {
    fn default() -> Self {
        Self {
            token_contract: None,
            token_decimals: 6,
        }
    }
}

impl TransferFilter {
    pub fn from_config(config: &TokenConfig) -> Result<Self, AddressError> {
        let token_contract = config
            .contract_address
            .as_deref()
            .map(str::parse)
            .transpose()?;
        Ok(Self {
            token_contract,
            token_decimals: config.decimals,
        })
    }
}

/// Decode every invocation of `tx` and keep those whose sender or recipient
/// is watched. Records come back with status PENDING and no fee info.
pub fn match_transaction(
    tx: &ChainTransaction,
    block_number: u64,
    watchlist: &Watchlist,
    filter: &TransferFilter,
) -> Vec<ProcessedTransaction> {
    let mut matches = Vec::new();

    for invocation in &tx.invocations {
        let Some(transfer) = decode_invocation(invocation, filter.token_decimals) else {
            continue;
        };

        if transfer.asset_kind == AssetKind::Token {
            if let Some(expected) = filter.token_contract {
                if transfer.contract_address != Some(expected) {
                    tracing::trace!(tx_id = %tx.tx_id, "Ignoring transfer on unmonitored token contract");
                    continue;
                }
            }
        }

        if !watchlist.contains(&transfer.sender) && !watchlist.contains(&transfer.recipient) {
            continue;
        }

        matches.push(ProcessedTransaction {
            tx_id: tx.tx_id.clone(),
            timestamp: tx.timestamp,
            block_number: Some(block_number),
            sender: transfer.sender,
            recipient: transfer.recipient,
            amount: transfer.amount(),
            amount_minor: transfer.amount_minor,
            asset_kind: transfer.asset_kind,
            contract_address: transfer.contract_address,
            contract_kind: invocation.kind.clone(),
            status: TransactionStatus::Pending,
            fee_info: None,
            error: None,
            raw: tx.raw.clone(),
        });
    }

    matches
}
