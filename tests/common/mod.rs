//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use tron_watch::blockchain::types::{
    ChainBlock, ChainTransaction, ContractInvocation, RpcError, RpcResult, TxStatusReport,
    NATIVE_TRANSFER_KIND,
};
use tron_watch::blockchain::{ChainRpc, TronAddress};

pub const WATCHED: &str = "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG";
pub const UNWATCHED: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
pub const TOKEN_CONTRACT: &str = "TFTsyAaajS3DTEbekme2wm9fNcypguDHp4";

pub fn raw(address: &str) -> Vec<u8> {
    address.parse::<TronAddress>().unwrap().as_bytes().to_vec()
}

/// A transaction holding one native transfer.
pub fn native_transfer(tx_id: &str, from: &str, to: &str, amount: u64) -> ChainTransaction {
    ChainTransaction {
        tx_id: tx_id.to_string(),
        timestamp: 1_700_000_000_000,
        invocations: vec![ContractInvocation {
            kind: NATIVE_TRANSFER_KIND.to_string(),
            owner_address: Some(raw(from)),
            to_address: Some(raw(to)),
            amount: Some(amount),
            ..Default::default()
        }],
        raw: serde_json::json!({ "txID": tx_id }),
    }
}

pub fn success(block_number: u64) -> TxStatusReport {
    TxStatusReport {
        terminal: true,
        success: true,
        block_number: Some(block_number),
        fee_info: None,
        error: None,
    }
}

pub fn failure(block_number: u64, reason: &str) -> TxStatusReport {
    TxStatusReport {
        terminal: true,
        success: false,
        block_number: Some(block_number),
        fee_info: None,
        error: Some(reason.to_string()),
    }
}

/// Scriptable in-memory node.
#[derive(Default)]
pub struct MockChain {
    height: AtomicU64,
    blocks: Mutex<HashMap<u64, ChainBlock>>,
    statuses: Mutex<HashMap<String, TxStatusReport>>,
    failing_blocks: Mutex<HashSet<u64>>,
    height_unavailable: AtomicBool,
    status_unavailable: AtomicBool,
    pub height_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl MockChain {
    pub fn at_height(height: u64) -> Self {
        let chain = Self::default();
        chain.set_height(height);
        chain
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn add_block(&self, number: u64, transactions: Vec<ChainTransaction>) {
        self.blocks.lock().unwrap().insert(
            number,
            ChainBlock {
                number,
                timestamp: 1_700_000_000_000,
                transactions,
            },
        );
    }

    pub fn set_status(&self, tx_id: &str, report: TxStatusReport) {
        self.statuses.lock().unwrap().insert(tx_id.to_string(), report);
    }

    pub fn fail_block(&self, number: u64, failing: bool) {
        let mut blocks = self.failing_blocks.lock().unwrap();
        if failing {
            blocks.insert(number);
        } else {
            blocks.remove(&number);
        }
    }

    pub fn fail_height(&self, failing: bool) {
        self.height_unavailable.store(failing, Ordering::SeqCst);
    }

    pub fn fail_status(&self, failing: bool) {
        self.status_unavailable.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn current_height(&self) -> RpcResult<u64> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        if self.height_unavailable.load(Ordering::SeqCst) {
            return Err(RpcError::AllProvidersFailed("get current height"));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn block(&self, height: u64) -> RpcResult<ChainBlock> {
        if self.failing_blocks.lock().unwrap().contains(&height) {
            return Err(RpcError::Timeout {
                operation: "get block",
                secs: 1,
            });
        }
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or(ChainBlock {
                number: height,
                timestamp: 0,
                transactions: Vec::new(),
            }))
    }

    async fn transaction_status(&self, tx_id: &str) -> RpcResult<Option<TxStatusReport>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.status_unavailable.load(Ordering::SeqCst) {
            return Err(RpcError::Transport("connection reset".into()));
        }
        Ok(self.statuses.lock().unwrap().get(tx_id).cloned())
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn start_mock_node(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
