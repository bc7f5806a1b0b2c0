//! TRON node client with timeout and error handling.
//!
//! # Responsibilities
//! - Talk to the TronGrid-style HTTP API (`/wallet/*`)
//! - Query chain state (current height, blocks, transaction info)
//! - Bound every call with a timeout and fail over between endpoints
//! - Translate node JSON into the typed records the monitor consumes

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{
    ChainBlock, ChainTransaction, ContractInvocation, FeeInfo, RpcConfig, RpcError, RpcResult,
    TxStatusReport,
};
use crate::observability::metrics;

/// Header carrying the TronGrid API key.
pub const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// The node operations the monitor depends on.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Height of the latest block.
    async fn current_height(&self) -> RpcResult<u64>;

    /// Block at `height` with its transactions.
    async fn block(&self, height: u64) -> RpcResult<ChainBlock>;

    /// Execution status of a transaction; `None` when the node has no info yet.
    async fn transaction_status(&self, tx_id: &str) -> RpcResult<Option<TxStatusReport>>;
}

/// HTTP client for a TRON full node, with failover support.
#[derive(Clone)]
pub struct TronHttpClient {
    /// Base URLs (primary + failovers).
    endpoints: Vec<url::Url>,
    http: reqwest::Client,
    config: RpcConfig,
    timeout_duration: Duration,
}

impl TronHttpClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - RPC configuration
    /// * `api_key` - Optional TronGrid API key (read from the environment by the caller)
    pub fn new(config: RpcConfig, api_key: Option<String>) -> RpcResult<Self> {
        let timeout_duration = Duration::from_secs(config.timeout_secs);
        let mut endpoints = Vec::new();

        let primary: url::Url = config.full_host.parse().map_err(|e| {
            RpcError::Transport(format!("Invalid RPC URL '{}': {}", config.full_host, e))
        })?;
        endpoints.push(primary);

        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&key)
                .map_err(|e| RpcError::Transport(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout_duration)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        tracing::info!(
            full_host = %config.full_host,
            failovers = endpoints.len() - 1,
            timeout_secs = config.timeout_secs,
            "TRON client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            config,
            timeout_duration,
        })
    }

    /// POST `body` to `path` on each endpoint in turn until one answers.
    async fn post(&self, operation: &'static str, path: &str, body: Value) -> RpcResult<Value> {
        for (i, base) in self.endpoints.iter().enumerate() {
            let url = match base.join(path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(provider_idx = i, error = %e, "Bad endpoint path");
                    continue;
                }
            };

            let fut = async {
                let response = self.http.post(url).json(&body).send().await?;
                let value = response.error_for_status()?.json::<Value>().await?;
                Ok::<Value, reqwest::Error>(value)
            };

            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    metrics::record_rpc_error(operation);
                    tracing::warn!(provider_idx = i, operation, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    metrics::record_rpc_error(operation);
                    tracing::warn!(provider_idx = i, operation, "RPC timeout, trying next provider");
                }
            }
        }
        Err(RpcError::AllProvidersFailed(operation))
    }

    /// Check if the node is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.current_height().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

#[async_trait]
impl ChainRpc for TronHttpClient {
    async fn current_height(&self) -> RpcResult<u64> {
        let value = self.post("get current height", "wallet/getnowblock", json!({})).await?;
        let header: WireBlockHeader = match value.get("block_header") {
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| RpcError::Malformed(e.to_string()))?,
            None => return Err(RpcError::Malformed("getnowblock without block_header".into())),
        };
        Ok(header.raw_data.number)
    }

    async fn block(&self, height: u64) -> RpcResult<ChainBlock> {
        let value = self
            .post("get block", "wallet/getblockbynum", json!({ "num": height }))
            .await?;
        parse_block(value, height)
    }

    async fn transaction_status(&self, tx_id: &str) -> RpcResult<Option<TxStatusReport>> {
        let value = self
            .post(
                "get transaction info",
                "wallet/gettransactioninfobyid",
                json!({ "value": tx_id }),
            )
            .await?;
        parse_transaction_info(value)
    }
}

impl std::fmt::Debug for TronHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TronHttpClient")
            .field("full_host", &self.config.full_host)
            .field("endpoints", &self.endpoints.len())
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

#[derive(Deserialize)]
struct WireBlockHeader {
    raw_data: WireHeaderData,
}

#[derive(Deserialize)]
struct WireHeaderData {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    timestamp: i64,
}

#[derive(Deserialize)]
struct WireTransaction {
    #[serde(rename = "txID")]
    tx_id: String,
    raw_data: WireTransactionData,
}

#[derive(Deserialize)]
struct WireTransactionData {
    #[serde(default)]
    contract: Vec<WireContract>,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Deserialize)]
struct WireContract {
    #[serde(rename = "type")]
    kind: String,
    parameter: WireParameter,
}

#[derive(Deserialize)]
struct WireParameter {
    #[serde(default)]
    value: WireContractValue,
}

#[derive(Deserialize, Default)]
struct WireContractValue {
    owner_address: Option<String>,
    to_address: Option<String>,
    amount: Option<u64>,
    contract_address: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireTransactionInfo {
    id: Option<String>,
    #[serde(rename = "blockNumber")]
    block_number: Option<u64>,
    fee: Option<u64>,
    result: Option<String>,
    #[serde(rename = "resMessage")]
    res_message: Option<String>,
    receipt: Option<WireReceipt>,
}

#[derive(Deserialize, Default)]
struct WireReceipt {
    energy_usage_total: Option<u64>,
    net_usage: Option<u64>,
    net_fee: Option<u64>,
    result: Option<String>,
}

fn decode_hex_field(field: Option<String>) -> Option<Vec<u8>> {
    field.and_then(|s| hex::decode(s.strip_prefix("0x").unwrap_or(&s)).ok())
}

/// Translate a `getblockbynum` / `getnowblock` payload.
pub(crate) fn parse_block(value: Value, height: u64) -> RpcResult<ChainBlock> {
    let header: WireBlockHeader = match value.get("block_header") {
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| RpcError::Malformed(e.to_string()))?,
        None => return Err(RpcError::Malformed(format!("block {} not available", height))),
    };
    if header.raw_data.number != height {
        return Err(RpcError::Malformed(format!(
            "asked for block {} but node returned block {}",
            height, header.raw_data.number
        )));
    }

    let raw_transactions = match value.get("transactions") {
        Some(Value::Array(txs)) => txs.clone(),
        _ => Vec::new(),
    };

    let mut transactions = Vec::with_capacity(raw_transactions.len());
    for raw in raw_transactions {
        let wire: WireTransaction = match serde_json::from_value(raw.clone()) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::debug!(block = height, error = %e, "Skipping undecodable transaction");
                continue;
            }
        };

        let invocations = wire
            .raw_data
            .contract
            .into_iter()
            .map(|contract| {
                let value = contract.parameter.value;
                ContractInvocation {
                    kind: contract.kind,
                    owner_address: decode_hex_field(value.owner_address),
                    to_address: decode_hex_field(value.to_address),
                    amount: value.amount,
                    contract_address: decode_hex_field(value.contract_address),
                    data: decode_hex_field(value.data),
                }
            })
            .collect();

        transactions.push(ChainTransaction {
            tx_id: wire.tx_id,
            timestamp: wire.raw_data.timestamp.unwrap_or(header.raw_data.timestamp),
            invocations,
            raw,
        });
    }

    Ok(ChainBlock {
        number: header.raw_data.number,
        timestamp: header.raw_data.timestamp,
        transactions,
    })
}

/// Translate a `gettransactioninfobyid` payload. An empty object means the
/// node has not executed the transaction yet.
pub(crate) fn parse_transaction_info(value: Value) -> RpcResult<Option<TxStatusReport>> {
    let info: WireTransactionInfo =
        serde_json::from_value(value).map_err(|e| RpcError::Malformed(e.to_string()))?;
    if info.id.is_none() {
        return Ok(None);
    }

    let receipt = info.receipt.unwrap_or_default();
    let receipt_ok = receipt.result.as_deref().map_or(true, |r| r == "SUCCESS");
    let top_level_ok = info.result.as_deref() != Some("FAILED");
    let success = receipt_ok && top_level_ok;

    let error = if success {
        None
    } else {
        info.res_message
            .as_deref()
            .and_then(|m| hex::decode(m).ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .or_else(|| receipt.result.clone())
            .or(info.result)
    };

    Ok(Some(TxStatusReport {
        terminal: true,
        success,
        block_number: info.block_number,
        fee_info: Some(FeeInfo {
            fee: info.fee,
            energy_usage_total: receipt.energy_usage_total,
            net_usage: receipt.net_usage,
            net_fee: receipt.net_fee,
            receipt_result: receipt.result,
        }),
        error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::NATIVE_TRANSFER_KIND;

    fn test_config() -> RpcConfig {
        RpcConfig {
            full_host: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            api_key_env: None,
            timeout_secs: 1,
        }
    }

    fn sample_block() -> Value {
        json!({
            "blockID": "00000000000003e9",
            "block_header": { "raw_data": { "number": 1001, "timestamp": 1700000000000i64 } },
            "transactions": [
                {
                    "txID": "aa11",
                    "raw_data": {
                        "contract": [{
                            "type": "TransferContract",
                            "parameter": {
                                "value": {
                                    "amount": 5000000,
                                    "owner_address": "41f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                                    "to_address": "41a614f803b6fd780986a42c78ec9c7f77e6ded13c"
                                },
                                "type_url": "type.googleapis.com/protocol.TransferContract"
                            }
                        }],
                        "timestamp": 1700000000123i64
                    }
                },
                { "garbage": true }
            ]
        })
    }

    #[test]
    fn test_client_creation() {
        assert!(TronHttpClient::new(test_config(), Some("key".into())).is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = test_config();
        config.full_host = "not a url".into();
        assert!(TronHttpClient::new(config, None).is_err());
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        let client = TronHttpClient::new(config, None).unwrap();

        let result = client.current_height().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("All RPC providers failed"));
    }

    #[test]
    fn test_parse_block() {
        let block = parse_block(sample_block(), 1001).unwrap();
        assert_eq!(block.number, 1001);
        assert_eq!(block.transactions.len(), 1);

        let tx = &block.transactions[0];
        assert_eq!(tx.tx_id, "aa11");
        assert_eq!(tx.timestamp, 1700000000123);
        assert_eq!(tx.invocations[0].kind, NATIVE_TRANSFER_KIND);
        assert_eq!(tx.invocations[0].amount, Some(5_000_000));
        assert_eq!(tx.invocations[0].owner_address.as_ref().map(Vec::len), Some(21));
        assert_eq!(tx.raw["txID"], "aa11");
    }

    #[test]
    fn test_parse_block_height_mismatch() {
        let err = parse_block(sample_block(), 1002).unwrap_err();
        assert!(matches!(err, RpcError::Malformed(_)));
        assert!(err.to_string().contains("returned block 1001"));
    }

    #[test]
    fn test_parse_missing_block() {
        assert!(matches!(parse_block(json!({}), 5), Err(RpcError::Malformed(_))));
    }

    #[test]
    fn test_parse_info_not_found() {
        assert_eq!(parse_transaction_info(json!({})).unwrap(), None);
    }

    #[test]
    fn test_parse_info_native_success() {
        // Native transfers carry no receipt result
        let report = parse_transaction_info(json!({
            "id": "aa11",
            "blockNumber": 1001,
            "receipt": { "net_usage": 268 }
        }))
        .unwrap()
        .unwrap();
        assert!(report.terminal);
        assert!(report.success);
        assert_eq!(report.block_number, Some(1001));
    }

    #[test]
    fn test_parse_info_reverted() {
        let report = parse_transaction_info(json!({
            "id": "bb22",
            "blockNumber": 1002,
            "fee": 2_000_000,
            "result": "FAILED",
            "resMessage": "5245564552540a",
            "receipt": { "energy_usage_total": 13000, "result": "REVERT" }
        }))
        .unwrap()
        .unwrap();
        assert!(report.terminal);
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("REVERT\n"));
        let fee = report.fee_info.unwrap();
        assert_eq!(fee.fee, Some(2_000_000));
        assert_eq!(fee.receipt_result.as_deref(), Some("REVERT"));
    }
}
