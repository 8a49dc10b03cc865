use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::debug;

use crate::{
    chain::{http_client::HttpClient, RpcError},
    types::{JsonRpcRequest, JsonRpcResponse},
    utils::hex::{format_hex, format_hex_u64, parse_hex_bytes, parse_hex_u64},
};

/// Block range and topic filter for `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Option<Address>,
    pub topic0: Option<B256>,
}

/// A log as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, deserialize_with = "deserialize_hex_quantity")]
    pub block_number: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_hex_quantity")]
    pub log_index: Option<u64>,
}

fn deserialize_hex_quantity<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_hex_u64))
}

/// Read-only view of the chain.
///
/// Everything the registry needs from a node: bytecode presence for deployment
/// probes, `eth_call` for typed reads, and logs for deployment announcements.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at `address` for the latest block. Empty when nothing is deployed.
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError>;

    /// Executes a read-only call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    /// Current head block number.
    async fn block_number(&self) -> Result<u64, RpcError>;

    /// Logs matching `filter`, in chain order.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError>;
}

/// [`ChainReader`] backed by a JSON-RPC HTTP endpoint.
pub struct JsonRpcChainClient {
    http: HttpClient,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    #[must_use]
    pub fn new(http: HttpClient, url: impl Into<String>, timeout: Duration) -> Self {
        Self { http, url: url.into(), timeout, next_id: AtomicU64::new(1) }
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &'static str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, Some(params), json!(id));
        let body = serde_json::to_vec(&request)
            .map_err(|e| RpcError::InvalidRequest(format!("failed to serialize {method}: {e}")))?;

        let raw = self.http.send_request(&self.url, bytes::Bytes::from(body), self.timeout).await?;

        let response: JsonRpcResponse = serde_json::from_slice(&raw)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(error) = response.error {
            debug!(method = method, code = error.code, message = %error.message, "rpc returned error");
            return Err(RpcError::Rpc(error.code, error.message));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    fn expect_hex_string(method: &str, value: &Value) -> Result<Bytes, RpcError> {
        match value {
            Value::Null => Ok(Bytes::new()),
            Value::String(s) => parse_hex_bytes(s)
                .map(Bytes::from)
                .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: invalid hex data"))),
            other => Err(RpcError::InvalidResponse(format!("{method}: expected hex string, got {other}"))),
        }
    }
}

#[async_trait]
impl ChainReader for JsonRpcChainClient {
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        let result = self.request("eth_getCode", json!([format_hex(address.as_slice()), "latest"])).await?;
        Self::expect_hex_string("eth_getCode", &result)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let params = json!([{ "to": format_hex(to.as_slice()), "data": format_hex(&data) }, "latest"]);
        let result = self.request("eth_call", params).await?;
        Self::expect_hex_string("eth_call", &result)
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        result
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| RpcError::InvalidResponse("eth_blockNumber: invalid quantity".to_string()))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError> {
        let mut object = serde_json::Map::new();
        object.insert("fromBlock".into(), json!(format_hex_u64(filter.from_block)));
        object.insert("toBlock".into(), json!(format_hex_u64(filter.to_block)));
        if let Some(address) = filter.address {
            object.insert("address".into(), json!(format_hex(address.as_slice())));
        }
        if let Some(topic) = filter.topic0 {
            object.insert("topics".into(), json!([format_hex(topic.as_slice())]));
        }

        let result = self.request("eth_getLogs", Value::Array(vec![Value::Object(object)])).await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result).map_err(|e| RpcError::InvalidResponse(format!("eth_getLogs: {e}")))
    }
}
