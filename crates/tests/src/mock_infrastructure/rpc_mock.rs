//! RPC Mock Builder for Ethereum JSON-RPC Testing
//!
//! Wraps mockito with builders for the calls the registry makes: `eth_getCode`,
//! `eth_call`, `eth_blockNumber` and `eth_getLogs`. Matchers are keyed on method and
//! target address so mocks for different contracts never overlap.

use alloy_primitives::{Address, Bytes};
use keystone_core::utils::format_hex;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// Builder for creating mock Ethereum RPC responses.
pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

fn method_matcher(method: &str) -> Matcher {
    Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
}

fn address_matcher(address: Address) -> Matcher {
    Matcher::Regex(format!(r#""{}""#, format_hex(address.as_slice())))
}

fn result_body(result: &Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

impl RpcMockBuilder {
    /// Creates a new RPC mock builder with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the URL of the mock server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn respond(&mut self, matcher: Matcher, body: String) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks `eth_getCode` for `address`. Pass empty `code` for an undeployed address.
    pub fn mock_get_code(&mut self, address: Address, code: &[u8]) -> &mut Self {
        let matcher = Matcher::AllOf(vec![method_matcher("eth_getCode"), address_matcher(address)]);
        self.respond(matcher, result_body(&json!(format_hex(code))))
    }

    /// Mocks `eth_getCode` for `address` with a JSON-RPC error.
    pub fn mock_get_code_error(&mut self, address: Address, code: i32, message: &str) -> &mut Self {
        let matcher = Matcher::AllOf(vec![method_matcher("eth_getCode"), address_matcher(address)]);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        })
        .to_string();
        self.respond(matcher, body)
    }

    /// Mocks `eth_call` against `to` with exactly `data` as calldata.
    pub fn mock_call(&mut self, to: Address, data: &Bytes, result: &Bytes) -> &mut Self {
        let matcher = Matcher::AllOf(vec![
            method_matcher("eth_call"),
            Matcher::Regex(format!(r#""to"\s*:\s*"{}""#, format_hex(to.as_slice()))),
            Matcher::Regex(format!(r#""data"\s*:\s*"{}""#, format_hex(data))),
        ]);
        self.respond(matcher, result_body(&json!(format_hex(result))))
    }

    /// Mocks an `eth_blockNumber` request.
    pub fn mock_block_number(&mut self, block_number: u64) -> &mut Self {
        self.respond(method_matcher("eth_blockNumber"), result_body(&json!(format!("0x{block_number:x}"))))
    }

    /// Mocks an `eth_getLogs` request.
    pub fn mock_get_logs(&mut self, logs: &[Value]) -> &mut Self {
        self.respond(method_matcher("eth_getLogs"), result_body(&json!(logs)))
    }

    /// Mocks an RPC error response for every request with `method`.
    pub fn mock_rpc_error(&mut self, method: &str, code: i32, message: &str) -> &mut Self {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        })
        .to_string();
        self.respond(method_matcher(method), body)
    }

    /// Mocks a server error (500) for every request.
    pub fn mock_server_error(&mut self) -> &mut Self {
        let mock = self.server.mock("POST", "/").with_status(500).with_body("Internal Server Error").create();

        self.mocks.push(mock);
        self
    }

    /// Returns a reference to the underlying mockito server for advanced mocking.
    pub fn get_server(&mut self) -> &mut ServerGuard {
        &mut self.server
    }

    /// Verifies all mocks were called.
    #[must_use]
    pub fn verify_all_called(&self) -> bool {
        self.mocks.iter().all(Mock::matched)
    }

    /// Gets the number of mocks that were called at least once.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.mocks.iter().filter(|m| m.matched()).count()
    }
}

/// Builder for constructing log responses.
pub struct LogResponseBuilder {
    address: String,
    block_number: u64,
    log_index: u64,
    topics: Vec<String>,
    data: String,
}

impl LogResponseBuilder {
    /// Creates a new log response builder.
    #[must_use]
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            address: "0x0000000000000000000000000000000000000001".to_string(),
            block_number,
            log_index,
            topics: vec![format!("0x{:064x}", 0)],
            data: "0x".to_string(),
        }
    }

    /// Sets the emitting contract address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = format_hex(address.as_slice());
        self
    }

    /// Sets topics for the log.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Sets the ABI-encoded log data.
    #[must_use]
    pub fn with_data(mut self, data: &[u8]) -> Self {
        self.data = format_hex(data);
        self
    }

    /// Builds the log response JSON.
    #[must_use]
    pub fn build(self) -> Value {
        json!({
            "address": self.address,
            "blockNumber": format!("0x{:x}", self.block_number),
            "blockHash": format!("0x{:064x}", self.block_number),
            "logIndex": format!("0x{:x}", self.log_index),
            "transactionHash": format!("0x{:064x}", self.block_number * 100 + self.log_index),
            "transactionIndex": "0x0",
            "topics": self.topics,
            "data": self.data,
            "removed": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rpc_mock_builder_creation() {
        let mock = RpcMockBuilder::new().await;
        assert!(!mock.url().is_empty());
    }

    #[test]
    fn test_log_response_builder() {
        let log = LogResponseBuilder::new(100, 5)
            .with_address(Address::with_last_byte(0xaa))
            .with_data(&[0xde, 0xad])
            .build();
        assert_eq!(log["blockNumber"], "0x64");
        assert_eq!(log["logIndex"], "0x5");
        assert_eq!(log["address"], "0x00000000000000000000000000000000000000aa");
        assert_eq!(log["data"], "0xdead");
    }
}
