//! Test Helper Functions and Utilities
//!
//! Fixtures for driving a full session against [`RpcMockBuilder`](super::RpcMockBuilder).

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use keystone_core::{
    chain::abi::ContractDeployed,
    config::AppConfig,
    registry::{sepolia_fallback, RuntimeDefaults},
    session::{Session, SessionBuilder},
    store::MemoryStore,
    utils::format_hex,
};
use serde_json::Value;
use std::sync::Arc;

use super::{LogResponseBuilder, RpcMockBuilder};

/// Minimal non-empty runtime bytecode.
pub const DEPLOYED_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

/// Config pointed at `url` with short timeouts and debounce.
#[must_use]
pub fn test_config(url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.chain.rpc_url = url.to_string();
    config.chain.request_timeout_seconds = 2;
    config.chain.probe_timeout_ms = 2_000;
    config.reload.debounce_ms = 50;
    config
}

/// Session over HTTP with an in-memory store and no runtime defaults.
#[must_use]
pub fn session_for(config: AppConfig) -> Session {
    SessionBuilder::new()
        .with_config(config)
        .with_store(Arc::new(MemoryStore::new()))
        .with_runtime_defaults(RuntimeDefaults::default())
        .build()
        .unwrap()
}

/// Mocks deployed bytecode at every address of the Sepolia table.
pub fn deploy_fallback(mock: &mut RpcMockBuilder) {
    for address in sepolia_fallback().values() {
        mock.mock_get_code(*address, DEPLOYED_CODE);
    }
}

/// A `ContractDeployed(name, address, timestamp)` log as returned by `eth_getLogs`.
#[must_use]
pub fn deployment_log(announcer: Address, name: &str, target: Address, block: u64, index: u64) -> Value {
    LogResponseBuilder::new(block, index)
        .with_address(announcer)
        .with_topics(vec![format_hex(ContractDeployed::SIGNATURE_HASH.as_slice())])
        .with_data(
            &ContractDeployed {
                name: name.to_string(),
                contractAddress: target,
                timestamp: U256::from(1_700_000_000u64),
            }
            .encode_data(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_log_shape() {
        let log = deployment_log(Address::with_last_byte(1), "LotteryContract", Address::with_last_byte(2), 10, 0);
        assert_eq!(log["blockNumber"], "0xa");
        assert_eq!(log["topics"].as_array().unwrap().len(), 1);
        assert!(log["data"].as_str().unwrap().len() > 2 + 4 * 64);
    }

    #[test]
    fn test_config_is_valid() {
        assert!(test_config("http://127.0.0.1:1234").validate().is_ok());
    }
}
