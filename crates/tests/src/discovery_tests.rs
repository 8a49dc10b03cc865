//! Event-log discovery against `eth_getLogs` responses.

use crate::mock_infrastructure::{deployment_log, test_config, RpcMockBuilder};
use alloy_primitives::{address, Address};
use keystone_core::{
    chain::{HttpClient, JsonRpcChainClient},
    discovery::{DeploymentDiscovery, DiscoveryError, EventLogDiscovery},
    types::ContractName,
};
use std::{sync::Arc, time::Duration};

const ANNOUNCER: Address = address!("00000000000000000000000000000000000a11ce");

fn discovery(url: &str) -> EventLogDiscovery {
    let chain = Arc::new(JsonRpcChainClient::new(HttpClient::new().unwrap(), url, Duration::from_secs(2)));
    EventLogDiscovery::new(chain, test_config(url).discovery.lookback_blocks).with_announcer(ANNOUNCER)
}

#[tokio::test]
async fn test_discovers_announced_deployments() {
    let governance = address!("1111111111111111111111111111111111111111");
    let old_lottery = address!("2222222222222222222222222222222222222222");
    let new_lottery = address!("3333333333333333333333333333333333333333");

    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number(100_000);
    mock.mock_get_logs(&[
        deployment_log(ANNOUNCER, "LotteryContract", new_lottery, 99_500, 1),
        deployment_log(ANNOUNCER, "Governance", governance, 99_000, 0),
        deployment_log(ANNOUNCER, "LotteryContract", old_lottery, 99_000, 1),
        deployment_log(ANNOUNCER, "Treasury", address!("5555555555555555555555555555555555555555"), 99_100, 0),
    ]);

    let candidates = discovery(&mock.url()).discover().await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[&ContractName::Governance], governance);
    assert_eq!(candidates[&ContractName::Lottery], new_lottery);
    assert!(mock.verify_all_called());
}

#[tokio::test]
async fn test_no_announcements_is_no_candidates() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number(10);
    mock.mock_get_logs(&[]);

    let result = discovery(&mock.url()).discover().await;
    assert!(matches!(result, Err(DiscoveryError::NoCandidatesFound)));
}

#[tokio::test]
async fn test_rejected_log_query_is_unsupported() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number(10);
    mock.mock_rpc_error("eth_getLogs", -32602, "invalid params: query returned more than 10000 results");

    let result = discovery(&mock.url()).discover().await;
    assert!(matches!(result, Err(DiscoveryError::Unsupported(_))));
}
