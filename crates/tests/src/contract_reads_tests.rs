//! Typed contract reads and the lottery snapshot over HTTP.

use crate::mock_infrastructure::{deploy_fallback, session_for, test_config, RpcMockBuilder};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use keystone_core::{
    chain::abi::{IGovToken, IGovernance, ILottery},
    derived::{whole_tokens, MembershipTierTable, ThresholdSource},
    health::HealthStatus,
    registry::sepolia_fallback,
    types::ContractName,
};

fn gov(name: ContractName) -> Address {
    sepolia_fallback()[&name]
}

fn tokens(amount: u64) -> U256 {
    whole_tokens(amount, 18)
}

fn mock_read<C: SolCall>(mock: &mut RpcMockBuilder, name: ContractName, call: &C, ret: Vec<u8>) {
    mock.mock_call(gov(name), &Bytes::from(call.abi_encode()), &Bytes::from(ret));
}

fn mock_uint<C: SolCall>(mock: &mut RpcMockBuilder, name: ContractName, call: &C, value: U256) {
    mock_read(mock, name, call, value.to_be_bytes::<32>().to_vec());
}

fn mock_balance(mock: &mut RpcMockBuilder, holder: Address, amount: U256) {
    mock_uint(mock, ContractName::GovToken, &IGovToken::balanceOfCall { account: holder }, amount);
}

#[tokio::test]
async fn test_lottery_snapshot_over_http() {
    let account = Address::with_last_byte(0x0a);
    let rival = Address::with_last_byte(0x0b);

    let mut mock = RpcMockBuilder::new().await;
    deploy_fallback(&mut mock);
    mock_balance(&mut mock, account, tokens(1_200));
    mock_balance(&mut mock, rival, tokens(2_800));
    mock_uint(&mut mock, ContractName::Governance, &IGovernance::THRESHOLDCall {}, tokens(50));
    mock_uint(&mut mock, ContractName::Governance, &IGovernance::getProposalCountCall {}, U256::from(5u64));
    mock_read(
        &mut mock,
        ContractName::Governance,
        &IGovernance::getEligibleForLotteryCall { proposalId: 4 },
        IGovernance::getEligibleForLotteryCall::abi_encode_returns(&(vec![account, rival],)),
    );
    mock_uint(&mut mock, ContractName::Lottery, &ILottery::getPoolAmountCall { proposalId: 4 }, tokens(75));

    let session = session_for(test_config(&mock.url()));
    session.start().await.unwrap();
    let health = session.health().current().summary;
    assert_eq!(health.status, HealthStatus::Healthy);

    let config = session.config();
    let snapshot = session
        .reader()
        .lottery_snapshot(account, &config.tier_table(), config.default_threshold(), &health)
        .await
        .unwrap();

    assert_eq!(snapshot.proposal_id, Some(4));
    assert_eq!(snapshot.threshold, tokens(50));
    assert_eq!(snapshot.threshold_source, ThresholdSource::Contract);
    assert!(snapshot.eligibility.threshold_met);
    assert_eq!(snapshot.total_staked, tokens(4_000));
    assert_eq!(snapshot.account_share_percent, 30.0);
    assert_eq!(snapshot.pool_amount, tokens(75));
    assert_eq!(snapshot.membership.tier_name, "Gold");
    assert_eq!(snapshot.membership.next_tier.as_deref(), Some("Platinum"));
    assert!(snapshot.trustworthy);

    session.teardown().await;
}

#[tokio::test]
async fn test_snapshot_untrustworthy_when_nothing_deployed() {
    let account = Address::with_last_byte(0x0a);

    let mut mock = RpcMockBuilder::new().await;
    for address in sepolia_fallback().values() {
        mock.mock_get_code(*address, &[]);
    }
    mock_balance(&mut mock, account, U256::ZERO);
    mock_uint(&mut mock, ContractName::Governance, &IGovernance::THRESHOLDCall {}, U256::ZERO);
    mock_uint(&mut mock, ContractName::Governance, &IGovernance::getProposalCountCall {}, U256::ZERO);

    let session = session_for(test_config(&mock.url()));
    session.start().await.unwrap();
    let health = session.health().current().summary;
    assert_eq!(health.status, HealthStatus::Error);

    let snapshot = session
        .reader()
        .lottery_snapshot(account, &MembershipTierTable::default(), tokens(10), &health)
        .await
        .unwrap();

    assert_eq!(snapshot.proposal_id, None);
    assert!(snapshot.participants.is_empty());
    assert_eq!(snapshot.threshold_source, ThresholdSource::Default);
    assert!(!snapshot.eligibility.threshold_met);
    assert!(!snapshot.trustworthy);

    session.teardown().await;
}

#[tokio::test]
async fn test_read_failure_surfaces_rpc_error() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_rpc_error("eth_call", 3, "execution reverted");

    let session = session_for(test_config(&mock.url()));
    let result = session.reader().proposal_count().await;
    assert!(result.is_err());
    session.teardown().await;
}
