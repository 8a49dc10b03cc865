//! End-to-end registry sessions over a mocked JSON-RPC endpoint.

use crate::mock_infrastructure::{
    deploy_fallback, deployment_log, session_for, test_config, RpcMockBuilder, DEPLOYED_CODE,
};
use alloy_primitives::{address, Address};
use keystone_core::{
    config::DiscoveryMode,
    health::{HealthStatus, InvalidReason},
    registry::{sepolia_fallback, AddressSource, RuntimeDefaults},
    reload::PassOutcome,
    session::SessionBuilder,
    store::{FileStore, KeyValueStore},
    types::ContractName,
};
use std::{collections::BTreeMap, sync::Arc, time::Duration};

const ANNOUNCER: Address = address!("00000000000000000000000000000000000a11ce");
const NEW_LOTTERY: Address = address!("4444444444444444444444444444444444444444");

fn fallback(name: ContractName) -> Address {
    sepolia_fallback()[&name]
}

#[tokio::test]
async fn test_start_pass_healthy_over_http() {
    let mut mock = RpcMockBuilder::new().await;
    deploy_fallback(&mut mock);

    let session = session_for(test_config(&mock.url()));
    let outcome = session.start().await.unwrap();

    match outcome {
        PassOutcome::Healthy { summary, ready_notice } => {
            assert_eq!(summary.valid_count, ContractName::ALL.len());
            assert!(ready_notice);
        }
        other => panic!("expected healthy pass, got {other:?}"),
    }

    let state = session.health().current();
    assert_eq!(state.summary.status, HealthStatus::Healthy);
    assert!(state.results.iter().all(|r| r.code_len == Some(DEPLOYED_CODE.len())));
    assert!(state.updated_at.is_some());
    assert!(mock.verify_all_called());

    // Ready notice is shown once per identity.
    let again = session.coordinator().run_pass().await.unwrap();
    assert!(matches!(again, PassOutcome::Healthy { ready_notice: false, .. }));

    session.teardown().await;
}

#[tokio::test]
async fn test_missing_code_degrades_with_static_discovery() {
    let mut mock = RpcMockBuilder::new().await;
    for (name, address) in sepolia_fallback() {
        let code: &[u8] = if name == ContractName::Lottery { &[] } else { DEPLOYED_CODE };
        mock.mock_get_code(address, code);
    }

    let session = session_for(test_config(&mock.url()));
    let outcome = session.start().await.unwrap();

    let PassOutcome::Degraded(report) = outcome else {
        panic!("expected degraded pass");
    };
    assert_eq!(report.summary.status, HealthStatus::Warning);
    assert_eq!(report.summary.valid_count, ContractName::ALL.len() - 1);
    // The static table is what is already in use, so discovery has nothing new.
    assert!(report.discovery_error.is_none());

    let lottery = report.results.iter().find(|r| r.name == ContractName::Lottery).unwrap();
    assert_eq!(lottery.reason, Some(InvalidReason::NoCodeAtAddress));
    assert_eq!(session.health().current().summary.status, HealthStatus::Warning);

    session.teardown().await;
}

#[tokio::test]
async fn test_event_log_discovery_repairs_registry() {
    let mut mock = RpcMockBuilder::new().await;
    for (name, address) in sepolia_fallback() {
        let code: &[u8] = if name == ContractName::Lottery { &[] } else { DEPLOYED_CODE };
        mock.mock_get_code(address, code);
    }
    mock.mock_get_code(NEW_LOTTERY, DEPLOYED_CODE);
    mock.mock_block_number(60_000);
    mock.mock_get_logs(&[deployment_log(ANNOUNCER, "LotteryContract", NEW_LOTTERY, 59_000, 0)]);

    let mut config = test_config(&mock.url());
    config.discovery.mode = DiscoveryMode::EventLog;
    config.discovery.announcer = Some(format!("{ANNOUNCER:#x}"));
    let session = session_for(config);

    let mut health = session.health().watch();
    let outcome = session.start().await.unwrap();
    assert_eq!(outcome, PassOutcome::ReloadPending { changed: vec![ContractName::Lottery] });
    // Nothing is published while a reload is pending.
    assert_eq!(session.health().current().summary.status, HealthStatus::Loading);

    tokio::time::timeout(Duration::from_secs(5), health.wait_for(|s| s.summary.status == HealthStatus::Healthy))
        .await
        .expect("reload did not finish in time")
        .unwrap();

    let registry = session.resolver().get_all();
    let lottery = registry.get(ContractName::Lottery).unwrap();
    assert_eq!(lottery.address, NEW_LOTTERY);
    assert_eq!(lottery.source, AddressSource::Override);
    assert_eq!(session.resolver().overrides().len(), 1);

    session.teardown().await;
}

#[tokio::test]
async fn test_update_schedules_reload_against_new_address() {
    let mut mock = RpcMockBuilder::new().await;
    deploy_fallback(&mut mock);
    mock.mock_get_code(NEW_LOTTERY, DEPLOYED_CODE);

    let session = session_for(test_config(&mock.url()));
    session.start().await.unwrap();

    let mut health = session.health().watch();
    health.borrow_and_update();

    let mut edits = BTreeMap::new();
    edits.insert(ContractName::Lottery, format!("{NEW_LOTTERY:#x}"));
    edits.insert(ContractName::Governance, "not-an-address".to_string());
    let report = session.resolver().update(&edits).unwrap();
    assert_eq!(report.applied, vec![ContractName::Lottery]);
    assert_eq!(report.errors.len(), 1);

    tokio::time::timeout(Duration::from_secs(5), health.changed()).await.unwrap().unwrap();

    let state = session.health().current();
    let lottery = state.results.iter().find(|r| r.name == ContractName::Lottery).unwrap();
    assert_eq!(lottery.address, NEW_LOTTERY);
    assert!(lottery.valid);
    assert_eq!(session.resolver().resolve(ContractName::Governance), fallback(ContractName::Governance));

    session.teardown().await;
}

#[tokio::test]
async fn test_overrides_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    let mut mock = RpcMockBuilder::new().await;
    deploy_fallback(&mut mock);

    let build = |url: &str| {
        SessionBuilder::new()
            .with_config(test_config(url))
            .with_store(Arc::new(FileStore::open(&path).unwrap()))
            .with_runtime_defaults(RuntimeDefaults::default())
            .build()
            .unwrap()
    };

    let first = build(&mock.url());
    let mut edits = BTreeMap::new();
    edits.insert(ContractName::Lottery, format!("{NEW_LOTTERY:#x}"));
    first.resolver().update(&edits).unwrap();
    first.teardown().await;

    let second = build(&mock.url());
    assert_eq!(second.resolver().resolve(ContractName::Lottery), NEW_LOTTERY);
    second.resolver().reset(&[ContractName::Lottery]).unwrap();
    assert_eq!(second.resolver().resolve(ContractName::Lottery), fallback(ContractName::Lottery));

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get(&ContractName::Lottery.storage_key()).unwrap(), None);
    second.teardown().await;
}

#[tokio::test]
async fn test_teardown_discards_in_flight_pass() {
    let mut mock = RpcMockBuilder::new().await;
    deploy_fallback(&mut mock);

    let session = Arc::new(session_for(test_config(&mock.url())));
    let running = Arc::clone(&session);
    let pass = tokio::spawn(async move { running.start().await });

    session.teardown().await;
    let outcome = pass.await.unwrap().unwrap();

    // Either the pass finished before teardown or it was discarded.
    if outcome == PassOutcome::Cancelled {
        assert_eq!(session.health().current().summary.status, HealthStatus::Loading);
    }
    assert!(session.coordinator().is_cancelled());
}

#[tokio::test]
async fn test_unreachable_node_reports_probe_failed() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_server_error();

    let session = session_for(test_config(&mock.url()));
    let outcome = session.start().await.unwrap();

    let PassOutcome::Degraded(report) = outcome else {
        panic!("expected degraded pass");
    };
    assert_eq!(report.summary.status, HealthStatus::Error);
    assert!(report.results.iter().all(|r| r.reason == Some(InvalidReason::ProbeFailed)));
    assert!(report.results.iter().all(|r| r.detail.is_some()));

    session.teardown().await;
}

#[tokio::test]
async fn test_rpc_error_on_one_probe_is_isolated() {
    let mut mock = RpcMockBuilder::new().await;
    for (name, address) in sepolia_fallback() {
        if name == ContractName::StatusNft {
            mock.mock_get_code_error(address, -32603, "internal error");
        } else {
            mock.mock_get_code(address, DEPLOYED_CODE);
        }
    }

    let session = session_for(test_config(&mock.url()));
    let PassOutcome::Degraded(report) = session.start().await.unwrap() else {
        panic!("expected degraded pass");
    };

    assert_eq!(report.summary.status, HealthStatus::Warning);
    for result in &report.results {
        if result.name == ContractName::StatusNft {
            assert_eq!(result.reason, Some(InvalidReason::ProbeFailed));
        } else {
            assert!(result.valid);
        }
    }

    session.teardown().await;
}
