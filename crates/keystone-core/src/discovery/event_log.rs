use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    chain::{abi::ContractDeployed, ChainReader, LogEntry, LogFilter, RpcError, RpcErrorCategory},
    discovery::{DeploymentDiscovery, DiscoveryError},
    registry::CandidateSet,
    types::ContractName,
};

/// Discovers deployments from `ContractDeployed` announcements in recent blocks.
pub struct EventLogDiscovery {
    chain: Arc<dyn ChainReader>,
    announcer: Option<Address>,
    lookback_blocks: u64,
}

impl EventLogDiscovery {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainReader>, lookback_blocks: u64) -> Self {
        Self { chain, announcer: None, lookback_blocks }
    }

    /// Only accept announcements emitted by `announcer`.
    #[must_use]
    pub fn with_announcer(mut self, announcer: Address) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// Maps an announced name such as `LotteryContract` to a [`ContractName`].
    fn contract_name(announced: &str) -> Option<ContractName> {
        let trimmed = announced.trim();
        let base = trimmed.strip_suffix("Contract").unwrap_or(trimmed);
        base.parse().ok()
    }

    fn decode(log: &LogEntry) -> Option<(ContractName, Address)> {
        let event = ContractDeployed::decode_raw_log(log.topics.iter().copied(), &log.data, true).ok()?;
        let (announced, address) = (event.name, event.contractAddress);
        match Self::contract_name(&announced) {
            Some(name) if !address.is_zero() => Some((name, address)),
            Some(_) => None,
            None => {
                debug!(announced = %announced, "ignoring announcement for unknown contract");
                None
            }
        }
    }
}

#[async_trait]
impl DeploymentDiscovery for EventLogDiscovery {
    fn name(&self) -> &'static str {
        "event_log"
    }

    async fn discover(&self) -> Result<CandidateSet, DiscoveryError> {
        let head = self.chain.block_number().await?;
        let filter = LogFilter {
            from_block: head.saturating_sub(self.lookback_blocks),
            to_block: head,
            address: self.announcer,
            topic0: Some(ContractDeployed::SIGNATURE_HASH),
        };

        let mut logs = self.chain.get_logs(&filter).await.map_err(|e| match e {
            RpcError::Rpc(code, message)
                if RpcErrorCategory::from_code_and_message(code, &message) ==
                    RpcErrorCategory::ClientError =>
            {
                DiscoveryError::Unsupported(format!("eth_getLogs rejected: {message}"))
            }
            other => DiscoveryError::Rpc(other),
        })?;

        // Later announcements supersede earlier ones for the same name.
        logs.sort_by_key(|log| (log.block_number.unwrap_or(0), log.log_index.unwrap_or(0)));
        let candidates: CandidateSet = logs.iter().filter_map(Self::decode).collect();

        info!(
            from_block = filter.from_block,
            to_block = filter.to_block,
            logs = logs.len(),
            candidates = candidates.len(),
            "deployment log scan complete"
        );

        if candidates.is_empty() {
            return Err(DiscoveryError::NoCandidatesFound);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainReader;
    use alloy_primitives::{address, Bytes, U256};

    const ANNOUNCER: Address = address!("00000000000000000000000000000000000a11ce");

    fn log(name: &str, target: Address, block: u64, index: u64) -> LogEntry {
        LogEntry {
            address: ANNOUNCER,
            topics: vec![ContractDeployed::SIGNATURE_HASH],
            data: ContractDeployed {
                name: name.to_string(),
                contractAddress: target,
                timestamp: U256::from(1_700_000_000u64),
            }
            .encode_data()
            .into(),
            block_number: Some(block),
            log_index: Some(index),
        }
    }

    #[test]
    fn test_contract_name_mapping() {
        assert_eq!(EventLogDiscovery::contract_name("LotteryContract"), Some(ContractName::Lottery));
        assert_eq!(EventLogDiscovery::contract_name("GovToken"), Some(ContractName::GovToken));
        assert_eq!(EventLogDiscovery::contract_name("StatusNFT"), Some(ContractName::StatusNft));
        assert_eq!(EventLogDiscovery::contract_name("Treasury"), None);
    }

    #[tokio::test]
    async fn test_latest_announcement_wins() {
        let chain = Arc::new(MockChainReader::new());
        chain.set_block_number(1_000);
        let old = address!("1111111111111111111111111111111111111111");
        let new = address!("2222222222222222222222222222222222222222");
        chain.push_log(log("LotteryContract", new, 900, 3));
        chain.push_log(log("LotteryContract", old, 850, 0));
        chain.push_log(log("GovernanceContract", old, 860, 1));

        let discovery = EventLogDiscovery::new(chain, 500).with_announcer(ANNOUNCER);
        let candidates = discovery.discover().await.unwrap();

        assert_eq!(candidates.get(&ContractName::Lottery), Some(&new));
        assert_eq!(candidates.get(&ContractName::Governance), Some(&old));
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_logs_outside_lookback_are_ignored() {
        let chain = Arc::new(MockChainReader::new());
        chain.set_block_number(1_000);
        chain.push_log(log("LotteryContract", address!("1111111111111111111111111111111111111111"), 10, 0));

        let discovery = EventLogDiscovery::new(chain, 100);
        assert_eq!(discovery.discover().await, Err(DiscoveryError::NoCandidatesFound));
    }

    #[tokio::test]
    async fn test_undecodable_logs_are_skipped() {
        let chain = Arc::new(MockChainReader::new());
        chain.set_block_number(50);
        let mut broken = log("LotteryContract", ANNOUNCER, 40, 0);
        broken.data = Bytes::from_static(&[0x01, 0x02]);
        chain.push_log(broken);

        let discovery = EventLogDiscovery::new(chain, 100);
        assert_eq!(discovery.discover().await, Err(DiscoveryError::NoCandidatesFound));
    }

    #[tokio::test]
    async fn test_foreign_event_is_skipped() {
        let chain = Arc::new(MockChainReader::new());
        chain.set_block_number(50);
        let mut foreign = log("LotteryContract", address!("1111111111111111111111111111111111111111"), 40, 0);
        foreign.topics = vec![alloy_primitives::keccak256("Transfer(address,address,uint256)")];
        chain.push_log(foreign);

        let discovery = EventLogDiscovery::new(chain, 100);
        assert_eq!(discovery.discover().await, Err(DiscoveryError::NoCandidatesFound));
    }

    #[tokio::test]
    async fn test_method_not_found_is_unsupported() {
        let chain = Arc::new(MockChainReader::new());
        chain.fail_logs(RpcError::Rpc(-32601, "the method eth_getLogs does not exist".into()));

        let discovery = EventLogDiscovery::new(chain, 100);
        assert!(matches!(discovery.discover().await, Err(DiscoveryError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_rpc_error() {
        let chain = Arc::new(MockChainReader::new());
        chain.fail_logs(RpcError::Timeout);

        let discovery = EventLogDiscovery::new(chain, 100);
        assert_eq!(discovery.discover().await, Err(DiscoveryError::Rpc(RpcError::Timeout)));
    }
}
