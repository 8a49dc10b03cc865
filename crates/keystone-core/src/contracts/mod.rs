//! Typed read entry points of the DAO contracts.
//!
//! Every read resolves its target through the [`AddressResolver`] at call time. A
//! contract resolved to the zero sentinel is never called; the read degrades to the
//! zero or empty value instead.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    chain::{
        abi::{decode_returns, IGovToken, IGovernance, ILottery},
        ChainReader, RpcError,
    },
    derived::{LotteryInputs, LotterySnapshot, MembershipTierTable, ThresholdSource},
    health::HealthSummary,
    registry::{address::is_zero, AddressResolver},
    types::ContractName,
};

/// Read-only client for the governance token, governance and lottery contracts.
#[derive(Clone)]
pub struct DaoReader {
    chain: Arc<dyn ChainReader>,
    resolver: Arc<AddressResolver>,
}

impl DaoReader {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainReader>, resolver: Arc<AddressResolver>) -> Self {
        Self { chain, resolver }
    }

    /// Issues `call` against the contract `name` resolves to. `Ok(None)` means the
    /// contract is unset and no call was made.
    async fn read<C>(&self, name: ContractName, call: C) -> Result<Option<C::Return>, RpcError>
    where
        C: SolCall + Send,
    {
        let address = self.resolver.resolve(name);
        if is_zero(&address) {
            debug!(contract = %name, method = C::SIGNATURE, "contract unset, skipping read");
            return Ok(None);
        }
        let data = self.chain.call(address, Bytes::from(call.abi_encode())).await?;
        decode_returns::<C>(&data).map(Some)
    }

    /// Governance token balance of `holder`, in base units.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, RpcError> {
        let ret = self.read(ContractName::GovToken, IGovToken::balanceOfCall { account: holder }).await?;
        Ok(ret.map_or(U256::ZERO, |r| r._0))
    }

    /// Minimum governance balance for lottery eligibility.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn threshold(&self) -> Result<U256, RpcError> {
        let ret = self.read(ContractName::Governance, IGovernance::THRESHOLDCall {}).await?;
        Ok(ret.map_or(U256::ZERO, |r| r._0))
    }

    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn proposal_count(&self) -> Result<U256, RpcError> {
        let ret = self.read(ContractName::Governance, IGovernance::getProposalCountCall {}).await?;
        Ok(ret.map_or(U256::ZERO, |r| r._0))
    }

    /// Addresses eligible for the draw of `proposal_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn eligible_for_lottery(&self, proposal_id: u8) -> Result<Vec<Address>, RpcError> {
        let call = IGovernance::getEligibleForLotteryCall { proposalId: proposal_id };
        let ret = self.read(ContractName::Governance, call).await?;
        Ok(ret.map(|r| r._0).unwrap_or_default())
    }

    /// Unix timestamp at which `member` joined, zero if never.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn member_since(&self, member: Address) -> Result<U256, RpcError> {
        let ret = self.read(ContractName::Governance, IGovernance::getMemberSinceCall { member }).await?;
        Ok(ret.map_or(U256::ZERO, |r| r._0))
    }

    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn has_user_voted(&self, proposal_id: u8, voter: Address) -> Result<bool, RpcError> {
        let call = IGovernance::hasUserVotedCall { proposalId: proposal_id, voter };
        let ret = self.read(ContractName::Governance, call).await?;
        Ok(ret.is_some_and(|r| r._0))
    }

    /// Reward pool of the draw for `proposal_id`, in reward token base units.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the call fails or returns malformed data.
    pub async fn pool_amount(&self, proposal_id: u8) -> Result<U256, RpcError> {
        let ret = self.read(ContractName::Lottery, ILottery::getPoolAmountCall { proposalId: proposal_id }).await?;
        Ok(ret.map_or(U256::ZERO, |r| r._0))
    }

    /// Reads everything the lottery view needs for `account` and assembles it.
    ///
    /// The latest proposal is `getProposalCount() - 1`. An unreadable `THRESHOLD` falls
    /// back to `default_threshold` (base units).
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when any read other than the threshold fails.
    pub async fn lottery_snapshot(
        &self,
        account: Address,
        tiers: &MembershipTierTable,
        default_threshold: U256,
        health: &HealthSummary,
    ) -> Result<LotterySnapshot, RpcError> {
        let balance = self.balance_of(account).await?;

        let (threshold, threshold_source) = match self.threshold().await {
            Ok(value) if !value.is_zero() => (value, ThresholdSource::Contract),
            Ok(_) => (default_threshold, ThresholdSource::Default),
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "threshold unreadable, using configured default");
                (default_threshold, ThresholdSource::Default)
            }
        };

        let count = self.proposal_count().await?;
        let proposal_id = if count.is_zero() {
            None
        } else {
            let latest = count - U256::from(1u64);
            Some(u8::try_from(latest.min(U256::from(u8::MAX))).unwrap_or(u8::MAX))
        };

        let (participants, pool_amount) = match proposal_id {
            Some(id) => {
                let addresses = self.eligible_for_lottery(id).await?;
                let balances = try_join_all(addresses.iter().map(|a| self.balance_of(*a))).await?;
                let pool = self.pool_amount(id).await?;
                (addresses.into_iter().zip(balances).collect(), pool)
            }
            None => (Vec::new(), U256::ZERO),
        };

        let inputs = LotteryInputs {
            account,
            balance,
            threshold,
            threshold_source,
            proposal_id,
            participants,
            pool_amount,
        };
        Ok(LotterySnapshot::assemble(inputs, tiers, health))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::MockChainReader,
        derived::whole_tokens,
        health::HealthStatus,
        registry::{sepolia_fallback, CandidateSet, RuntimeDefaults},
        store::MemoryStore,
    };

    fn reader(chain: Arc<MockChainReader>, fallback: CandidateSet) -> DaoReader {
        let resolver =
            Arc::new(AddressResolver::new(Arc::new(MemoryStore::new()), RuntimeDefaults::default(), fallback));
        DaoReader::new(chain, resolver)
    }

    fn gov(name: ContractName) -> Address {
        sepolia_fallback()[&name]
    }

    fn healthy() -> HealthSummary {
        HealthSummary { status: HealthStatus::Healthy, valid_count: 6, total_count: 6 }
    }

    /// Scripts `call` against `name` to return `ret`.
    fn script<C: SolCall>(chain: &MockChainReader, name: ContractName, call: &C, ret: Vec<u8>) {
        chain.set_call(gov(name), Bytes::from(call.abi_encode()), Ok(Bytes::from(ret)));
    }

    fn script_balance(chain: &MockChainReader, account: Address, amount: U256) {
        script(
            chain,
            ContractName::GovToken,
            &IGovToken::balanceOfCall { account },
            IGovToken::balanceOfCall::abi_encode_returns(&(amount,)),
        );
    }

    fn script_uint<C: SolCall>(chain: &MockChainReader, name: ContractName, call: &C, value: U256) {
        script(chain, name, call, value.to_be_bytes::<32>().to_vec());
    }

    #[tokio::test]
    async fn test_zero_address_degrades_without_call() {
        let chain = Arc::new(MockChainReader::new());
        let reader = reader(chain.clone(), CandidateSet::new());

        assert_eq!(reader.balance_of(Address::with_last_byte(1)).await.unwrap(), U256::ZERO);
        assert!(reader.eligible_for_lottery(0).await.unwrap().is_empty());
        assert!(!reader.has_user_voted(0, Address::with_last_byte(1)).await.unwrap());
        assert_eq!(chain.call_calls(), 0);
    }

    #[tokio::test]
    async fn test_typed_reads_decode_return_data() {
        let chain = Arc::new(MockChainReader::new());
        let holder = Address::with_last_byte(7);
        script_balance(&chain, holder, U256::from(1234u64));
        script(
            &chain,
            ContractName::Governance,
            &IGovernance::hasUserVotedCall { proposalId: 3, voter: holder },
            IGovernance::hasUserVotedCall::abi_encode_returns(&(true,)),
        );
        script_uint(
            &chain,
            ContractName::Governance,
            &IGovernance::getMemberSinceCall { member: holder },
            U256::from(1_700_000_000u64),
        );
        let reader = reader(chain, sepolia_fallback());

        assert_eq!(reader.balance_of(holder).await.unwrap(), U256::from(1234u64));
        assert!(reader.has_user_voted(3, holder).await.unwrap());
        assert_eq!(reader.member_since(holder).await.unwrap(), U256::from(1_700_000_000u64));
    }

    #[tokio::test]
    async fn test_malformed_return_data_is_invalid_response() {
        let chain = Arc::new(MockChainReader::new());
        script(&chain, ContractName::Governance, &IGovernance::THRESHOLDCall {}, vec![1]);
        let reader = reader(chain, sepolia_fallback());

        assert!(matches!(reader.threshold().await, Err(RpcError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_lottery_snapshot() {
        let chain = Arc::new(MockChainReader::new());
        let account = Address::with_last_byte(1);
        let other = Address::with_last_byte(2);
        let token = |n: u64| whole_tokens(n, 18);

        script_balance(&chain, account, token(600));
        script_balance(&chain, other, token(1_400));
        script_uint(&chain, ContractName::Governance, &IGovernance::getProposalCountCall {}, U256::from(3u64));
        script(
            &chain,
            ContractName::Governance,
            &IGovernance::getEligibleForLotteryCall { proposalId: 2 },
            IGovernance::getEligibleForLotteryCall::abi_encode_returns(&(vec![account, other],)),
        );
        script_uint(&chain, ContractName::Lottery, &ILottery::getPoolAmountCall { proposalId: 2 }, token(50));
        // THRESHOLD is left unscripted and reverts.

        let reader = reader(chain, sepolia_fallback());
        let snapshot = reader
            .lottery_snapshot(account, &MembershipTierTable::default(), token(10), &healthy())
            .await
            .unwrap();

        assert_eq!(snapshot.proposal_id, Some(2));
        assert_eq!(snapshot.threshold, token(10));
        assert_eq!(snapshot.threshold_source, ThresholdSource::Default);
        assert!(snapshot.eligibility.threshold_met);
        assert_eq!(snapshot.pool_amount, token(50));
        assert_eq!(snapshot.total_staked, token(2_000));
        assert_eq!(snapshot.account_share_percent, 30.0);
        assert_eq!(snapshot.membership.tier_name, "Silver");
        assert!(snapshot.trustworthy);
    }

    #[tokio::test]
    async fn test_lottery_snapshot_without_proposals() {
        let chain = Arc::new(MockChainReader::new());
        let account = Address::with_last_byte(1);
        script_uint(&chain, ContractName::Governance, &IGovernance::getProposalCountCall {}, U256::ZERO);
        script_uint(&chain, ContractName::Governance, &IGovernance::THRESHOLDCall {}, U256::from(10u64));
        script_balance(&chain, account, U256::ZERO);

        let snapshot = reader(chain, sepolia_fallback())
            .lottery_snapshot(account, &MembershipTierTable::default(), U256::from(99u64), &healthy())
            .await
            .unwrap();

        assert_eq!(snapshot.proposal_id, None);
        assert_eq!(snapshot.threshold_source, ThresholdSource::Contract);
        assert!(snapshot.participants.is_empty());
        assert_eq!(snapshot.account_share_percent, 0.0);
        assert!(!snapshot.eligibility.threshold_met);
    }
}
