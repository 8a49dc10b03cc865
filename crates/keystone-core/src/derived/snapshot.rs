use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::{
    derived::{
        eligibility::ParticipantEligibility,
        probability::{probability_share, probability_shares, ProbabilityShare},
        tiers::{MembershipStanding, MembershipTierTable},
    },
    health::HealthSummary,
};

/// Where the eligibility threshold came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// Read from the governance contract.
    Contract,
    /// Configured default, used when the contract read failed.
    Default,
}

/// Raw values read from chain for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryInputs {
    pub account: Address,
    pub balance: U256,
    pub threshold: U256,
    pub threshold_source: ThresholdSource,
    /// Latest proposal, `None` when no proposal exists yet.
    pub proposal_id: Option<u8>,
    /// Eligible participants of the latest proposal with their governance balances.
    pub participants: Vec<(Address, U256)>,
    pub pool_amount: U256,
}

/// Everything a lottery view shows for one account, computed from one set of reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotterySnapshot {
    pub account: Address,
    pub proposal_id: Option<u8>,
    pub pool_amount: U256,
    pub balance: U256,
    pub threshold: U256,
    pub threshold_source: ThresholdSource,
    pub eligibility: ParticipantEligibility,
    pub membership: MembershipStanding,
    pub total_staked: U256,
    pub participants: Vec<ProbabilityShare>,
    /// The account's normalized share against the current participants' stake.
    pub account_share_percent: f64,
    /// `false` when registry health is `Error`; values may then come from wrong or
    /// missing contracts.
    pub trustworthy: bool,
}

impl LotterySnapshot {
    #[must_use]
    pub fn assemble(inputs: LotteryInputs, tiers: &MembershipTierTable, health: &HealthSummary) -> Self {
        let participants = probability_shares(&inputs.participants);
        let total_staked =
            inputs.participants.iter().fold(U256::ZERO, |acc, (_, balance)| acc.saturating_add(*balance));
        let account_share_percent = participants
            .iter()
            .find(|share| share.address == inputs.account)
            .map_or_else(|| probability_share(inputs.balance, total_staked), |share| share.share_percent);

        Self {
            account: inputs.account,
            proposal_id: inputs.proposal_id,
            pool_amount: inputs.pool_amount,
            balance: inputs.balance,
            threshold: inputs.threshold,
            threshold_source: inputs.threshold_source,
            eligibility: ParticipantEligibility::evaluate(inputs.account, inputs.balance, inputs.threshold),
            membership: tiers.standing(inputs.balance),
            total_staked,
            participants,
            account_share_percent,
            trustworthy: health.is_trustworthy(),
        }
    }
}
