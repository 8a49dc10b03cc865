//! Pure calculators over values read through the registry.
//!
//! Nothing here performs I/O. Results computed while registry health is `Error` are
//! still returned but flagged untrustworthy by [`LotterySnapshot`].

pub mod eligibility;
pub mod probability;
pub mod snapshot;
pub mod tiers;

pub use eligibility::{eligible, ParticipantEligibility};
#[allow(deprecated)]
pub use probability::legacy_share;
pub use probability::{probability_share, probability_shares, ProbabilityShare};
pub use snapshot::{LotteryInputs, LotterySnapshot, ThresholdSource};
pub use tiers::{
    format_tokens, tier_for, whole_tokens, MembershipStanding, MembershipTier, MembershipTierTable, Tier,
};
