use alloy_primitives::{Address, U256};
use serde::Serialize;

/// `balance >= threshold`.
#[must_use]
pub fn eligible(balance: U256, threshold: U256) -> bool {
    balance >= threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParticipantEligibility {
    pub address: Address,
    pub balance: U256,
    pub threshold_met: bool,
}

impl ParticipantEligibility {
    #[must_use]
    pub fn evaluate(address: Address, balance: U256, threshold: U256) -> Self {
        Self { address, balance, threshold_met: eligible(balance, threshold) }
    }
}
