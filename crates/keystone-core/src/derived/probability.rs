use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Fixed-point scale: shares are computed in units of 1e-8 percent.
const SCALE: u64 = 10_000_000_000;
const SCALE_PER_PERCENT: f64 = 100_000_000.0;

/// A participant's normalized chance in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityShare {
    pub address: Address,
    pub balance: U256,
    pub share_percent: f64,
}

/// `balance / total_staked * 100`, clamped to `[0, 100]`. Zero stake yields `0`.
///
/// For a fixed `total_staked` equal to the sum of all participant balances the shares
/// sum to 100 up to floating-point rounding.
#[must_use]
pub fn probability_share(balance: U256, total_staked: U256) -> f64 {
    if total_staked.is_zero() || balance.is_zero() {
        return 0.0;
    }
    if balance >= total_staked {
        return 100.0;
    }

    let scale = U256::from(SCALE);
    let scaled = match balance.checked_mul(scale) {
        Some(numerator) => numerator / total_staked,
        // Only reachable for balances beyond any real token supply.
        None => balance / (total_staked / scale),
    };
    let units = scaled.min(scale).as_limbs()[0];
    (units as f64 / SCALE_PER_PERCENT).clamp(0.0, 100.0)
}

/// Shares for every participant against the sum of their balances.
#[must_use]
pub fn probability_shares(participants: &[(Address, U256)]) -> Vec<ProbabilityShare> {
    let total = participants.iter().fold(U256::ZERO, |acc, (_, balance)| acc.saturating_add(*balance));
    participants
        .iter()
        .map(|(address, balance)| ProbabilityShare {
            address: *address,
            balance: *balance,
            share_percent: probability_share(*balance, total),
        })
        .collect()
}

/// Equal split scaled by `min(balance / 100, 2)`, capped at 100.
///
/// Does not sum to 100 across participants and is not interchangeable with
/// [`probability_share`].
#[deprecated(note = "not normalized across participants; use `probability_share`")]
#[must_use]
pub fn legacy_share(balance_tokens: f64, participant_count: usize) -> f64 {
    match participant_count {
        0 => 0.0,
        1 => 100.0,
        n => {
            let base = 100.0 / n as f64;
            if balance_tokens > 0.0 {
                let multiplier = (balance_tokens / 100.0).min(2.0);
                (base * multiplier).min(100.0)
            } else {
                base
            }
        }
    }
}
