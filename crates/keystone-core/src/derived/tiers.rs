use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Result of [`tier_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Tier {
    /// Below every threshold.
    Base,
    /// `thresholds[index]` is the highest threshold not exceeding the balance.
    Reached { index: usize, threshold: U256 },
}

/// Highest threshold in an ascending list that `balance` meets, or [`Tier::Base`].
#[must_use]
pub fn tier_for(balance: U256, thresholds: &[U256]) -> Tier {
    thresholds
        .iter()
        .enumerate()
        .rev()
        .find(|(_, threshold)| balance >= **threshold)
        .map_or(Tier::Base, |(index, threshold)| Tier::Reached { index, threshold: *threshold })
}

/// A named membership level, threshold in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipTier {
    pub name: String,
    pub threshold: u64,
}

impl MembershipTier {
    #[must_use]
    pub fn new(name: impl Into<String>, threshold: u64) -> Self {
        Self { name: name.into(), threshold }
    }
}

/// Where a balance sits in the membership table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipStanding {
    pub tier_name: String,
    pub tier: Tier,
    /// Next tier's name, `None` at the top.
    pub next_tier: Option<String>,
    /// `min(100, floor(balance / target * 100))` where the target is the next threshold,
    /// or the top threshold once it has been reached.
    pub progress_percent: u8,
}

/// Ordered membership tiers over a base level, in whole-token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipTierTable {
    base_name: String,
    tiers: Vec<MembershipTier>,
    decimals: u8,
}

impl Default for MembershipTierTable {
    fn default() -> Self {
        Self::new(
            "Member",
            vec![
                MembershipTier::new("Bronze", 100),
                MembershipTier::new("Silver", 500),
                MembershipTier::new("Gold", 1_000),
                MembershipTier::new("Platinum", 5_000),
                MembershipTier::new("Diamond", 10_000),
            ],
            18,
        )
    }
}

impl MembershipTierTable {
    /// `tiers` must be sorted by ascending threshold; configuration validation enforces it.
    #[must_use]
    pub fn new(base_name: impl Into<String>, tiers: Vec<MembershipTier>, decimals: u8) -> Self {
        Self { base_name: base_name.into(), tiers, decimals }
    }

    #[must_use]
    pub fn tiers(&self) -> &[MembershipTier] {
        &self.tiers
    }

    #[must_use]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Thresholds converted to base units.
    #[must_use]
    pub fn thresholds(&self) -> Vec<U256> {
        self.tiers.iter().map(|t| whole_tokens(t.threshold, self.decimals)).collect()
    }

    #[must_use]
    pub fn standing(&self, balance: U256) -> MembershipStanding {
        let thresholds = self.thresholds();
        let tier = tier_for(balance, &thresholds);

        let (tier_name, next_index) = match tier {
            Tier::Base => (self.base_name.clone(), 0),
            Tier::Reached { index, .. } => (self.tiers[index].name.clone(), index + 1),
        };
        let next_tier = self.tiers.get(next_index).map(|t| t.name.clone());
        let target = thresholds.get(next_index).or_else(|| thresholds.last()).copied();

        let progress_percent = match target {
            Some(target) if !target.is_zero() => {
                let percent = balance.saturating_mul(U256::from(100u64)) / target;
                percent.min(U256::from(100u64)).as_limbs()[0] as u8
            }
            _ => 100,
        };

        MembershipStanding { tier_name, tier, next_tier, progress_percent }
    }
}

/// `amount * 10^decimals`.
#[must_use]
pub fn whole_tokens(amount: u64, decimals: u8) -> U256 {
    U256::from(amount).saturating_mul(U256::from(10u64).pow(U256::from(decimals)))
}

/// Formats a base-unit amount as a decimal token string with at most four fraction digits.
#[must_use]
pub fn format_tokens(amount: U256, decimals: u8) -> String {
    let unit = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction.is_zero() || decimals == 0 {
        return whole.to_string();
    }
    let raw = fraction.to_string();
    let digits = format!("{raw:0>width$}", width = decimals as usize);
    let trimmed = digits[..digits.len().min(4)].trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{trimmed}")
    }
}
