use serde::Serialize;
use std::fmt;

use crate::health::ValidationResult;

/// Aggregate deployment health of the whole registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No pass has completed yet.
    #[default]
    Loading,
    Healthy,
    Warning,
    Error,
}

impl HealthStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HealthSummary {
    pub status: HealthStatus,
    pub valid_count: usize,
    pub total_count: usize,
}

impl HealthSummary {
    /// Derived state read through the registry is only trustworthy when at least one
    /// deployment checked out.
    #[must_use]
    pub fn is_trustworthy(&self) -> bool {
        self.status != HealthStatus::Error
    }
}

/// Reduces probe results to a [`HealthSummary`].
pub struct HealthAggregator;

impl HealthAggregator {
    /// `Healthy` when every entry is valid, `Warning` when some are, `Error` when none
    /// are. An empty result set is `Loading`.
    #[must_use]
    pub fn compute(results: &[ValidationResult]) -> HealthSummary {
        let total_count = results.len();
        let valid_count = results.iter().filter(|r| r.valid).count();

        let status = if total_count == 0 {
            HealthStatus::Loading
        } else if valid_count == total_count {
            HealthStatus::Healthy
        } else if valid_count == 0 {
            HealthStatus::Error
        } else {
            HealthStatus::Warning
        };

        HealthSummary { status, valid_count, total_count }
    }
}
