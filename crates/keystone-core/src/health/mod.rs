//! Deployment probing and health aggregation.

pub mod aggregator;
pub mod probe;

pub use aggregator::{HealthAggregator, HealthStatus, HealthSummary};
pub use probe::{DeploymentProbe, InvalidReason, ProbeError, ValidationResult};
