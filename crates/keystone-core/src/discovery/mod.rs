//! Replacement-address discovery for an unhealthy registry.
//!
//! Two sources implement [`DeploymentDiscovery`]:
//!
//! - [`StaticFallbackDiscovery`] returns a known deployment table
//! - [`EventLogDiscovery`] scans recent blocks for deployment announcements
//!
//! [`diff`] decides whether applying a candidate set would change anything.

pub mod event_log;

pub use event_log::EventLogDiscovery;

use async_trait::async_trait;
use thiserror::Error;

use crate::{chain::RpcError, registry::CandidateSet, types::ContractName};

/// Errors raised by a discovery source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// Discovery ran but produced nothing usable.
    #[error("no deployment candidates found")]
    NoCandidatesFound,

    #[error("discovery read failed: {0}")]
    Rpc(#[from] RpcError),

    /// The source cannot run against this endpoint.
    #[error("discovery unsupported: {0}")]
    Unsupported(String),
}

/// Produces a candidate registry when the current one fails validation.
#[async_trait]
pub trait DeploymentDiscovery: Send + Sync {
    /// Short label for logs and CLI output.
    fn name(&self) -> &'static str;

    /// Returns candidate addresses. Names absent from the result are left alone.
    async fn discover(&self) -> Result<CandidateSet, DiscoveryError>;
}

/// Discovery backed by a fixed deployment table.
#[derive(Debug, Clone)]
pub struct StaticFallbackDiscovery {
    table: CandidateSet,
}

impl StaticFallbackDiscovery {
    #[must_use]
    pub fn new(table: CandidateSet) -> Self {
        Self { table }
    }
}

#[async_trait]
impl DeploymentDiscovery for StaticFallbackDiscovery {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn discover(&self) -> Result<CandidateSet, DiscoveryError> {
        if self.table.is_empty() {
            return Err(DiscoveryError::NoCandidatesFound);
        }
        Ok(self.table.clone())
    }
}

/// Names whose candidate address differs from the current one.
///
/// Zero-address candidates are never proposed; replacing something with the sentinel
/// cannot make the registry healthier.
#[must_use]
pub fn diff(current: &CandidateSet, candidate: &CandidateSet) -> Vec<ContractName> {
    candidate
        .iter()
        .filter(|(_, address)| !address.is_zero())
        .filter(|(name, address)| current.get(name) != Some(address))
        .map(|(name, _)| *name)
        .collect()
}
