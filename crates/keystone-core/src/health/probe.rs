use alloy_primitives::Address;
use futures::future::join_all;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    chain::{ChainReader, RpcError},
    registry::{address::is_zero, ContractRegistry},
    types::ContractName,
};

/// Failure of a single deployment probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProbeError {
    /// The node could not be asked. Says nothing about whether code exists.
    #[error("probe failed: {0}")]
    NetworkFailure(#[from] RpcError),

    /// The node answered and the account holds no code.
    #[error("no code at address")]
    NoCodeAtAddress,

    /// The probe did not complete within the configured timeout.
    #[error("probe timed out")]
    Timeout,
}

/// Why an entry failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// The address is the zero sentinel; no probe was issued.
    Empty,
    /// The node reported no bytecode at the address.
    NoCodeAtAddress,
    /// The probe itself failed (transport, RPC error or timeout).
    ProbeFailed,
}

impl InvalidReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NoCodeAtAddress => "no_code_at_address",
            Self::ProbeFailed => "probe_failed",
        }
    }
}

/// Result of probing one registry entry. Produced fresh on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub name: ContractName,
    pub address: Address,
    pub valid: bool,
    pub reason: Option<InvalidReason>,
    /// Bytecode length in bytes when the probe succeeded.
    pub code_len: Option<usize>,
    /// Error text for failed probes.
    pub detail: Option<String>,
}

impl ValidationResult {
    fn valid(name: ContractName, address: Address, code_len: usize) -> Self {
        Self { name, address, valid: true, reason: None, code_len: Some(code_len), detail: None }
    }

    fn invalid(name: ContractName, address: Address, reason: InvalidReason, detail: Option<String>) -> Self {
        Self { name, address, valid: false, reason: Some(reason), code_len: None, detail }
    }
}

/// Checks whether bytecode exists at each registry address.
#[derive(Clone)]
pub struct DeploymentProbe {
    chain: Arc<dyn ChainReader>,
    timeout: Option<Duration>,
}

impl DeploymentProbe {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self { chain, timeout: None }
    }

    /// Bounds every individual probe. A probe exceeding it is reported as `ProbeFailed`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Probes a single address.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::NoCodeAtAddress`] when the account has no code
    /// - [`ProbeError::NetworkFailure`] when the read fails
    /// - [`ProbeError::Timeout`] when the configured timeout elapses
    pub async fn probe(&self, address: Address) -> Result<usize, ProbeError> {
        let read = self.chain.get_code(address);
        let code = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read).await.map_err(|_| ProbeError::Timeout)??,
            None => read.await?,
        };
        if code.is_empty() {
            Err(ProbeError::NoCodeAtAddress)
        } else {
            Ok(code.len())
        }
    }

    /// Probes every entry concurrently.
    ///
    /// Results come back in registry order. One failing entry never affects another;
    /// transport failures are reported as [`InvalidReason::ProbeFailed`], never as
    /// [`InvalidReason::NoCodeAtAddress`].
    pub async fn validate_all(&self, registry: &ContractRegistry) -> Vec<ValidationResult> {
        let probes = registry.iter().map(|(name, entry)| {
            let address = entry.address;
            async move {
                if is_zero(&address) {
                    return ValidationResult::invalid(name, address, InvalidReason::Empty, None);
                }
                match self.probe(address).await {
                    Ok(code_len) => {
                        debug!(contract = %name, address = %address, code_len = code_len, "deployment found");
                        ValidationResult::valid(name, address, code_len)
                    }
                    Err(ProbeError::NoCodeAtAddress) => {
                        warn!(contract = %name, address = %address, "no code at address");
                        ValidationResult::invalid(name, address, InvalidReason::NoCodeAtAddress, None)
                    }
                    Err(e) => {
                        warn!(contract = %name, address = %address, error = %e, "deployment probe failed");
                        ValidationResult::invalid(name, address, InvalidReason::ProbeFailed, Some(e.to_string()))
                    }
                }
            }
        });

        join_all(probes).await
    }
}
