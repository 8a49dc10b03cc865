//! Validation passes, discovery-driven repair and debounced reloads.
//!
//! A pass walks `Idle → Probing → {Healthy | Discovering} → Idle`:
//!
//! 1. probe every resolved address and aggregate the results
//! 2. when healthy, publish and record the one-time ready marker
//! 3. otherwise ask discovery for candidates; if any differ from the current registry
//!    they are persisted and a single reload is scheduled, and nothing is published
//! 4. if discovery has nothing new, publish the degraded health with diagnostics
//!
//! Only one pass runs at a time; a trigger arriving mid-pass is coalesced. Teardown
//! cancels the session token and any pass still awaiting the chain drops its results.

pub mod debounce;
pub mod subscription;

pub use debounce::{ReloadReceiver, ReloadScheduler, ReloadTicket};
pub use subscription::{HealthBroadcaster, HealthState, Subscription};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    discovery::{diff, DeploymentDiscovery},
    health::{DeploymentProbe, HealthAggregator, HealthStatus, HealthSummary, ValidationResult},
    registry::{AddressResolver, CandidateSet, UpdateReport},
    store::{KeyValueStore, StoreError},
    types::ContractName,
};

/// Key of the one-time "contracts ready" marker.
pub const READY_MARKER_KEY: &str = "contract_ready_shown";

/// Errors raised while persisting repairs or scheduling a reload.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReloadError {
    #[error("failed to persist registry change: {0}")]
    Persistence(#[from] StoreError),

    /// Some overrides were persisted before the store failed. The cache was still
    /// invalidated and a reload requested for the ones in `report.applied`.
    #[error("store failed after persisting {} override(s): {source}", .report.applied.len())]
    PartialWrite { report: Box<UpdateReport>, source: StoreError },

    #[error("no async runtime available to schedule a reload")]
    SchedulerUnavailable,
}

/// Where the coordinator currently is within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    #[default]
    Idle,
    Probing,
    Discovering,
}

/// Health details surfaced when discovery could not repair the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedReport {
    pub summary: HealthSummary,
    pub results: Vec<ValidationResult>,
    /// Why discovery produced nothing usable, when it failed outright.
    pub discovery_error: Option<String>,
}

/// How a pass ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Every deployment checked out. `ready_notice` is `true` the first time this
    /// happens for the current identity.
    Healthy { summary: HealthSummary, ready_notice: bool },
    /// Discovery found replacements; they were persisted and a reload is scheduled.
    ReloadPending { changed: Vec<ContractName> },
    /// Unhealthy and nothing new to try.
    Degraded(DegradedReport),
    /// Another pass was already running.
    Coalesced,
    /// The session was torn down before the pass could publish.
    Cancelled,
}

impl PassOutcome {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy { .. } => "healthy",
            Self::ReloadPending { .. } => "reload_pending",
            Self::Degraded(_) => "degraded",
            Self::Coalesced => "coalesced",
            Self::Cancelled => "cancelled",
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates probe → aggregate → discover → persist.
pub struct ReloadCoordinator {
    resolver: Arc<AddressResolver>,
    probe: DeploymentProbe,
    discovery: Arc<dyn DeploymentDiscovery>,
    store: Arc<dyn KeyValueStore>,
    health: HealthBroadcaster,
    state: RwLock<PassState>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
    identity: RwLock<Option<String>>,
}

impl ReloadCoordinator {
    #[must_use]
    pub fn new(
        resolver: Arc<AddressResolver>,
        probe: DeploymentProbe,
        discovery: Arc<dyn DeploymentDiscovery>,
        store: Arc<dyn KeyValueStore>,
        health: HealthBroadcaster,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            probe,
            discovery,
            store,
            health,
            state: RwLock::new(PassState::Idle),
            in_flight: AtomicBool::new(false),
            cancel,
            identity: RwLock::new(None),
        }
    }

    /// Sets the connected identity the ready marker is recorded against.
    pub fn set_identity(&self, identity: Option<String>) {
        *self.identity.write() = identity.map(|id| id.to_lowercase());
    }

    #[must_use]
    pub fn state(&self) -> PassState {
        *self.state.read()
    }

    #[must_use]
    pub fn health(&self) -> &HealthBroadcaster {
        &self.health
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs one validation pass.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError`] if discovered candidates cannot be persisted or the
    /// follow-up reload cannot be scheduled.
    pub async fn run_pass(&self) -> Result<PassOutcome, ReloadError> {
        if self.cancel.is_cancelled() {
            return Ok(PassOutcome::Cancelled);
        }
        if self.in_flight.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            debug!("validation pass already in flight, coalescing trigger");
            return Ok(PassOutcome::Coalesced);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let outcome = self.execute_pass().await;
        *self.state.write() = PassState::Idle;
        outcome
    }

    /// Drops the cached registry and runs a fresh pass. This is the only path that
    /// re-probes after a failed probe.
    ///
    /// # Errors
    ///
    /// See [`run_pass`](Self::run_pass).
    pub async fn retry(&self) -> Result<PassOutcome, ReloadError> {
        info!("manual retry requested");
        self.resolver.invalidate();
        self.run_pass().await
    }

    /// Cancels the session. Passes still in flight discard their results.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    async fn execute_pass(&self) -> Result<PassOutcome, ReloadError> {
        *self.state.write() = PassState::Probing;
        let registry = self.resolver.get_all();
        let results = self.probe.validate_all(&registry).await;

        if self.cancel.is_cancelled() {
            debug!("session torn down during probing, discarding results");
            return Ok(PassOutcome::Cancelled);
        }

        let summary = HealthAggregator::compute(&results);
        info!(
            status = %summary.status,
            valid = summary.valid_count,
            total = summary.total_count,
            "validation pass complete"
        );

        if summary.status == HealthStatus::Healthy {
            self.publish(summary, results, None);
            let ready_notice = self.mark_ready();
            return Ok(PassOutcome::Healthy { summary, ready_notice });
        }

        *self.state.write() = PassState::Discovering;
        let discovered = self.discovery.discover().await;

        if self.cancel.is_cancelled() {
            debug!("session torn down during discovery, discarding results");
            return Ok(PassOutcome::Cancelled);
        }

        let discovery_error = match discovered {
            Ok(candidates) => {
                let changed = diff(&registry.addresses(), &candidates);
                if !changed.is_empty() {
                    let repair: CandidateSet =
                        changed.iter().filter_map(|name| candidates.get(name).map(|a| (*name, *a))).collect();
                    info!(
                        source = self.discovery.name(),
                        changed = ?changed,
                        "discovery found replacement addresses, scheduling reload"
                    );
                    self.resolver.apply_candidates(&repair)?;
                    return Ok(PassOutcome::ReloadPending { changed });
                }
                debug!(source = self.discovery.name(), "discovery returned the addresses already in use");
                None
            }
            Err(e) => {
                warn!(source = self.discovery.name(), error = %e, "discovery failed");
                Some(e.to_string())
            }
        };

        self.publish(summary, results.clone(), discovery_error.clone());
        Ok(PassOutcome::Degraded(DegradedReport { summary, results, discovery_error }))
    }

    fn publish(&self, summary: HealthSummary, results: Vec<ValidationResult>, note: Option<String>) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.health.publish(HealthState { summary, results, note, updated_at: Some(Utc::now()) });
    }

    fn ready_key(&self) -> String {
        match self.identity.read().as_deref() {
            Some(identity) => format!("{READY_MARKER_KEY}:{identity}"),
            None => READY_MARKER_KEY.to_string(),
        }
    }

    /// Records the ready marker. Returns `true` only the first time for an identity.
    fn mark_ready(&self) -> bool {
        let key = self.ready_key();
        match self.store.get(&key) {
            Ok(Some(_)) => false,
            Ok(None) => match self.store.set(&key, "true") {
                Ok(()) => {
                    info!(marker = %key, "contracts ready");
                    true
                }
                Err(e) => {
                    warn!(marker = %key, error = %e, "failed to record ready marker");
                    false
                }
            },
            Err(e) => {
                warn!(marker = %key, error = %e, "failed to read ready marker");
                false
            }
        }
    }
}
