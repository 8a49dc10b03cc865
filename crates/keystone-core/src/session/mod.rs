//! Session lifecycle: start pass, background reloads and teardown.
//!
//! A [`Session`] owns one instance of every component. [`Session::start`] runs the
//! first validation pass and spawns the reload loop, which re-runs a pass each time
//! the debounced scheduler fires. [`Session::teardown`] cancels the loop and makes any
//! pass still in flight discard its results.

pub mod builder;

pub use builder::SessionBuilder;

use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    chain::RpcError,
    config::AppConfig,
    contracts::DaoReader,
    discovery::DeploymentDiscovery,
    registry::AddressResolver,
    reload::{HealthBroadcaster, PassOutcome, ReloadCoordinator, ReloadError, ReloadReceiver, ReloadScheduler},
    store::StoreError,
};

/// Errors that can occur while building or starting a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("Configuration validation failed: {0}")]
    Config(String),

    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to create chain client: {0}")]
    Chain(#[from] RpcError),

    #[error(transparent)]
    Reload(#[from] ReloadError),
}

pub struct Session {
    config: AppConfig,
    resolver: Arc<AddressResolver>,
    coordinator: Arc<ReloadCoordinator>,
    discovery: Arc<dyn DeploymentDiscovery>,
    reader: DaoReader,
    scheduler: ReloadScheduler,
    receiver: Mutex<Option<ReloadReceiver>>,
    cancel: CancellationToken,
    reload_task: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

impl Session {
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        config: AppConfig,
        resolver: Arc<AddressResolver>,
        coordinator: Arc<ReloadCoordinator>,
        discovery: Arc<dyn DeploymentDiscovery>,
        reader: DaoReader,
        scheduler: ReloadScheduler,
        receiver: ReloadReceiver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            resolver,
            coordinator,
            discovery,
            reader,
            scheduler,
            receiver: Mutex::new(Some(receiver)),
            cancel,
            reload_task: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<AddressResolver> {
        &self.resolver
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<ReloadCoordinator> {
        &self.coordinator
    }

    /// The discovery source the coordinator repairs from.
    #[must_use]
    pub fn discovery(&self) -> &Arc<dyn DeploymentDiscovery> {
        &self.discovery
    }

    #[must_use]
    pub fn reader(&self) -> &DaoReader {
        &self.reader
    }

    #[must_use]
    pub fn health(&self) -> &HealthBroadcaster {
        self.coordinator.health()
    }

    /// Spawns the reload loop (first call only) and runs the start pass.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Reload`] if the start pass fails to persist discovered
    /// candidates or to schedule the follow-up reload.
    pub async fn start(&self) -> Result<PassOutcome, SessionError> {
        if let Some(receiver) = self.receiver.lock().take() {
            let handle = tokio::spawn(Self::reload_loop(
                Arc::clone(&self.resolver),
                Arc::clone(&self.coordinator),
                receiver,
                self.cancel.clone(),
            ));
            *self.reload_task.lock() = Some(handle);
            debug!("reload loop started");
        }

        let outcome = self.coordinator.run_pass().await?;
        info!(outcome = outcome.label(), "start pass finished");
        Ok(outcome)
    }

    async fn reload_loop(
        resolver: Arc<AddressResolver>,
        coordinator: Arc<ReloadCoordinator>,
        mut receiver: ReloadReceiver,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("reload loop cancelled");
                    break;
                }
                ticket = receiver.recv() => {
                    let Some(ticket) = ticket else {
                        debug!("reload scheduler dropped, stopping reload loop");
                        break;
                    };
                    resolver.invalidate();
                    match coordinator.run_pass().await {
                        Ok(outcome) => {
                            info!(generation = ticket.generation, outcome = outcome.label(), "reload pass finished");
                        }
                        Err(e) => {
                            error!(generation = ticket.generation, error = %e, "reload pass failed");
                        }
                    }
                }
            }
        }
    }

    /// Cancels pending reloads and any pass in flight, then waits for the reload loop.
    /// Calling it again is a no-op.
    pub async fn teardown(&self) {
        if self.torn_down.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            warn!("teardown already initiated, ignoring duplicate call");
            return;
        }

        info!("tearing down session");
        self.scheduler.cancel();
        self.coordinator.teardown();

        let handle = self.reload_task.lock().take();
        if let Some(handle) = handle {
            match handle.await {
                Ok(()) => debug!("reload loop completed"),
                Err(e) if e.is_cancelled() => debug!("reload loop cancelled"),
                Err(e) => error!(error = %e, "reload loop failed"),
            }
        }
        info!("session teardown complete");
    }
}
