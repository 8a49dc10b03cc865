//! Builder pattern for wiring a [`Session`] from configuration.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    chain::{ChainReader, HttpClient, JsonRpcChainClient},
    config::{AppConfig, DiscoveryMode},
    contracts::DaoReader,
    discovery::{DeploymentDiscovery, EventLogDiscovery, StaticFallbackDiscovery},
    health::DeploymentProbe,
    registry::{AddressResolver, RuntimeDefaults},
    reload::{HealthBroadcaster, ReloadCoordinator, ReloadScheduler},
    store::{FileStore, KeyValueStore, MemoryStore},
};

use super::{Session, SessionError};

/// Builder for a [`Session`].
///
/// Chain access, persistence and runtime defaults are derived from the configuration
/// unless supplied explicitly.
///
/// # Examples
///
/// ```no_run
/// # use keystone_core::{config::AppConfig, session::SessionBuilder};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionBuilder::new().with_config(AppConfig::load()?).build()?;
/// let outcome = session.start().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<AppConfig>,
    chain: Option<Arc<dyn ChainReader>>,
    store: Option<Arc<dyn KeyValueStore>>,
    defaults: Option<RuntimeDefaults>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `chain` instead of an HTTP client against `chain.rpc_url`.
    #[must_use]
    pub fn with_chain(mut self, chain: Arc<dyn ChainReader>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Uses `store` instead of the one `storage.path` selects.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses `defaults` instead of reading the process environment.
    #[must_use]
    pub fn with_runtime_defaults(mut self, defaults: RuntimeDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Constructs every component once. Nothing touches the chain until
    /// [`Session::start`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the configuration is invalid, the store cannot be
    /// opened, or the HTTP client cannot be created.
    pub fn build(self) -> Result<Session, SessionError> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(SessionError::Config)?;
        let fallback = config.fallback_table().map_err(SessionError::Config)?;

        let chain: Arc<dyn ChainReader> = match self.chain {
            Some(chain) => chain,
            None => {
                let http = HttpClient::new()?;
                Arc::new(JsonRpcChainClient::new(http, config.chain.rpc_url.clone(), config.request_timeout()))
            }
        };

        let store: Arc<dyn KeyValueStore> = match (self.store, &config.storage.path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileStore::open(path)?),
            (None, None) => Arc::new(MemoryStore::new()),
        };
        debug!(persistent = config.storage.path.is_some(), "store initialized");

        let defaults =
            self.defaults.unwrap_or_else(|| RuntimeDefaults::from_env(&config.registry.env_prefix));

        let (scheduler, receiver) = ReloadScheduler::new(config.debounce());
        let resolver = Arc::new(
            AddressResolver::new(Arc::clone(&store), defaults, fallback.clone()).with_scheduler(scheduler.clone()),
        );

        let discovery: Arc<dyn DeploymentDiscovery> = match config.discovery.mode {
            DiscoveryMode::Static => Arc::new(StaticFallbackDiscovery::new(fallback)),
            DiscoveryMode::EventLog => {
                let mut source = EventLogDiscovery::new(Arc::clone(&chain), config.discovery.lookback_blocks);
                if let Some(announcer) = config.announcer() {
                    source = source.with_announcer(announcer);
                }
                Arc::new(source)
            }
        };

        let probe = DeploymentProbe::new(Arc::clone(&chain)).with_timeout(config.probe_timeout());
        let cancel = CancellationToken::new();
        let health = HealthBroadcaster::new();
        let coordinator = Arc::new(ReloadCoordinator::new(
            Arc::clone(&resolver),
            probe,
            Arc::clone(&discovery),
            store,
            health,
            cancel.clone(),
        ));
        let reader = DaoReader::new(chain, Arc::clone(&resolver));

        info!(
            discovery = discovery.name(),
            debounce_ms = config.reload.debounce_ms,
            chain_id = config.chain.chain_id,
            "session initialized"
        );

        Ok(Session::new(config, resolver, coordinator, discovery, reader, scheduler, receiver, cancel))
    }
}
