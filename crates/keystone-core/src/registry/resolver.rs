use alloy_primitives::Address;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};

use crate::{
    registry::{
        address::{validate_address_format, FieldError, ZERO_ADDRESS},
        fallback::CandidateSet,
        RuntimeDefaults,
    },
    reload::{ReloadError, ReloadScheduler},
    store::KeyValueStore,
    types::ContractName,
    utils::hex::format_hex,
};

/// Which precedence tier produced a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    /// Operator override persisted in the store.
    Override,
    /// Deployment-time runtime default.
    RuntimeDefault,
    /// Compiled or configured fallback table.
    Fallback,
    /// Nothing configured; the zero sentinel is used.
    Unset,
}

impl AddressSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::RuntimeDefault => "runtime_default",
            Self::Fallback => "fallback",
            Self::Unset => "unset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub address: Address,
    pub source: AddressSource,
}

/// Snapshot of the resolved registry, one entry per contract in canonical order.
///
/// Values handed out by [`AddressResolver::get_all`] are owned copies; mutating one has
/// no effect on the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractRegistry {
    entries: BTreeMap<ContractName, RegistryEntry>,
}

impl ContractRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: ContractName, address: Address, source: AddressSource) {
        self.entries.insert(name, RegistryEntry { address, source });
    }

    #[must_use]
    pub fn get(&self, name: ContractName) -> Option<&RegistryEntry> {
        self.entries.get(&name)
    }

    /// Address for `name`, or the zero sentinel when absent.
    #[must_use]
    pub fn address(&self, name: ContractName) -> Address {
        self.entries.get(&name).map_or(ZERO_ADDRESS, |entry| entry.address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContractName, &RegistryEntry)> + '_ {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops provenance, keeping only the addresses.
    #[must_use]
    pub fn addresses(&self) -> CandidateSet {
        self.entries.iter().map(|(name, entry)| (*name, entry.address)).collect()
    }
}

impl FromIterator<(ContractName, Address)> for ContractRegistry {
    /// Builds a registry whose entries are all tagged [`AddressSource::Override`].
    fn from_iter<I: IntoIterator<Item = (ContractName, Address)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, address) in iter {
            registry.insert(name, address, AddressSource::Override);
        }
        registry
    }
}

/// Outcome of an [`AddressResolver::update`] batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Names whose new address was persisted.
    pub applied: Vec<ContractName>,
    /// Names submitted with an empty value, left untouched.
    pub skipped: Vec<ContractName>,
    /// Names rejected for malformed input, left untouched.
    pub errors: Vec<FieldError>,
}

impl UpdateReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolves logical contract names to addresses.
///
/// Precedence, highest first:
///
/// 1. a well-formed override in the [`KeyValueStore`] (`contract_<NAME>`)
/// 2. a well-formed [`RuntimeDefaults`] entry
/// 3. the fallback table
/// 4. the zero sentinel, logged as a warning
///
/// The full registry is computed lazily on first use and cached until [`invalidate`]
/// is called, so every resolution within one epoch sees the same snapshot.
///
/// [`invalidate`]: AddressResolver::invalidate
pub struct AddressResolver {
    store: Arc<dyn KeyValueStore>,
    defaults: RuntimeDefaults,
    fallback: CandidateSet,
    cache: ArcSwapOption<ContractRegistry>,
    rebuild: Mutex<()>,
    epoch: AtomicU64,
    scheduler: Option<ReloadScheduler>,
}

impl AddressResolver {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: RuntimeDefaults, fallback: CandidateSet) -> Self {
        Self {
            store,
            defaults,
            fallback,
            cache: ArcSwapOption::empty(),
            rebuild: Mutex::new(()),
            epoch: AtomicU64::new(0),
            scheduler: None,
        }
    }

    /// Attaches the scheduler that `update` and `reset` use to request a reload.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: ReloadScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Resolves one contract name. Never fails; see the type-level docs for precedence.
    #[must_use]
    pub fn resolve(&self, name: ContractName) -> Address {
        self.snapshot().address(name)
    }

    /// Returns an owned copy of the full registry.
    #[must_use]
    pub fn get_all(&self) -> ContractRegistry {
        (*self.snapshot()).clone()
    }

    /// Drops the cached snapshot. The next read recomputes every entry.
    pub fn invalidate(&self) {
        let _guard = self.rebuild.lock();
        self.cache.store(None);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch = epoch, "contract registry cache invalidated");
    }

    /// Number of invalidations so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Persisted overrides as stored, including malformed ones that resolution skips.
    #[must_use]
    pub fn overrides(&self) -> BTreeMap<ContractName, String> {
        ContractName::ALL
            .into_iter()
            .filter_map(|name| match self.store.get(&name.storage_key()) {
                Ok(value) => value.map(|v| (name, v)),
                Err(e) => {
                    warn!(contract = %name, error = %e, "failed to read override");
                    None
                }
            })
            .collect()
    }

    /// Validates and persists a batch of operator-supplied addresses.
    ///
    /// Empty values are skipped. Malformed values are reported per field and never
    /// persisted; they do not prevent the well-formed ones from being saved. When
    /// anything was persisted the cache is invalidated and one debounced reload is
    /// requested, even if a later write in the same batch failed.
    ///
    /// # Errors
    ///
    /// - [`ReloadError::PartialWrite`] carrying the report when some writes landed
    ///   before the store failed
    /// - [`ReloadError::Persistence`] when the store rejected every write
    /// - [`ReloadError::SchedulerUnavailable`] when no reload can be scheduled
    pub fn update(&self, candidates: &BTreeMap<ContractName, String>) -> Result<UpdateReport, ReloadError> {
        let mut report = UpdateReport::default();
        let mut accepted = Vec::new();

        for (name, raw) in candidates {
            if raw.trim().is_empty() {
                report.skipped.push(*name);
                continue;
            }
            match validate_address_format(raw) {
                Ok(address) => accepted.push((*name, address)),
                Err(error) => {
                    warn!(contract = %name, value = %raw, error = %error, "rejected malformed address");
                    report.errors.push(FieldError { name: *name, value: raw.clone(), error });
                }
            }
        }

        let mut write_error = None;
        for (name, address) in accepted {
            match self.store.set(&name.storage_key(), &format_hex(address.as_slice())) {
                Ok(()) => {
                    info!(contract = %name, address = %address, "override saved");
                    report.applied.push(name);
                }
                Err(e) => {
                    warn!(contract = %name, error = %e, "failed to persist override");
                    write_error.get_or_insert(e);
                }
            }
        }

        if !report.applied.is_empty() {
            self.invalidate();
            self.request_reload()?;
        }

        match write_error {
            None => Ok(report),
            Some(source) if report.applied.is_empty() => Err(ReloadError::Persistence(source)),
            Some(source) => Err(ReloadError::PartialWrite { report: Box::new(report), source }),
        }
    }

    /// Persists already-validated addresses, as produced by discovery.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn apply_candidates(&self, candidates: &CandidateSet) -> Result<UpdateReport, ReloadError> {
        let raw = candidates
            .iter()
            .map(|(name, address)| (*name, format_hex(address.as_slice())))
            .collect();
        self.update(&raw)
    }

    /// Removes the overrides for `names` and requests a reload.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError`] if the store rejects a removal or no reload can be
    /// scheduled. Removals that succeeded before a failure still invalidate the cache
    /// and request a reload.
    pub fn reset(&self, names: &[ContractName]) -> Result<(), ReloadError> {
        let mut removed = 0usize;
        let mut remove_error = None;
        for name in names {
            match self.store.remove(&name.storage_key()) {
                Ok(()) => {
                    info!(contract = %name, "override removed");
                    removed += 1;
                }
                Err(e) => {
                    warn!(contract = %name, error = %e, "failed to remove override");
                    remove_error.get_or_insert(e);
                }
            }
        }
        if removed > 0 {
            self.invalidate();
            self.request_reload()?;
        }
        remove_error.map_or(Ok(()), |e| Err(ReloadError::Persistence(e)))
    }

    /// Removes every override.
    ///
    /// # Errors
    ///
    /// See [`reset`](Self::reset).
    pub fn reset_all(&self) -> Result<(), ReloadError> {
        self.reset(&ContractName::ALL)
    }

    fn request_reload(&self) -> Result<(), ReloadError> {
        match &self.scheduler {
            Some(scheduler) => scheduler.schedule(),
            None => {
                debug!("no reload scheduler attached, skipping reload request");
                Ok(())
            }
        }
    }

    fn snapshot(&self) -> Arc<ContractRegistry> {
        if let Some(snapshot) = self.cache.load_full() {
            return snapshot;
        }

        let _guard = self.rebuild.lock();
        if let Some(snapshot) = self.cache.load_full() {
            return snapshot;
        }

        let snapshot = Arc::new(self.build());
        self.cache.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    fn build(&self) -> ContractRegistry {
        let mut registry = ContractRegistry::new();
        for name in ContractName::ALL {
            let (address, source) = self.resolve_uncached(name);
            registry.insert(name, address, source);
        }
        debug!(epoch = self.epoch(), "contract registry built");
        registry
    }

    fn resolve_uncached(&self, name: ContractName) -> (Address, AddressSource) {
        match self.store.get(&name.storage_key()) {
            Ok(Some(raw)) => match validate_address_format(&raw) {
                Ok(address) => return (address, AddressSource::Override),
                Err(e) => warn!(contract = %name, value = %raw, error = %e, "ignoring malformed override"),
            },
            Ok(None) => {}
            Err(e) => warn!(contract = %name, error = %e, "override store unreadable, falling through"),
        }

        if let Some(raw) = self.defaults.get(name) {
            match validate_address_format(raw) {
                Ok(address) => return (address, AddressSource::RuntimeDefault),
                Err(e) => {
                    warn!(contract = %name, value = %raw, error = %e, "ignoring malformed runtime default");
                }
            }
        }

        if let Some(address) = self.fallback.get(&name) {
            return (*address, AddressSource::Fallback);
        }

        warn!(contract = %name, "no address configured, using zero address");
        (ZERO_ADDRESS, AddressSource::Unset)
    }
}
