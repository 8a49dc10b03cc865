use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};
use tokio::sync::watch;
use tracing::trace;

use crate::health::{HealthSummary, ValidationResult};

/// Latest published health, with the probe results it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthState {
    pub summary: HealthSummary,
    pub results: Vec<ValidationResult>,
    /// Extra context for degraded states, e.g. why discovery found nothing.
    pub note: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

type HealthCallback = Arc<dyn Fn(&HealthState) + Send + Sync>;

struct BroadcasterInner {
    next_id: AtomicU64,
    callbacks: RwLock<BTreeMap<u64, HealthCallback>>,
    tx: watch::Sender<HealthState>,
}

/// Fan-out of health changes to registered callbacks and `watch` receivers.
#[derive(Clone)]
pub struct HealthBroadcaster {
    inner: Arc<BroadcasterInner>,
}

/// Handle returned by [`HealthBroadcaster::subscribe`].
///
/// Dropping the handle unsubscribes, so keep it alive for as long as notifications
/// are wanted.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    inner: Weak<BroadcasterInner>,
}

impl Subscription {
    /// Stops delivery to this callback.
    pub fn unsubscribe(self) {}

    fn detach(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.callbacks.write().remove(&self.id);
            trace!(subscription = self.id, "health subscription removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Default for HealthBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(HealthState::default());
        Self {
            inner: Arc::new(BroadcasterInner {
                next_id: AtomicU64::new(1),
                callbacks: RwLock::new(BTreeMap::new()),
                tx,
            }),
        }
    }

    /// Registers `callback`, invoked synchronously on every publish.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&HealthState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.write().insert(id, Arc::new(callback));
        Subscription { id, inner: Arc::downgrade(&self.inner) }
    }

    /// Async alternative to callbacks.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<HealthState> {
        self.inner.tx.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> HealthState {
        self.inner.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.callbacks.read().len()
    }

    pub(crate) fn publish(&self, state: HealthState) {
        self.inner.tx.send_replace(state.clone());
        // Snapshot the callbacks so one may unsubscribe from inside its own invocation.
        let callbacks: Vec<HealthCallback> = self.inner.callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(&state);
        }
    }
}
