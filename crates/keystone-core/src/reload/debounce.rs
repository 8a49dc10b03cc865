use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::debug;

use crate::reload::ReloadError;

/// A reload that survived the debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    pub generation: u64,
}

struct SchedulerInner {
    debounce: Duration,
    generation: AtomicU64,
    fired: AtomicU64,
    tx: mpsc::UnboundedSender<ReloadTicket>,
}

/// Trailing-edge debouncer for reload requests.
///
/// Every [`schedule`](Self::schedule) call restarts the window; a ticket is emitted only
/// once the window passes with no newer request. A burst of edits therefore produces
/// exactly one reload. Cloning is cheap and clones share the same window.
#[derive(Clone)]
pub struct ReloadScheduler {
    inner: Arc<SchedulerInner>,
}

/// Receiving half handed to whoever performs the reload.
pub struct ReloadReceiver {
    rx: mpsc::UnboundedReceiver<ReloadTicket>,
}

impl ReloadReceiver {
    /// Waits for the next ticket. Returns `None` once every scheduler is dropped.
    pub async fn recv(&mut self) -> Option<ReloadTicket> {
        self.rx.recv().await
    }

    /// Returns a ticket if one is already waiting.
    pub fn try_recv(&mut self) -> Option<ReloadTicket> {
        self.rx.try_recv().ok()
    }
}

impl ReloadScheduler {
    #[must_use]
    pub fn new(debounce: Duration) -> (Self, ReloadReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = SchedulerInner {
            debounce,
            generation: AtomicU64::new(0),
            fired: AtomicU64::new(0),
            tx,
        };
        (Self { inner: Arc::new(inner) }, ReloadReceiver { rx })
    }

    /// Requests a reload after the debounce window.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::SchedulerUnavailable`] when called outside a Tokio runtime.
    pub fn schedule(&self) -> Result<(), ReloadError> {
        let handle = Handle::try_current().map_err(|_| ReloadError::SchedulerUnavailable)?;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);

        debug!(generation = generation, debounce_ms = inner.debounce.as_millis() as u64, "reload scheduled");

        handle.spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            inner.fired.fetch_add(1, Ordering::SeqCst);
            if inner.tx.send(ReloadTicket { generation }).is_err() {
                debug!(generation = generation, "reload receiver gone, dropping ticket");
            }
        });

        Ok(())
    }

    /// Drops any pending request without firing it.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of tickets emitted so far.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.inner.fired.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }
}
