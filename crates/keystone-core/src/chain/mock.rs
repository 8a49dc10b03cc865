//! Scriptable in-memory [`ChainReader`] for tests.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::Semaphore;

use crate::chain::{ChainReader, LogEntry, LogFilter, RpcError};

/// In-memory chain with per-address bytecode, scripted call results and logs.
///
/// Probes can be held open with [`MockChainReader::hold_probes`] so tests can observe
/// what happens when a session is torn down mid-flight.
#[derive(Default)]
pub struct MockChainReader {
    code: RwLock<HashMap<Address, Bytes>>,
    failing: RwLock<HashSet<Address>>,
    calls: RwLock<HashMap<(Address, Bytes), Result<Bytes, RpcError>>>,
    logs: RwLock<Vec<LogEntry>>,
    logs_error: RwLock<Option<RpcError>>,
    head: AtomicU64,
    gate: RwLock<Option<Arc<Semaphore>>>,
    get_code_calls: AtomicUsize,
    call_calls: AtomicUsize,
}

impl MockChainReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `code` at `address`.
    pub fn set_code(&self, address: Address, code: impl Into<Bytes>) {
        self.code.write().insert(address, code.into());
    }

    /// Makes `get_code(address)` fail with a connection error.
    pub fn fail_address(&self, address: Address) {
        self.failing.write().insert(address);
    }

    /// Scripts the result of `eth_call(to, data)`.
    pub fn set_call(&self, to: Address, data: Bytes, result: Result<Bytes, RpcError>) {
        self.calls.write().insert((to, data), result);
    }

    pub fn push_log(&self, log: LogEntry) {
        self.logs.write().push(log);
    }

    pub fn fail_logs(&self, error: RpcError) {
        *self.logs_error.write() = Some(error);
    }

    pub fn set_block_number(&self, block: u64) {
        self.head.store(block, Ordering::SeqCst);
    }

    /// Blocks every subsequent `get_code` until the returned semaphore receives permits.
    #[must_use]
    pub fn hold_probes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.write() = Some(Arc::clone(&gate));
        gate
    }

    #[must_use]
    pub fn get_code_calls(&self) -> usize {
        self.get_code_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn call_calls(&self) -> usize {
        self.call_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        self.get_code_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.read().clone();
        if let Some(gate) = gate {
            // A closed semaphore releases every waiter as well.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.failing.read().contains(&address) {
            return Err(RpcError::ConnectionFailed("connection refused or unreachable".to_string()));
        }
        Ok(self.code.read().get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.call_calls.fetch_add(1, Ordering::SeqCst);
        self.calls
            .read()
            .get(&(to, data))
            .cloned()
            .unwrap_or_else(|| Err(RpcError::Rpc(-32000, "execution reverted".to_string())))
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError> {
        if let Some(error) = self.logs_error.read().clone() {
            return Err(error);
        }
        Ok(self
            .logs
            .read()
            .iter()
            .filter(|log| filter.address.is_none_or(|address| log.address == address))
            .filter(|log| filter.topic0.is_none_or(|topic| log.topics.first() == Some(&topic)))
            .filter(|log| {
                log.block_number.is_none_or(|b| b >= filter.from_block && b <= filter.to_block)
            })
            .cloned()
            .collect())
    }
}
