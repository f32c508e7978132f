//! Pessimistic strategy: one lock for every account.
//!
//! The whole read-check-update round trip, storage latency included, runs
//! inside the critical section, so throughput is bounded by round-trip
//! latency times the number of operations rather than by parallelism.
//! That coarseness is what the benchmark measures; do not shard the lock.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::BalanceLocker;
use crate::stores::BalanceStore;
use crate::{DecrementRequest, Failure, OperationOutcome, SkipReason};

/// Counts how many callers are inside a critical section at once.
#[derive(Debug, Default)]
pub struct CriticalSectionProbe {
    active: AtomicUsize,
    peak: AtomicUsize,
    entries: AtomicU64,
}

impl CriticalSectionProbe {
    pub(crate) fn enter(&self) -> ProbeGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.entries.fetch_add(1, Ordering::SeqCst);
        ProbeGuard { probe: self }
    }

    /// Callers currently inside.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous callers ever observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::SeqCst)
    }
}

pub(crate) struct ProbeGuard<'a> {
    probe: &'a CriticalSectionProbe,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.probe.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MutexLocker<S> {
    store: Arc<S>,
    /// Process-wide, shared by all accounts.
    lock: Mutex<()>,
    probe: CriticalSectionProbe,
}

impl<S: BalanceStore> MutexLocker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            probe: CriticalSectionProbe::default(),
        }
    }

    pub fn probe(&self) -> &CriticalSectionProbe {
        &self.probe
    }

    /// Must only be called while holding `self.lock`.
    async fn decrement_locked(
        &self,
        request: DecrementRequest,
    ) -> Result<OperationOutcome, Failure> {
        let current = self
            .store
            .read_balance(request.account)
            .await
            .map_err(Failure::Storage)?;
        if current < request.amount {
            return Ok(OperationOutcome::Skipped(SkipReason::InsufficientFunds));
        }

        let rows = self
            .store
            .apply_decrement(request.account, request.amount)
            .await
            .map_err(Failure::Storage)?;
        if rows == 0 {
            return Err(Failure::ZeroRowsAffected(request.account));
        }
        Ok(OperationOutcome::Success)
    }
}

#[async_trait]
impl<S: BalanceStore> BalanceLocker for MutexLocker<S> {
    fn name(&self) -> &'static str {
        "mutex"
    }

    async fn decrement(&self, request: DecrementRequest) -> OperationOutcome {
        // Guards drop in reverse order: the probe exits before the lock is released.
        let _lock = self.lock.lock().await;
        let _entry = self.probe.enter();
        self.decrement_locked(request)
            .await
            .unwrap_or_else(OperationOutcome::Failed)
    }
}
