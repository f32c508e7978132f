//! In-process balance storage.
//!
//! Every row keeps its committed balance plus an async write lock. Writers
//! (plain updates and transactions alike) take the row's write lock, so
//! conflicting updates of the same row are serialized while different rows
//! proceed in parallel. Transactions buffer their writes privately and only
//! publish them on commit, which gives the read-committed visibility a
//! database would.
//!
//! An optional round-trip latency is charged on every call to stand in for
//! the network hop to a real database server.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{validate_namespace, BalanceStore, StoreTransaction};
use crate::{AccountId, StoreError};

#[derive(Debug)]
struct Row {
    committed: AtomicI64,
    write_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Default)]
struct Rows {
    by_id: RwLock<HashMap<AccountId, Arc<Row>>>,
    last_id: AtomicI64,
}

impl Rows {
    fn get(&self, id: AccountId) -> Option<Arc<Row>> {
        self.by_id.read().get(&id).cloned()
    }
}

pub struct MemoryStore {
    namespace: String,
    rows: Arc<Rows>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Result<Self, StoreError> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self {
            namespace,
            rows: Arc::new(Rows::default()),
            latency: Duration::ZERO,
        })
    }

    /// Charges `latency` on every storage call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

async fn round_trip(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    type Tx = MemoryTransaction;

    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_accounts(
        &self,
        count: usize,
        initial: i64,
    ) -> Result<Vec<AccountId>, StoreError> {
        round_trip(self.latency).await;
        let mut by_id = self.rows.by_id.write();
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.rows.last_id.fetch_add(1, Ordering::SeqCst) + 1;
            by_id.insert(
                id,
                Arc::new(Row {
                    committed: AtomicI64::new(initial),
                    write_lock: Arc::new(Mutex::new(())),
                }),
            );
            ids.push(id);
        }
        Ok(ids)
    }

    async fn read_balance(&self, id: AccountId) -> Result<i64, StoreError> {
        round_trip(self.latency).await;
        let row = self.rows.get(id).ok_or(StoreError::NotFound(id))?;
        Ok(row.committed.load(Ordering::SeqCst))
    }

    async fn apply_decrement(&self, id: AccountId, amount: i64) -> Result<u64, StoreError> {
        round_trip(self.latency).await;
        let Some(row) = self.rows.get(id) else {
            return Ok(0);
        };
        let _lock = row.write_lock.lock().await;
        row.committed.fetch_sub(amount, Ordering::SeqCst);
        Ok(1)
    }

    async fn count_negative_balances(&self) -> Result<u64, StoreError> {
        round_trip(self.latency).await;
        let count = self
            .rows
            .by_id
            .read()
            .values()
            .filter(|row| row.committed.load(Ordering::SeqCst) < 0)
            .count();
        Ok(count as u64)
    }

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        round_trip(self.latency).await;
        Ok(MemoryTransaction {
            rows: Arc::clone(&self.rows),
            latency: self.latency,
            pending: HashMap::new(),
        })
    }
}

struct PendingWrite {
    row: Arc<Row>,
    balance: i64,
    _lock: OwnedMutexGuard<()>,
}

pub struct MemoryTransaction {
    rows: Arc<Rows>,
    latency: Duration,
    /// Uncommitted balances, each pinned by the row's write lock.
    pending: HashMap<AccountId, PendingWrite>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn apply_decrement(&mut self, id: AccountId, amount: i64) -> Result<u64, StoreError> {
        round_trip(self.latency).await;
        if let Some(write) = self.pending.get_mut(&id) {
            write.balance -= amount;
            return Ok(1);
        }
        let Some(row) = self.rows.get(id) else {
            return Ok(0);
        };
        // Blocks until any other transaction holding this row ends, then
        // starts from the latest committed balance.
        let lock = Arc::clone(&row.write_lock).lock_owned().await;
        let balance = row.committed.load(Ordering::SeqCst) - amount;
        self.pending.insert(
            id,
            PendingWrite {
                row,
                balance,
                _lock: lock,
            },
        );
        Ok(1)
    }

    async fn read_balance(&mut self, id: AccountId) -> Result<i64, StoreError> {
        round_trip(self.latency).await;
        if let Some(write) = self.pending.get(&id) {
            return Ok(write.balance);
        }
        let row = self.rows.get(id).ok_or(StoreError::NotFound(id))?;
        Ok(row.committed.load(Ordering::SeqCst))
    }

    async fn commit(self) -> Result<(), StoreError> {
        round_trip(self.latency).await;
        for write in self.pending.into_values() {
            // Publish before the lock guard in `write` is released.
            write.row.committed.store(write.balance, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        round_trip(self.latency).await;
        Ok(())
    }
}
