//! Test double that injects storage faults on top of [`MemoryStore`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{BalanceStore, MemoryStore, MemoryTransaction, StoreTransaction};
use crate::{AccountId, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Updates report zero affected rows.
    ZeroRows,
    /// Updates fail with a backend error.
    Apply,
    Begin,
    /// Reads inside a transaction fail.
    Read,
    Commit,
}

/// Behaves like a [`MemoryStore`] until `after` decrements have been
/// applied, then injects `fault` on every matching call.
pub(crate) struct ScriptedStore {
    inner: MemoryStore,
    fault: Fault,
    after: usize,
    applied: Arc<AtomicUsize>,
}

impl ScriptedStore {
    pub(crate) fn new(fault: Fault, after: usize) -> Self {
        Self {
            inner: MemoryStore::new("scripted").unwrap(),
            fault,
            after,
            applied: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn armed(&self) -> bool {
        self.applied.load(Ordering::SeqCst) >= self.after
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Backend(format!("injected {what} failure"))
}

#[async_trait]
impl BalanceStore for ScriptedStore {
    type Tx = ScriptedTransaction;

    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    async fn create_accounts(
        &self,
        count: usize,
        initial: i64,
    ) -> Result<Vec<AccountId>, StoreError> {
        self.inner.create_accounts(count, initial).await
    }

    async fn read_balance(&self, id: AccountId) -> Result<i64, StoreError> {
        self.inner.read_balance(id).await
    }

    async fn apply_decrement(&self, id: AccountId, amount: i64) -> Result<u64, StoreError> {
        if self.armed() {
            match self.fault {
                Fault::ZeroRows => return Ok(0),
                Fault::Apply => return Err(injected("update")),
                _ => {}
            }
        }
        self.applied.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_decrement(id, amount).await
    }

    async fn count_negative_balances(&self) -> Result<u64, StoreError> {
        self.inner.count_negative_balances().await
    }

    async fn begin(&self) -> Result<ScriptedTransaction, StoreError> {
        if self.fault == Fault::Begin && self.armed() {
            return Err(injected("begin"));
        }
        Ok(ScriptedTransaction {
            inner: self.inner.begin().await?,
            fault: self.fault,
            after: self.after,
            applied: Arc::clone(&self.applied),
        })
    }
}

pub(crate) struct ScriptedTransaction {
    inner: MemoryTransaction,
    fault: Fault,
    after: usize,
    applied: Arc<AtomicUsize>,
}

impl ScriptedTransaction {
    fn armed(&self) -> bool {
        self.applied.load(Ordering::SeqCst) > self.after
    }
}

#[async_trait]
impl StoreTransaction for ScriptedTransaction {
    async fn apply_decrement(&mut self, id: AccountId, amount: i64) -> Result<u64, StoreError> {
        if self.applied.load(Ordering::SeqCst) >= self.after {
            match self.fault {
                Fault::ZeroRows => return Ok(0),
                Fault::Apply => return Err(injected("update")),
                _ => {}
            }
        }
        self.applied.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_decrement(id, amount).await
    }

    async fn read_balance(&mut self, id: AccountId) -> Result<i64, StoreError> {
        if self.fault == Fault::Read && self.armed() {
            return Err(injected("read"));
        }
        self.inner.read_balance(id).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        if self.fault == Fault::Commit && self.armed() {
            // Dropping the inner transaction rolls it back.
            return Err(injected("commit"));
        }
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}
