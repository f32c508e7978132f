//! Write-then-validate strategy.
//!
//! The decrement is applied unconditionally inside a transaction, the
//! resulting balance is read back in the same transaction and the
//! transaction is rolled back when it went negative. There is no version
//! check before the write: concurrent writers of one row are serialized by
//! the store's row locks, writers of different rows run in parallel.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::BalanceLocker;
use crate::stores::{BalanceStore, StoreTransaction};
use crate::{DecrementRequest, Failure, OperationOutcome, SkipReason};

pub struct OptimisticLocker<S> {
    store: Arc<S>,
}

impl<S: BalanceStore> OptimisticLocker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

/// Best-effort rollback. A failure here cannot change the outcome, which
/// has already been decided, so it is only logged.
async fn rollback<T: StoreTransaction>(tx: T, request: &DecrementRequest) {
    if let Err(err) = tx.rollback().await {
        warn!(account = request.account, error = %err, "rollback failed");
    }
}

#[async_trait]
impl<S: BalanceStore> BalanceLocker for OptimisticLocker<S> {
    fn name(&self) -> &'static str {
        "optimistic"
    }

    async fn decrement(&self, request: DecrementRequest) -> OperationOutcome {
        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(err) => return Failure::Transaction(err).into(),
        };

        match tx.apply_decrement(request.account, request.amount).await {
            Ok(0) => {
                rollback(tx, &request).await;
                return Failure::ZeroRowsAffected(request.account).into();
            }
            Ok(_) => {}
            Err(err) => {
                rollback(tx, &request).await;
                return Failure::Storage(err).into();
            }
        }

        let current = match tx.read_balance(request.account).await {
            Ok(current) => current,
            Err(err) => {
                rollback(tx, &request).await;
                return Failure::Storage(err).into();
            }
        };
        if current < 0 {
            rollback(tx, &request).await;
            return OperationOutcome::Skipped(SkipReason::InsufficientFunds);
        }

        // A failed commit leaves nothing to roll back: the transaction was
        // consumed and the store discards it.
        match tx.commit().await {
            Ok(()) => OperationOutcome::Success,
            Err(err) => Failure::Transaction(err).into(),
        }
    }
}
