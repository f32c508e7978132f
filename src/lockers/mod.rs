//! The two concurrency-control strategies under comparison.
//!
//! - [`MutexLocker`] serializes every decrement behind one process-wide lock
//! - [`OptimisticLocker`] writes first inside a transaction, validates the
//!   result and rolls back when the balance went negative
//!
//! Both take the store as an injected `Arc` and never manage its lifecycle.

use async_trait::async_trait;

use crate::{DecrementRequest, OperationOutcome};

mod mutex;
mod optimistic;

pub use mutex::{CriticalSectionProbe, MutexLocker};
pub use optimistic::OptimisticLocker;

#[async_trait]
pub trait BalanceLocker: Send + Sync + 'static {
    /// Short strategy name used in logs and reports.
    fn name(&self) -> &'static str;

    async fn decrement(&self, request: DecrementRequest) -> OperationOutcome;
}
