//! Error types for the balance benchmark.
//!
//! Errors fall into three layers:
//! - [`StoreError`] - failures at the persistence boundary
//! - [`Failure`] - the fatal cause carried by a failed decrement
//! - [`RunError`] - anything that aborts a benchmark run
//!
//! Insufficient funds is deliberately absent here: it is a benign skip,
//! modelled by [`crate::SkipReason`], and never travels as an error.

use thiserror::Error;

use crate::AccountId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("invalid namespace name: {0:?}")]
    InvalidNamespace(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Fatal cause of a failed decrement. Never retried.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    #[error("row not affected for account {0}")]
    ZeroRowsAffected(AccountId),

    #[error("transaction error: {0}")]
    Transaction(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid workload configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("account setup failed: {0}")]
    Setup(#[source] StoreError),

    #[error("decrement of account {account} failed: {cause}")]
    OperationFailed { account: AccountId, cause: Failure },

    #[error("decrement task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("negative balance scan failed: {0}")]
    Verify(#[source] StoreError),

    #[error("{0} account(s) ended with a negative balance")]
    InvariantViolated(u64),
}
