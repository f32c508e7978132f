use std::fmt;

use crate::Failure;

/// Generated unique key of an account row.
pub type AccountId = i64;

/// One decrement attempt against one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecrementRequest {
    pub account: AccountId,
    pub amount: i64,
}

impl DecrementRequest {
    pub fn new(account: AccountId, amount: i64) -> Self {
        Self { account, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InsufficientFunds,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientFunds => f.write_str("insufficient funds"),
        }
    }
}

/// Result of a single decrement.
///
/// `Skipped` is benign and expected under contention; `Failed` aborts the
/// whole run. Callers branch on the variant, never on error text.
#[derive(Debug)]
pub enum OperationOutcome {
    Success,
    Skipped(SkipReason),
    Failed(Failure),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, OperationOutcome::Skipped(_))
    }
}

impl From<Failure> for OperationOutcome {
    fn from(cause: Failure) -> Self {
        OperationOutcome::Failed(cause)
    }
}
