//! The runner drives one strategy through a full benchmark:
//! account setup, timed launches of concurrent decrements, and the final
//! negative-balance check.
//!
mod driver;
mod verifier;

pub use driver::{drive, LaunchReport, WorkloadConfig, WorkloadReport};
pub use verifier::{verify, ReportRow, RunReport};

use std::sync::Arc;
use tracing::info;

use crate::lockers::BalanceLocker;
use crate::stores::BalanceStore;
use crate::RunError;

/// Runs `locker` against a fresh set of accounts in `store`.
///
/// The store must be the one the locker was built with.
///
/// # Errors
/// Returns an error if:
/// * The workload configuration is invalid
/// * The accounts cannot be created
/// * Any decrement fails (the run stops at the first failure)
/// * Any account ends with a negative balance
pub async fn run<S, L>(
    store: &S,
    locker: Arc<L>,
    config: &WorkloadConfig,
) -> Result<RunReport, RunError>
where
    S: BalanceStore,
    L: BalanceLocker,
{
    config.validate()?;
    let ids = store
        .create_accounts(config.account_count, config.initial_balance)
        .await
        .map_err(RunError::Setup)?;

    let workload = drive(&locker, &ids, config).await?;
    verify(store).await?;

    let report = RunReport {
        namespace: store.namespace().to_owned(),
        accounts: ids.len(),
        operations_per_launch: config.operations_per_launch(),
        workload,
        negative_balances: 0,
    };
    info!(
        strategy = report.workload.strategy,
        namespace = %report.namespace,
        successes = report.workload.successes(),
        skipped = report.workload.skipped(),
        total_ms = report.workload.total_elapsed.as_millis() as u64,
        average_launch_ms = report.average_launch().as_millis() as u64,
        "run verified"
    );
    Ok(report)
}
