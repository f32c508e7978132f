use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::lockers::BalanceLocker;
use crate::{AccountId, DecrementRequest, OperationOutcome, RunError};

/// Shape of one benchmark run. Every field must be given explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkloadConfig {
    pub account_count: usize,
    pub initial_balance: i64,
    pub decrement_amount: i64,
    /// Operations spawned per account per launch.
    pub multiplier: usize,
    pub launches: usize,
}

impl WorkloadConfig {
    pub fn operations_per_launch(&self) -> usize {
        self.account_count * self.multiplier
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.account_count == 0 {
            return Err(RunError::InvalidConfig("account_count must be positive"));
        }
        if self.initial_balance < 0 {
            return Err(RunError::InvalidConfig(
                "initial_balance must not be negative",
            ));
        }
        if self.decrement_amount <= 0 {
            return Err(RunError::InvalidConfig("decrement_amount must be positive"));
        }
        if self.multiplier == 0 {
            return Err(RunError::InvalidConfig("multiplier must be positive"));
        }
        if self.launches == 0 {
            return Err(RunError::InvalidConfig("launches must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub elapsed: Duration,
    pub successes: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone)]
pub struct WorkloadReport {
    pub strategy: &'static str,
    pub launches: Vec<LaunchReport>,
    /// Wall clock from the first spawn to the last barrier.
    pub total_elapsed: Duration,
}

impl WorkloadReport {
    pub fn successes(&self) -> u64 {
        self.launches.iter().map(|launch| launch.successes).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.launches.iter().map(|launch| launch.skipped).sum()
    }

    /// Mean of the per-launch durations.
    pub fn average_launch(&self) -> Duration {
        if self.launches.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.launches.iter().map(|launch| launch.elapsed).sum();
        sum / u32::try_from(self.launches.len()).unwrap_or(u32::MAX)
    }
}

/// Runs `config.launches` launches against the given accounts.
///
/// Stops at the first failed decrement; skipped decrements are only counted.
pub async fn drive<L: BalanceLocker>(
    locker: &Arc<L>,
    ids: &[AccountId],
    config: &WorkloadConfig,
) -> Result<WorkloadReport, RunError> {
    config.validate()?;
    if ids.is_empty() {
        return Err(RunError::InvalidConfig("no accounts to decrement"));
    }

    let started = Instant::now();
    let mut launches = Vec::with_capacity(config.launches);
    for index in 0..config.launches {
        let report = launch(locker, ids, config).await?;
        debug!(
            strategy = locker.name(),
            launch = index,
            elapsed_ms = report.elapsed.as_millis() as u64,
            successes = report.successes,
            skipped = report.skipped,
            "launch finished"
        );
        launches.push(report);
    }

    Ok(WorkloadReport {
        strategy: locker.name(),
        launches,
        total_elapsed: started.elapsed(),
    })
}

/// One launch: spawns every operation at once, then joins all of them.
async fn launch<L: BalanceLocker>(
    locker: &Arc<L>,
    ids: &[AccountId],
    config: &WorkloadConfig,
) -> Result<LaunchReport, RunError> {
    let started = Instant::now();
    let mut tasks = JoinSet::new();
    for j in 0..config.operations_per_launch() {
        let locker = Arc::clone(locker);
        let request = DecrementRequest::new(ids[j % ids.len()], config.decrement_amount);
        tasks.spawn(async move { (request.account, locker.decrement(request).await) });
    }

    let mut report = LaunchReport::default();
    // Barrier: the launch is over only once every task has been joined.
    while let Some(joined) = tasks.join_next().await {
        let (account, outcome) = joined?;
        match outcome {
            OperationOutcome::Success => report.successes += 1,
            OperationOutcome::Skipped(_) => report.skipped += 1,
            OperationOutcome::Failed(cause) => {
                error!(
                    strategy = locker.name(),
                    account,
                    error = %cause,
                    "decrement failed, aborting run"
                );
                tasks.abort_all();
                return Err(RunError::OperationFailed { account, cause });
            }
        }
    }
    report.elapsed = started.elapsed();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockers::{MutexLocker, OptimisticLocker};
    use crate::stores::scripted::{Fault, ScriptedStore};
    use crate::stores::{BalanceStore, MemoryStore};
    use crate::Failure;

    fn config(
        account_count: usize,
        initial_balance: i64,
        multiplier: usize,
        launches: usize,
    ) -> WorkloadConfig {
        WorkloadConfig {
            account_count,
            initial_balance,
            decrement_amount: 1,
            multiplier,
            launches,
        }
    }

    #[test]
    fn test_validate_rejects_degenerate_workloads() {
        assert!(config(20, 100, 10, 12).validate().is_ok());
        assert!(config(20, 0, 10, 12).validate().is_ok());

        assert!(config(0, 100, 10, 12).validate().is_err());
        assert!(config(20, -1, 10, 12).validate().is_err());
        assert!(config(20, 100, 0, 12).validate().is_err());
        assert!(config(20, 100, 10, 0).validate().is_err());

        let mut zero_amount = config(20, 100, 10, 12);
        zero_amount.decrement_amount = 0;
        assert!(matches!(
            zero_amount.validate(),
            Err(RunError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_operations_per_launch() {
        assert_eq!(config(20, 100, 10, 12).operations_per_launch(), 200);
    }

    #[test]
    fn test_average_launch() {
        let report = WorkloadReport {
            strategy: "mutex",
            launches: vec![
                LaunchReport {
                    elapsed: Duration::from_millis(10),
                    successes: 3,
                    skipped: 1,
                },
                LaunchReport {
                    elapsed: Duration::from_millis(30),
                    successes: 0,
                    skipped: 4,
                },
            ],
            total_elapsed: Duration::from_millis(41),
        };
        assert_eq!(report.average_launch(), Duration::from_millis(20));
        assert_eq!(report.successes(), 3);
        assert_eq!(report.skipped(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drive_counts_outcomes_per_launch() {
        let store = Arc::new(MemoryStore::new("optimistic_lock").unwrap());
        let ids = store.create_accounts(3, 4).await.unwrap();
        let locker = Arc::new(OptimisticLocker::new(Arc::clone(&store)));

        // 6 operations per launch over 3 accounts holding 4 each.
        let report = drive(&locker, &ids, &config(3, 4, 2, 3)).await.unwrap();

        assert_eq!(report.strategy, "optimistic");
        assert_eq!(report.launches.len(), 3);
        assert_eq!(report.launches[0].successes, 6);
        assert_eq!(report.launches[1].successes, 6);
        assert_eq!(report.launches[2].successes, 0);
        assert_eq!(report.launches[2].skipped, 6);
        assert_eq!(report.successes(), 12);
        assert_eq!(report.skipped(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drive_aborts_on_first_failure() {
        let store = Arc::new(ScriptedStore::new(Fault::Apply, 5));
        let ids = store.create_accounts(2, 100).await.unwrap();
        let locker = Arc::new(MutexLocker::new(Arc::clone(&store)));

        let result = drive(&locker, &ids, &config(2, 100, 5, 4)).await;
        assert!(matches!(
            result,
            Err(RunError::OperationFailed {
                cause: Failure::Storage(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_drive_requires_accounts() {
        let store = Arc::new(MemoryStore::new("mutex").unwrap());
        let locker = Arc::new(MutexLocker::new(store));
        assert!(matches!(
            drive(&locker, &[], &config(1, 1, 1, 1)).await,
            Err(RunError::InvalidConfig(_))
        ));
    }
}
