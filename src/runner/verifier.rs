use serde::Serialize;
use std::time::Duration;

use super::driver::WorkloadReport;
use crate::stores::BalanceStore;
use crate::RunError;

/// Scans the namespace for negative balances. Any hit fails the run.
pub async fn verify<S: BalanceStore>(store: &S) -> Result<(), RunError> {
    let negative = store
        .count_negative_balances()
        .await
        .map_err(RunError::Verify)?;
    if negative != 0 {
        return Err(RunError::InvariantViolated(negative));
    }
    Ok(())
}

/// Outcome of a complete, verified run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub namespace: String,
    pub accounts: usize,
    pub operations_per_launch: usize,
    pub workload: WorkloadReport,
    pub negative_balances: u64,
}

impl RunReport {
    pub fn average_launch(&self) -> Duration {
        self.workload.average_launch()
    }
}

/// One line of the CSV summary.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReportRow {
    pub strategy: &'static str,
    pub namespace: String,
    pub accounts: usize,
    pub operations_per_launch: usize,
    pub launches: usize,
    pub successes: u64,
    pub skipped: u64,
    pub total_ms: u64,
    pub average_launch_ms: u64,
    pub negative_balances: u64,
}

impl From<&RunReport> for ReportRow {
    fn from(report: &RunReport) -> Self {
        Self {
            strategy: report.workload.strategy,
            namespace: report.namespace.clone(),
            accounts: report.accounts,
            operations_per_launch: report.operations_per_launch,
            launches: report.workload.launches.len(),
            successes: report.workload.successes(),
            skipped: report.workload.skipped(),
            total_ms: report.workload.total_elapsed.as_millis() as u64,
            average_launch_ms: report.average_launch().as_millis() as u64,
            negative_balances: report.negative_balances,
        }
    }
}
