mod config;
mod csv_utils;
mod error;
mod lockers;
mod outcome;
mod runner;
mod stores;

pub use crate::config::{LoggingSettings, Settings, StoreSettings};
pub use csv_utils::write_csv;
pub use error::{Failure, RunError, StoreError};
pub use lockers::{BalanceLocker, CriticalSectionProbe, MutexLocker, OptimisticLocker};
pub use outcome::{AccountId, DecrementRequest, OperationOutcome, SkipReason};
pub use runner::{
    drive, run, verify, LaunchReport, ReportRow, RunReport, WorkloadConfig, WorkloadReport,
};
#[cfg(feature = "postgres")]
pub use stores::{PgStore, PgTransaction};
pub use stores::{BalanceStore, MemoryStore, MemoryTransaction, StoreTransaction};
