//! Persistence boundary for the benchmark. Provides:
//! - The [`BalanceStore`] contract consumed by both lockers and the driver
//! - An in-process implementation with row-level write locks ([`MemoryStore`])
//! - A PostgreSQL implementation behind the `postgres` feature ([`PgStore`])
//!
//! A store owns exactly one namespace of `{id, amount}` rows. Each strategy
//! under test gets its own store so the namespaces never interfere.

use async_trait::async_trait;

use crate::{AccountId, StoreError};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(test)]
pub(crate) mod scripted;

pub use memory::{MemoryStore, MemoryTransaction};
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgTransaction};

#[async_trait]
pub trait BalanceStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    /// Name of the namespace (table) this store operates on.
    fn namespace(&self) -> &str;

    /// Bulk inserts `count` accounts holding `initial` each.
    /// Returns the generated ids in insertion order.
    async fn create_accounts(
        &self,
        count: usize,
        initial: i64,
    ) -> Result<Vec<AccountId>, StoreError>;

    /// Reads the committed balance of an account.
    async fn read_balance(&self, id: AccountId) -> Result<i64, StoreError>;

    /// Subtracts `amount` outside of any explicit transaction.
    /// Returns the number of rows the update matched.
    async fn apply_decrement(&self, id: AccountId, amount: i64) -> Result<u64, StoreError>;

    async fn count_negative_balances(&self) -> Result<u64, StoreError>;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// An open transaction.
///
/// Writes stay invisible to everyone else until [`commit`](Self::commit).
/// The first write to a row takes that row's write lock, which is held until
/// the transaction ends. Dropping a transaction without committing rolls it
/// back.
#[async_trait]
pub trait StoreTransaction: Send + 'static {
    async fn apply_decrement(&mut self, id: AccountId, amount: i64) -> Result<u64, StoreError>;

    /// Reads the balance as seen by this transaction, including its own writes.
    async fn read_balance(&mut self, id: AccountId) -> Result<i64, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Namespaces end up in SQL text, so only plain identifiers are accepted.
pub(crate) fn validate_namespace(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(name.to_owned()))
    }
}
