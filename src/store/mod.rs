//! Storage collaborators of the point service
//!
//! Both stores are plain key-value primitives. They are safe for concurrent
//! access to *independent* user ids; serialising writers to the same id is
//! the caller's job (see [`crate::lock_registry`]).
//!
//! # Contract
//!
//! - [`BalanceStore::read`] never fails: an unknown user reads as a zero balance
//! - [`BalanceStore::write`] overwrites the whole snapshot atomically, so a
//!   concurrent reader sees either the old or the new value, never a mix
//! - [`HistoryLog::append`] assigns a globally increasing `seq_id`
//! - [`HistoryLog::read_all`] returns one user's records in append order

pub mod balances;
pub mod history;
mod latency;

pub use balances::InMemoryBalanceStore;
pub use history::InMemoryHistoryLog;

use crate::balance::Balance;
use crate::core_types::{TimestampMs, UserId};
use crate::ledger::{HistoryRecord, TransactionType};

/// Current balance per user
pub trait BalanceStore: Send + Sync {
    /// Latest snapshot, or a zero balance for a user never written.
    fn read(&self, user_id: UserId) -> Balance;

    /// Overwrite the user's balance and return the stored snapshot.
    fn write(&self, user_id: UserId, amount: u64, timestamp_ms: TimestampMs) -> Balance;
}

/// Append-only point movement log
pub trait HistoryLog: Send + Sync {
    /// Append one record; the log assigns its `seq_id`.
    fn append(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionType,
        timestamp_ms: TimestampMs,
    ) -> HistoryRecord;

    /// All records of one user, oldest first.
    fn read_all(&self, user_id: UserId) -> Vec<HistoryRecord>;
}
