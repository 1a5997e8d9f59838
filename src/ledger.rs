//! Ledger - point movement audit records
//!
//! Every committed charge or use produces exactly one [`HistoryRecord`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::{SeqId, TimestampMs, UserId};

/// Direction of a point movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Credit - balance increased
    Charge,
    /// Debit - balance decreased
    Use,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Charge => "CHARGE",
            TransactionType::Use => "USE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable history entry
///
/// `amount` is the delta moved by the operation, never the resulting balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub seq_id: SeqId,
    pub user_id: UserId,
    pub amount: u64,
    pub kind: TransactionType,
    pub timestamp_ms: TimestampMs,
}

impl HistoryRecord {
    /// Signed effect of this record on the user's balance.
    pub fn signed_delta(&self) -> i128 {
        match self.kind {
            TransactionType::Charge => self.amount as i128,
            TransactionType::Use => -(self.amount as i128),
        }
    }
}

/// Replay a user's history from zero and return the balance it implies.
///
/// Returns `None` if the replay ever goes negative, which means the records
/// are not a valid history for a single balance.
pub fn replay_balance(records: &[HistoryRecord]) -> Option<u64> {
    let mut balance: i128 = 0;
    for record in records {
        balance += record.signed_delta();
        if balance < 0 {
            return None;
        }
    }
    u64::try_from(balance).ok()
}
