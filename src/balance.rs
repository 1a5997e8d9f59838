//! Balance snapshot - the value held by the balance store for one user.
//!
//! # Enforcement Strategy:
//! 1. Fields are PRIVATE - a `Balance` is only ever built by a store
//! 2. Stores overwrite whole snapshots, never patch fields in place
//! 3. An unknown user is an explicit zero balance, not a missing value
use serde::{Deserialize, Serialize};

use crate::core_types::{MAX_POINT, TimestampMs, UserId};

/// Point balance of a single user at a moment in time
///
/// # Invariants:
/// - `MIN_POINT <= amount <= MAX_POINT` for every balance written through
///   the point service
/// - `updated_at_ms` is the time of the write that produced this snapshot
///   (or the read time for a never-written user)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    user_id: UserId,
    amount: u64,
    updated_at_ms: TimestampMs,
}

impl Balance {
    /// Snapshot as produced by a store write.
    pub(crate) const fn new(user_id: UserId, amount: u64, updated_at_ms: TimestampMs) -> Self {
        Self {
            user_id,
            amount,
            updated_at_ms,
        }
    }

    /// Zero balance for a user the store has never seen.
    pub(crate) const fn empty(user_id: UserId, now_ms: TimestampMs) -> Self {
        Self::new(user_id, 0, now_ms)
    }

    #[inline(always)]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[inline(always)]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    #[inline(always)]
    pub const fn updated_at_ms(&self) -> TimestampMs {
        self.updated_at_ms
    }

    /// Room left before the balance cap.
    #[inline]
    pub const fn headroom(&self) -> u64 {
        MAX_POINT.saturating_sub(self.amount)
    }
}
