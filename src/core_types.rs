//! Core types and limits used throughout the ledger
//!
//! Type aliases give semantic meaning to raw integers; the point limits
//! are part of the public contract and never configurable.

/// User ID - primary key for balances, history and per-user locks.
pub type UserId = u64;

/// History sequence number.
///
/// # Constraints:
/// - **Global**: unique across the whole history log, not per user
/// - **Monotonic**: strictly increasing in append order
pub type SeqId = u64;

/// Wall-clock timestamp in milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// Lowest balance a user can hold.
pub const MIN_POINT: u64 = 0;

/// Balance cap. A charge that would push a balance above this is rejected.
pub const MAX_POINT: u64 = 1_000_000;

/// Largest amount accepted by a single charge.
pub const MAX_POINT_PER_CHARGE: u64 = 100_000;

/// Current wall-clock time in milliseconds.
#[inline]
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
