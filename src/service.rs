//! Point Service - charge/use orchestration
//!
//! # Mutation path
//!
//! ```text
//! charge/use ──▶ validate input ──▶ lock(user) ──▶ read ──▶ check ──▶ write ──▶ append ──▶ unlock
//!                    │ (no lock)                              │
//!                    ▼                                        ▼
//!             ValidationError                        StateConflictError
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Re-read under lock**: the balance is always read after the user's lock
//!    is held, never trusted from a pre-lock snapshot, so no update is lost
//! 2. **Write before append**: the history record is appended only after the
//!    balance write, still under the lock, so per-user history order equals
//!    commit order
//! 3. **Per-user granularity**: locks come from [`KeyedLockRegistry`]; users
//!    never contend with each other
//! 4. **All-or-nothing**: every rejection happens before the write
//!
//! Reads (`balance`, `history`) take no lock and may trail an in-flight write.

use std::sync::{Arc, PoisonError};
use tracing::{debug, info, warn};

use crate::balance::Balance;
use crate::config::StoreConfig;
use crate::core_types::{MAX_POINT, MAX_POINT_PER_CHARGE, MIN_POINT, UserId, now_ms};
use crate::error::{LedgerResult, StateConflictError, ValidationError};
use crate::ledger::{HistoryRecord, TransactionType};
use crate::lock_registry::KeyedLockRegistry;
use crate::store::{BalanceStore, HistoryLog, InMemoryBalanceStore, InMemoryHistoryLog};

/// Check a charge amount against the static limits.
pub fn validate_charge_amount(amount: i64) -> Result<u64, ValidationError> {
    if amount <= MIN_POINT as i64 {
        return Err(ValidationError::ZeroOrNegativeAmount { amount });
    }
    let amount_u = amount as u64;
    if amount_u > MAX_POINT_PER_CHARGE {
        return Err(ValidationError::PerOperationLimitExceeded {
            amount,
            limit: MAX_POINT_PER_CHARGE,
        });
    }
    Ok(amount_u)
}

/// Check a use amount against the static limits. Zero is accepted.
pub fn validate_use_amount(amount: i64) -> Result<u64, ValidationError> {
    if amount < MIN_POINT as i64 || amount as u64 > MAX_POINT {
        return Err(ValidationError::InvalidUseAmount {
            amount,
            min: MIN_POINT,
            max: MAX_POINT,
        });
    }
    Ok(amount as u64)
}

/// Point Service - the only writer of balances and history
pub struct PointService {
    balances: Arc<dyn BalanceStore>,
    history: Arc<dyn HistoryLog>,
    locks: KeyedLockRegistry,
}

impl PointService {
    /// Create a service over the given stores
    pub fn new(balances: Arc<dyn BalanceStore>, history: Arc<dyn HistoryLog>) -> Self {
        Self {
            balances,
            history,
            locks: KeyedLockRegistry::new(),
        }
    }

    /// Create a service over fresh in-memory stores
    pub fn in_memory(config: StoreConfig) -> Self {
        info!(
            read_latency = ?config.read_latency_ms,
            write_latency = ?config.write_latency_ms,
            "Point service started with in-memory stores"
        );
        Self::new(
            Arc::new(InMemoryBalanceStore::with_config(config)),
            Arc::new(InMemoryHistoryLog::with_config(config)),
        )
    }

    /// Credit `amount` points to a user.
    ///
    /// # Errors
    /// - `ZeroOrNegativeAmount` / `PerOperationLimitExceeded` before locking
    /// - `BalanceCapExceeded` if the result would exceed `MAX_POINT`
    pub fn charge(&self, user_id: UserId, amount: i64) -> LedgerResult<Balance> {
        let amount = validate_charge_amount(amount).inspect_err(|e| {
            debug!(user_id, error = %e, "Charge rejected");
        })?;

        let lock = self.locks.acquire(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.balances.read(user_id);
        let headroom = current.headroom();
        if amount > headroom {
            warn!(
                user_id,
                current = current.amount(),
                amount,
                headroom,
                "Charge would exceed balance cap"
            );
            return Err(StateConflictError::BalanceCapExceeded {
                user_id,
                current: current.amount(),
                requested: amount,
                cap: MAX_POINT,
            }
            .into());
        }

        let written = self
            .balances
            .write(user_id, current.amount() + amount, now_ms());
        let record = self.history.append(
            user_id,
            amount,
            TransactionType::Charge,
            written.updated_at_ms(),
        );
        debug!(
            user_id,
            amount,
            balance = written.amount(),
            seq_id = record.seq_id,
            "Charge committed"
        );
        Ok(written)
    }

    /// Debit `amount` points from a user.
    ///
    /// # Errors
    /// - `InvalidUseAmount` before locking
    /// - `InsufficientBalance` if the balance is below `amount`
    pub fn use_points(&self, user_id: UserId, amount: i64) -> LedgerResult<Balance> {
        let amount = validate_use_amount(amount).inspect_err(|e| {
            debug!(user_id, error = %e, "Use rejected");
        })?;

        let lock = self.locks.acquire(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.balances.read(user_id).amount();
        let Some(remaining) = current.checked_sub(amount) else {
            warn!(user_id, current, amount, "Insufficient balance");
            return Err(StateConflictError::InsufficientBalance {
                user_id,
                current,
                requested: amount,
            }
            .into());
        };

        let written = self.balances.write(user_id, remaining, now_ms());
        let record = self.history.append(
            user_id,
            amount,
            TransactionType::Use,
            written.updated_at_ms(),
        );
        debug!(
            user_id,
            amount,
            balance = written.amount(),
            seq_id = record.seq_id,
            "Use committed"
        );
        Ok(written)
    }

    /// Current balance snapshot (no lock)
    pub fn balance(&self, user_id: UserId) -> Balance {
        self.balances.read(user_id)
    }

    /// Full history of a user in commit order (no lock)
    pub fn history(&self, user_id: UserId) -> Vec<HistoryRecord> {
        self.history.read_all(user_id)
    }

    /// Number of users that have ever taken a mutation lock
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }
}
