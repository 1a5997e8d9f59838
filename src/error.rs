//! Ledger Error Types
//!
//! Two families, split by *when* they can be detected:
//! - [`ValidationError`]: the input alone breaks a static limit; raised before
//!   any lock is taken
//! - [`StateConflictError`]: the input is fine but the user's current balance
//!   rejects it; raised only after re-reading state under the user's lock
//!
//! Neither family ever leaves partial state behind.

use thiserror::Error;

use crate::core_types::UserId;

/// Input violates a range rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Charge amount must be greater than zero: {amount}")]
    ZeroOrNegativeAmount { amount: i64 },

    #[error("Charge amount {amount} exceeds per-charge limit {limit}")]
    PerOperationLimitExceeded { amount: i64, limit: u64 },

    #[error("Use amount {amount} outside [{min}, {max}]")]
    InvalidUseAmount { amount: i64, min: u64, max: u64 },
}

/// Input conflicts with the user's current balance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateConflictError {
    #[error("User {user_id}: balance {current} + {requested} exceeds cap {cap}")]
    BalanceCapExceeded {
        user_id: UserId,
        current: u64,
        requested: u64,
        cap: u64,
    },

    #[error("User {user_id}: insufficient balance {current} for use of {requested}")]
    InsufficientBalance {
        user_id: UserId,
        current: u64,
        requested: u64,
    },
}

/// Every failure a charge or use can return
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    StateConflict(#[from] StateConflictError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(ValidationError::ZeroOrNegativeAmount { .. }) => "ZERO_POINT",
            LedgerError::Validation(ValidationError::PerOperationLimitExceeded { .. }) => {
                "LIMIT_ONETIME_CHARGE_AMOUNT"
            }
            LedgerError::Validation(ValidationError::InvalidUseAmount { .. }) => {
                "INVALID_USE_AMOUNT"
            }
            LedgerError::StateConflict(StateConflictError::BalanceCapExceeded { .. }) => {
                "OVER_CHARGE"
            }
            LedgerError::StateConflict(StateConflictError::InsufficientBalance { .. }) => {
                "NOT_ENOUGH_BALANCE"
            }
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) => 400,
            LedgerError::StateConflict(_) => 422,
        }
    }

    /// True if the error was raised before touching shared state.
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}
