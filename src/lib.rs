//! point_ledger - Per-user point balances with an append-only history
//!
//! Charges and uses are serialised per user through a keyed lock registry;
//! different users never wait on each other.
//!
//! # Modules
//!
//! - [`core_types`] - Type aliases and point limits
//! - [`balance`] - Balance snapshot type
//! - [`ledger`] - History records
//! - [`store`] - Balance store and history log (traits + in-memory impls)
//! - [`lock_registry`] - One lock per user id
//! - [`service`] - Charge/use orchestration
//! - [`error`] - Validation and state-conflict errors
//! - [`workload`] - Concurrent load runner
//! - [`perf`] - Latency sampling

// Core types - must be first!
pub mod core_types;

pub mod balance;
pub mod error;
pub mod ledger;
pub mod lock_registry;
pub mod service;
pub mod store;

// Ambient
pub mod config;
pub mod logging;
pub mod perf;
pub mod workload;

// Convenient re-exports at crate root
pub use balance::Balance;
pub use core_types::{MAX_POINT, MAX_POINT_PER_CHARGE, MIN_POINT, SeqId, TimestampMs, UserId};
pub use error::{LedgerError, LedgerResult, StateConflictError, ValidationError};
pub use ledger::{HistoryRecord, TransactionType};
pub use lock_registry::KeyedLockRegistry;
pub use service::PointService;
pub use store::{BalanceStore, HistoryLog, InMemoryBalanceStore, InMemoryHistoryLog};
pub use workload::{WorkloadReport, run_workload};
