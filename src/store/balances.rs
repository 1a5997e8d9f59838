//! In-memory balance store backed by a sharded concurrent map.

use dashmap::DashMap;

use super::BalanceStore;
use super::latency;
use crate::balance::Balance;
use crate::config::StoreConfig;
use crate::core_types::{TimestampMs, UserId, now_ms};

/// Thread-safe balance table.
///
/// `Balance` is `Copy` and replaced whole on every write, so readers never
/// observe a partially updated snapshot.
pub struct InMemoryBalanceStore {
    balances: DashMap<UserId, Balance>,
    config: StoreConfig,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            balances: DashMap::new(),
            config,
        }
    }

    /// Number of users that have been written at least once.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for InMemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn read(&self, user_id: UserId) -> Balance {
        latency::simulate(self.config.read_latency_ms);
        self.balances
            .get(&user_id)
            .map(|entry| *entry.value())
            .unwrap_or_else(|| Balance::empty(user_id, now_ms()))
    }

    fn write(&self, user_id: UserId, amount: u64, timestamp_ms: TimestampMs) -> Balance {
        latency::simulate(self.config.write_latency_ms);
        let balance = Balance::new(user_id, amount, timestamp_ms);
        self.balances.insert(user_id, balance);
        balance
    }
}
