//! In-memory append-only history log.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::HistoryLog;
use super::latency;
use crate::config::StoreConfig;
use crate::core_types::{TimestampMs, UserId};
use crate::ledger::{HistoryRecord, TransactionType};

/// Per-user vectors of records plus one global sequence counter.
///
/// The sequence number is drawn while the user's shard is write-locked, so
/// within one user `seq_id` order always equals vector order.
pub struct InMemoryHistoryLog {
    records: DashMap<UserId, Vec<HistoryRecord>>,
    next_seq: AtomicU64,
    config: StoreConfig,
}

impl InMemoryHistoryLog {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            records: DashMap::new(),
            next_seq: AtomicU64::new(1),
            config,
        }
    }

    /// Total records appended across all users.
    pub fn total_records(&self) -> u64 {
        self.next_seq.load(Ordering::Acquire) - 1
    }
}

impl Default for InMemoryHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionType,
        timestamp_ms: TimestampMs,
    ) -> HistoryRecord {
        latency::simulate(self.config.write_latency_ms);
        let mut entries = self.records.entry(user_id).or_default();
        let record = HistoryRecord {
            seq_id: self.next_seq.fetch_add(1, Ordering::AcqRel),
            user_id,
            amount,
            kind,
            timestamp_ms,
        };
        entries.push(record.clone());
        record
    }

    fn read_all(&self, user_id: UserId) -> Vec<HistoryRecord> {
        latency::simulate(self.config.read_latency_ms);
        self.records
            .get(&user_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_user_has_no_history() {
        let log = InMemoryHistoryLog::new();
        assert!(log.read_all(1).is_empty());
        assert_eq!(log.total_records(), 0);
    }

    #[test]
    fn test_append_assigns_increasing_seq() {
        let log = InMemoryHistoryLog::new();
        let a = log.append(1, 100, TransactionType::Charge, 10);
        let b = log.append(2, 50, TransactionType::Charge, 11);
        let c = log.append(1, 30, TransactionType::Use, 12);
        assert_eq!((a.seq_id, b.seq_id, c.seq_id), (1, 2, 3));
        assert_eq!(log.total_records(), 3);

        let user1 = log.read_all(1);
        assert_eq!(user1, vec![a, c]);
        assert_eq!(log.read_all(2), vec![b]);
    }

    #[test]
    fn test_concurrent_appends_keep_per_user_order() {
        let log = Arc::new(InMemoryHistoryLog::new());
        let mut handles = vec![];
        for user_id in 0..8u64 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                for i in 1..=200u64 {
                    log.append(user_id, i, TransactionType::Charge, 0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.total_records(), 8 * 200);
        for user_id in 0..8u64 {
            let records = log.read_all(user_id);
            assert_eq!(records.len(), 200);
            // Appended amounts come back in the order they were written
            let amounts: Vec<u64> = records.iter().map(|r| r.amount).collect();
            assert_eq!(amounts, (1..=200).collect::<Vec<_>>());
            assert!(records.windows(2).all(|w| w[0].seq_id < w[1].seq_id));
        }
    }
}
