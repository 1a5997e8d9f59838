//! Keyed lock registry - one exclusive lock per user id.
//!
//! Locks are created lazily on first request and kept for the life of the
//! registry. Creation goes through the DashMap entry API, which holds the
//! shard write lock across the lookup and the insert, so two threads racing
//! on an unseen id always end up with the same `Arc`.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::core_types::UserId;

/// Handle to one user's lock
pub type UserLock = Arc<Mutex<()>>;

/// Thread-safe map from user id to that user's lock.
///
/// No eviction: memory grows with the number of distinct users seen.
pub struct KeyedLockRegistry {
    locks: DashMap<UserId, UserLock>,
}

impl KeyedLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get or create the lock for a user.
    ///
    /// Repeated calls with the same id return clones of one `Arc`.
    pub fn acquire(&self, user_id: UserId) -> UserLock {
        // Fast path: shard read lock only
        if let Some(lock) = self.locks.get(&user_id) {
            return Arc::clone(lock.value());
        }

        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(lock.value())
    }

    /// Number of users with a lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for KeyedLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
