//! Keyed critical sections.
//!
//! Per-community and per-suggestion mutations must serialize without
//! blocking unrelated keys. Each key lazily gets its own async mutex; the
//! `Arc` is cloned out of the dashmap shard before locking so no shard
//! guard is ever held across `.await`.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key async mutexes.
pub struct KeyedLocks<K> {
    inner: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Acquire the critical section for `key`, waiting behind any holder.
    /// The guard is owned and may be held across suspension points.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self
            .inner
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(1u64).await;
                let active = counter.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(active, Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _one = locks.acquire(1u64).await;
        // Must not deadlock while key 1 is held.
        let _two = locks.acquire(2u64).await;
    }
}
