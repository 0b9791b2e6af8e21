// In-memory key-value store
// Keeps entries in a DashMap with per-entry expiry; claims and releases run
// under the owning shard's lock so both primitives stay atomic

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kvlock_common::StoreError;
use kvlock_foundation::KvStore;
use tokio::task::JoinHandle;
use tracing::debug;

/// A stored value and the instant it stops existing
///
/// `expires_at` is None when the deadline lies past what `Instant` can hold.
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(now))
    }
}

/// In-process store with the same claim and release semantics as Redis
///
/// Expired entries are invisible to every operation. They are dropped lazily
/// when touched, by [`MemoryStore::purge_expired`], or by the optional
/// background sweeper.
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
    sweeper: Option<JoinHandle<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sweeper: None,
        }
    }

    /// Create a store that purges expired entries every `interval`
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_sweeper(interval: Duration) -> Self {
        let entries: Arc<DashMap<String, StoredValue>> = Arc::new(DashMap::new());

        let entries_clone = entries.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            loop {
                interval.tick().await;
                let purged = purge(&entries_clone);
                if purged > 0 {
                    debug!(count = purged, "Cleaned up expired store entries");
                }
            }
        });

        Self {
            entries,
            sweeper: Some(handle),
        }
    }

    /// Current value of `key`, if present and not expired
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone())
    }

    /// Unconditionally set `key`, replacing any existing value
    pub fn set(&self, key: &str, value: &str, ttl: Duration) {
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
    }

    /// Unconditionally delete `key`, returning whether a live entry was removed
    pub fn remove(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired_at(now))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remaining time to live of `key`
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.remaining_at(now))
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

fn purge(entries: &DashMap<String, StoredValue>) -> usize {
    let now = Instant::now();
    let mut purged = 0;
    entries.retain(|_, entry| {
        let live = !entry.is_expired_at(now);
        if !live {
            purged += 1;
        }
        live
    });
    purged
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired_at(now) {
                    return Ok(false);
                }
                occupied.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<i64, StoreError> {
        let now = Instant::now();
        // Expired entries are dropped too, but only a live match counts
        let removed = self.entries.remove_if(key, |_, entry| {
            entry.is_expired_at(now) || entry.value == expected
        });

        Ok(match removed {
            Some((_, entry)) if !entry.is_expired_at(now) => 1,
            _ => 0,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
