//! The key-value store trait

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kvlock_common::StoreError;

/// Key-value store the lock protocol runs against
///
/// Implementations must make both primitives atomic on the store side. The
/// lock never reads or writes keys through any other path.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Set `key` to `value` with expiration `ttl` only if `key` is absent
    ///
    /// Returns whether the set happened.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Delete `key` only if its current value equals `expected`
    ///
    /// Returns 1 when the key was deleted and 0 otherwise.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<i64, StoreError>;

    /// Check the store is reachable without touching any key
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name used in logs and metrics
    fn backend(&self) -> &'static str;
}

/// Store handle shared between a lock manager and the locks it hands out
pub type SharedStore = Arc<dyn KvStore>;
