//! Lock handle and release
//!
//! Releasing runs the compare-and-delete primitive: the store removes the
//! key only while it still maps to this handle's token. A handle whose entry
//! expired or was taken over gets `LockNotHeld` and leaves the store alone.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::time::{Duration, Instant};

use kvlock_common::{LockError, OwnershipToken};
use kvlock_foundation::SharedStore;
use tracing::{debug, warn};

use crate::metrics;
use crate::round_trip::round_trip;

/// Proof of ownership for one claimed key
///
/// Only produced by a successful [`LockManager::try_acquire`](crate::LockManager::try_acquire).
/// Dropping the handle does not release the key; the entry then lives until
/// its TTL runs out.
pub struct Lock {
    store: SharedStore,
    key: String,
    token: OwnershipToken,
    ttl: Duration,
    acquired_at: Instant,
    operation_timeout: Option<Duration>,
}

impl Lock {
    pub(crate) fn new(
        store: SharedStore,
        key: String,
        token: OwnershipToken,
        ttl: Duration,
        operation_timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            key,
            token,
            ttl,
            acquired_at: Instant::now(),
            operation_timeout,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &OwnershipToken {
        &self.token
    }

    /// TTL the key was claimed with
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Local instant the claim succeeded
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// Release the key if the store still holds this lock's token
    ///
    /// Fails with `LockNotHeld` when the entry expired, was superseded, or was
    /// already released through this handle.
    pub async fn release(&self) -> Result<(), LockError> {
        self.release_with_cancel(std::future::pending()).await
    }

    /// Like [`release`](Self::release), abandoned when `cancel` resolves first
    ///
    /// A cancelled release fails with `StoreUnavailable(StoreError::Cancelled)`;
    /// whether the key was deleted is unknown.
    pub async fn release_with_cancel<C>(&self, cancel: C) -> Result<(), LockError>
    where
        C: Future<Output = ()>,
    {
        let result = self.compare_and_delete(cancel).await;
        metrics::record_release(metrics::outcome_label(&result, "released"));
        result
    }

    async fn compare_and_delete<C>(&self, cancel: C) -> Result<(), LockError>
    where
        C: Future<Output = ()>,
    {
        let deleted = round_trip(
            "compare_and_delete",
            self.operation_timeout,
            self.store
                .compare_and_delete(&self.key, self.token.as_str()),
            cancel,
        )
        .await
        .map_err(|e| {
            warn!(
                key = %self.key,
                backend = self.store.backend(),
                error = %e,
                "Lock release failed on store"
            );
            LockError::StoreUnavailable(e)
        })?;

        if deleted == 1 {
            debug!(
                key = %self.key,
                held_ms = self.acquired_at.elapsed().as_millis() as u64,
                "Lock released"
            );
            Ok(())
        } else {
            debug!(key = %self.key, "Lock not held at release");
            Err(LockError::not_held(&self.key))
        }
    }
}

impl Debug for Lock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("ttl", &self.ttl)
            .field("backend", &self.store.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockManager;
    use crate::test_support::{Call, Reply, StubStore};

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_release_sends_own_token() {
        let store = StubStore::new(Reply::Value(true), Reply::Value(1));
        let manager = LockManager::new(store.clone());

        let lock = manager.try_acquire("unlock-key", MINUTE).await.unwrap();
        lock.release().await.unwrap();

        assert_eq!(
            store.calls()[1],
            Call::CompareAndDelete {
                key: "unlock-key".to_string(),
                expected: lock.token().to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_release_lock_not_held() {
        let store = StubStore::new(Reply::Value(true), Reply::Value(0));
        let manager = LockManager::new(store);

        let lock = manager.try_acquire("lock-not-hold", MINUTE).await.unwrap();
        let err = lock.release().await.unwrap_err();
        assert!(matches!(err, LockError::LockNotHeld { ref key } if key == "lock-not-hold"));
    }

    #[tokio::test]
    async fn test_release_network_error() {
        let store = StubStore::new(Reply::Value(true), Reply::NetworkError);
        let manager = LockManager::new(store);

        let lock = manager.try_acquire("network-key", MINUTE).await.unwrap();
        let err = lock.release().await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(err.to_string().contains("network error"));
    }

    #[tokio::test]
    async fn test_release_cancelled() {
        let store = StubStore::new(Reply::Value(true), Reply::Value(1));
        let manager = LockManager::new(store.clone());

        let lock = manager.try_acquire("key", MINUTE).await.unwrap();
        let err = lock
            .release_with_cancel(std::future::ready(()))
            .await
            .unwrap_err();
        assert!(err.is_store_unavailable());
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_debug_hides_store() {
        let store = StubStore::new(Reply::Value(true), Reply::Value(1));
        let manager = LockManager::new(store);

        let lock = manager.try_acquire("debug-key", MINUTE).await.unwrap();
        let rendered = format!("{:?}", lock);
        assert!(rendered.contains("debug-key"));
        assert!(rendered.contains("stub"));
    }
}
