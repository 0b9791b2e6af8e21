//! Lock acquisition
//!
//! A claim is a single conditional set: the key is written with a freshly
//! minted ownership token and the caller's TTL only if it does not exist.
//! Contention is reported immediately; retry policy belongs to the caller.

use std::future::Future;
use std::time::Duration;

use kvlock_common::{LockError, OwnershipToken, validate_key, validate_ttl};
use kvlock_foundation::SharedStore;
use tracing::{debug, warn};

use crate::lock::Lock;
use crate::metrics;
use crate::round_trip::round_trip;

/// Options applied to every store call made through a manager and its locks
#[derive(Debug, Clone, Default)]
pub struct LockOptions {
    /// Upper bound for a single store round trip (None = rely on the client)
    pub operation_timeout: Option<Duration>,
}

/// Hands out locks claimed in a shared key-value store
///
/// The manager keeps no state of its own beyond the store handle; cloning it
/// is cheap and every clone talks to the same store.
#[derive(Clone)]
pub struct LockManager {
    store: SharedStore,
    options: LockOptions,
}

impl LockManager {
    pub fn new(store: SharedStore) -> Self {
        Self::with_options(store, LockOptions::default())
    }

    pub fn with_options(store: SharedStore, options: LockOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Claim `key` for `ttl` if nobody holds it
    ///
    /// Fails with `LockContended` when the key already exists, leaving the
    /// stored value untouched, and with `StoreUnavailable` when the store
    /// call itself fails.
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Lock, LockError> {
        self.try_acquire_with_cancel(key, ttl, std::future::pending())
            .await
    }

    /// Like [`try_acquire`](Self::try_acquire), abandoned when `cancel` resolves first
    ///
    /// A cancelled claim fails with `StoreUnavailable(StoreError::Cancelled)`.
    /// The write may or may not have reached the store; if it did, the entry
    /// expires with its TTL.
    pub async fn try_acquire_with_cancel<C>(
        &self,
        key: &str,
        ttl: Duration,
        cancel: C,
    ) -> Result<Lock, LockError>
    where
        C: Future<Output = ()>,
    {
        let result = self.claim(key, ttl, cancel).await;
        metrics::record_acquire(metrics::outcome_label(&result, "acquired"));
        result
    }

    async fn claim<C>(&self, key: &str, ttl: Duration, cancel: C) -> Result<Lock, LockError>
    where
        C: Future<Output = ()>,
    {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let token = OwnershipToken::generate();
        let claimed = round_trip(
            "set_if_absent",
            self.options.operation_timeout,
            self.store.set_if_absent(key, token.as_str(), ttl),
            cancel,
        )
        .await
        .map_err(|e| {
            warn!(
                key = %key,
                backend = self.store.backend(),
                error = %e,
                "Lock claim failed on store"
            );
            LockError::StoreUnavailable(e)
        })?;

        if !claimed {
            debug!(key = %key, "Lock contended");
            return Err(LockError::contended(key));
        }

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Lock acquired");
        Ok(Lock::new(
            self.store.clone(),
            key.to_string(),
            token,
            ttl,
            self.options.operation_timeout,
        ))
    }
}
