//! kvlock Core - distributed locks over a shared key-value store
//!
//! This crate provides:
//! - `LockManager`: claims a key with a fresh ownership token (`SET NX` semantics)
//! - `Lock`: the handle proving ownership, released by atomic compare-and-delete
//! - Metric names and descriptions for lock outcomes
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kvlock_core::LockManager;
//! # async fn demo(store: kvlock_foundation::SharedStore) -> Result<(), kvlock_common::LockError> {
//! let manager = LockManager::new(store);
//! let lock = manager.try_acquire("orders-42", Duration::from_secs(60)).await?;
//! // critical section
//! lock.release().await?;
//! # Ok(())
//! # }
//! ```

mod lock;
mod manager;
pub mod metrics;
mod round_trip;

#[cfg(test)]
mod test_support;

pub use lock::Lock;
pub use manager::{LockManager, LockOptions};

pub use kvlock_common::{LockError, MAX_LOCK_TTL, OwnershipToken, StoreError};
pub use kvlock_foundation::{KvStore, SharedStore};
