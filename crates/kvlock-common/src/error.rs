//! Error types for kvlock
//!
//! This module defines:
//! - `StoreError`: failures of a single round trip to the key-value store
//! - `LockError`: the outcome taxonomy of the lock protocol

use std::time::Duration;

/// Boxed error type carried by backend-specific store failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Transport and protocol level failures from the key-value store
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store operation cancelled")]
    Cancelled,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("backend error: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    /// Wrap any backend error, keeping it reachable through `source()`
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }

    /// Whether the outcome of the interrupted operation is unknown
    ///
    /// A timed out or cancelled call may or may not have been applied by the
    /// store; callers that care must read the key back.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Cancelled)
    }
}

/// Lock protocol errors
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// The key is already claimed by another holder (or by stale data)
    #[error("failed to preempt lock on key '{key}'")]
    LockContended { key: String },

    /// The store no longer holds this lock's token under the key
    #[error("lock on key '{key}' is not held")]
    LockNotHeld { key: String },

    /// The store round trip itself failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

impl LockError {
    pub fn contended(key: impl Into<String>) -> Self {
        LockError::LockContended { key: key.into() }
    }

    pub fn not_held(key: impl Into<String>) -> Self {
        LockError::LockNotHeld { key: key.into() }
    }

    pub fn is_contended(&self) -> bool {
        matches!(self, LockError::LockContended { .. })
    }

    pub fn is_not_held(&self) -> bool {
        matches!(self, LockError::LockNotHeld { .. })
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, LockError::StoreUnavailable(_))
    }

    /// Whether retrying the same call later could succeed
    ///
    /// Contention clears once the holder releases or the TTL lapses, and a
    /// store outage may be transient. A lost lock or a bad argument will not
    /// change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LockError::LockContended { .. } | LockError::StoreUnavailable(_)
        )
    }

    /// The key the failed operation targeted, when known
    pub fn key(&self) -> Option<&str> {
        match self {
            LockError::LockContended { key } | LockError::LockNotHeld { key } => Some(key),
            _ => None,
        }
    }
}
