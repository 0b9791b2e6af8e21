//! kvlock Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all kvlock components:
//! - Lock and store error types
//! - Ownership tokens minted at acquisition time
//! - Argument validation and duration parsing helpers

pub mod error;
pub mod token;
pub mod utils;

// Re-exports for convenience
pub use error::{LockError, StoreError};
pub use token::OwnershipToken;
pub use utils::{MAX_LOCK_TTL, parse_duration, validate_key, validate_ttl};

/// Default time-to-live applied when a caller does not choose one
pub const DEFAULT_LOCK_TTL_MS: u64 = 30_000;
