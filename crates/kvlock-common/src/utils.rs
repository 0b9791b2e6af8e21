//! Utility functions for kvlock
//!
//! Argument checks shared by the lock protocol and the command line.

use std::time::Duration;

use crate::error::LockError;

/// Reject empty lock keys before any store round trip
///
/// # Examples
///
/// ```
/// use kvlock_common::validate_key;
///
/// assert!(validate_key("orders-42").is_ok());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), LockError> {
    if key.is_empty() {
        return Err(LockError::IllegalArgument(
            "lock key must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Longest TTL a lock may be claimed for (100 years)
///
/// Well inside what a Redis `PX` argument and a monotonic clock deadline can
/// both hold.
pub const MAX_LOCK_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Reject TTLs the store cannot represent
///
/// Expiration is set with millisecond precision, so anything below one
/// millisecond would be a lock that never exists.
pub fn validate_ttl(ttl: Duration) -> Result<(), LockError> {
    if ttl.as_millis() == 0 {
        return Err(LockError::IllegalArgument(format!(
            "lock ttl must be at least 1ms, got {:?}",
            ttl
        )));
    }
    if ttl > MAX_LOCK_TTL {
        return Err(LockError::IllegalArgument(format!(
            "lock ttl must be at most {}s, got {:?}",
            MAX_LOCK_TTL.as_secs(),
            ttl
        )));
    }
    Ok(())
}

/// Parse a human duration such as `500ms`, `15s`, `1m` or `2h`
///
/// A bare number is read as seconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kvlock_common::parse_duration;
///
/// assert_eq!(parse_duration("15s"), Some(Duration::from_secs(15)));
/// assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1u64)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1000u64)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60_000u64)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3_600_000u64)
    } else {
        (s, 1000u64) // default to seconds
    };

    num_str
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .map(Duration::from_millis)
}
