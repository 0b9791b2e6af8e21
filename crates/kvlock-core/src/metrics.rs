// Metrics for lock outcomes
// Counters for acquire and release results, histogram for store latency

use std::time::Duration;

use kvlock_common::LockError;
use metrics::{counter, describe_counter, describe_histogram, histogram};

pub const ACQUIRE_TOTAL: &str = "kvlock_acquire_total";
pub const RELEASE_TOTAL: &str = "kvlock_release_total";
pub const STORE_ROUND_TRIP_SECONDS: &str = "kvlock_store_round_trip_seconds";

/// Initialize all metric descriptions
/// Should be called once at application startup, after the embedding process
/// has installed its `metrics` recorder. Without a recorder every update is a
/// no-op.
pub fn init_metrics() {
    describe_counter!(
        ACQUIRE_TOTAL,
        "Total number of lock acquisition attempts by outcome"
    );
    describe_counter!(
        RELEASE_TOTAL,
        "Total number of lock release attempts by outcome"
    );
    describe_histogram!(
        STORE_ROUND_TRIP_SECONDS,
        "Key-value store round trip duration in seconds"
    );
}

/// Outcome label for a finished lock operation
pub(crate) fn outcome_label<T>(result: &Result<T, LockError>, success: &'static str) -> &'static str {
    match result {
        Ok(_) => success,
        Err(LockError::LockContended { .. }) => "contended",
        Err(LockError::LockNotHeld { .. }) => "not_held",
        Err(LockError::StoreUnavailable(_)) => "unavailable",
        Err(LockError::IllegalArgument(_)) => "illegal_argument",
    }
}

pub(crate) fn record_acquire(outcome: &'static str) {
    counter!(ACQUIRE_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_release(outcome: &'static str) {
    counter!(RELEASE_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_round_trip(op: &'static str, elapsed: Duration) {
    histogram!(STORE_ROUND_TRIP_SECONDS, "op" => op).record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvlock_common::StoreError;

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(&Ok::<_, LockError>(()), "acquired"), "acquired");
        assert_eq!(
            outcome_label(&Err::<(), _>(LockError::contended("k")), "acquired"),
            "contended"
        );
        assert_eq!(
            outcome_label(&Err::<(), _>(LockError::not_held("k")), "released"),
            "not_held"
        );
        assert_eq!(
            outcome_label(
                &Err::<(), _>(LockError::from(StoreError::Cancelled)),
                "released"
            ),
            "unavailable"
        );
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        init_metrics();
        record_acquire("acquired");
        record_release("released");
        record_round_trip("set_if_absent", Duration::from_millis(3));
    }
}
