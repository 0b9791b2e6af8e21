// Store round trip wrapper
// Bounds a single store call by the optional operation timeout and the
// caller's cancellation future, and records its latency

use std::future::Future;
use std::time::{Duration, Instant};

use kvlock_common::StoreError;

use crate::metrics;

pub(crate) async fn round_trip<T, F, C>(
    op: &'static str,
    timeout: Option<Duration>,
    call: F,
    cancel: C,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
    C: Future<Output = ()>,
{
    let started = Instant::now();

    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => call.await,
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel => Err(StoreError::Cancelled),
        result = bounded => result,
    };

    metrics::record_round_trip(op, started.elapsed());
    result
}
