//! Waiting for a store to come up

use std::time::Duration;

use kvlock_common::StoreError;
use tokio::time::Instant;
use tracing::debug;

use crate::store::KvStore;

/// Poll `ping` every `interval` until it succeeds or `deadline` elapses
///
/// Returns the last ping error if the store never answered in time. A
/// deadline too far out for the clock to represent means waiting forever.
pub async fn wait_until_ready(
    store: &dyn KvStore,
    interval: Duration,
    deadline: Duration,
) -> Result<(), StoreError> {
    let give_up_at = Instant::now().checked_add(deadline);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match store.ping().await {
            Ok(()) => {
                debug!(backend = store.backend(), attempts, "Store is ready");
                return Ok(());
            }
            Err(e) => {
                if out_of_time(give_up_at, interval) {
                    return Err(e);
                }
                debug!(
                    backend = store.backend(),
                    attempts,
                    error = %e,
                    "Store not ready, retrying"
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Whether sleeping another `interval` would overshoot `give_up_at`
pub fn out_of_time(give_up_at: Option<Instant>, interval: Duration) -> bool {
    match give_up_at {
        Some(at) => Instant::now()
            .checked_add(interval)
            .is_none_or(|next| next > at),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store that refuses pings until `healthy_after` attempts were made
    struct FlakyStore {
        pings: AtomicU32,
        healthy_after: u32,
    }

    #[async_trait]
    impl KvStore for FlakyStore {
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> Result<bool, StoreError> {
            unreachable!("readiness checks never write")
        }

        async fn compare_and_delete(&self, _: &str, _: &str) -> Result<i64, StoreError> {
            unreachable!("readiness checks never delete")
        }

        async fn ping(&self) -> Result<(), StoreError> {
            let n = self.pings.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.healthy_after {
                Ok(())
            } else {
                Err(StoreError::Connection("connection refused".to_string()))
            }
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_retries() {
        let store = FlakyStore {
            pings: AtomicU32::new(0),
            healthy_after: 3,
        };

        wait_until_ready(&store, Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.pings.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_gives_up() {
        let store = FlakyStore {
            pings: AtomicU32::new(0),
            healthy_after: u32::MAX,
        };

        let err = wait_until_ready(&store, Duration::from_millis(100), Duration::from_millis(350))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
        assert_eq!(store.pings.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_unbounded_deadline() {
        let store = FlakyStore {
            pings: AtomicU32::new(0),
            healthy_after: 5,
        };

        wait_until_ready(&store, Duration::from_millis(10), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(store.pings.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_out_of_time() {
        assert!(!out_of_time(None, Duration::MAX));
        assert!(out_of_time(Some(Instant::now()), Duration::from_millis(1)));
        assert!(out_of_time(Some(Instant::now()), Duration::MAX));
    }
}
