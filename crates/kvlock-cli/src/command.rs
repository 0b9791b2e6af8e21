//! Subcommand implementations

use std::time::Duration;

use kvlock_common::{LockError, StoreError};
use kvlock_core::LockManager;
use kvlock_foundation::{SharedStore, out_of_time, wait_until_ready};
use kvlock_store::{StoreConfig, connect};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Exit code for a contended lock (EX_TEMPFAIL)
pub const EXIT_LOCK_CONTENDED: i32 = 75;
/// Exit code when the store cannot be reached (EX_UNAVAILABLE)
pub const EXIT_STORE_UNAVAILABLE: i32 = 69;
/// Exit code when release finds the lock was lost (EX_SOFTWARE)
pub const EXIT_LOCK_LOST: i32 = 70;
/// Exit code for invalid arguments or configuration (EX_USAGE)
pub const EXIT_USAGE: i32 = 64;
/// Exit code when the command exists but could not be started
pub const EXIT_CANNOT_EXECUTE: i32 = 126;
/// Exit code when the command was not found
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Map a lock failure to the process exit code reported for it
pub fn exit_code_for(err: &LockError) -> i32 {
    match err {
        LockError::LockContended { .. } => EXIT_LOCK_CONTENDED,
        LockError::LockNotHeld { .. } => EXIT_LOCK_LOST,
        LockError::StoreUnavailable(_) => EXIT_STORE_UNAVAILABLE,
        LockError::IllegalArgument(_) => EXIT_USAGE,
    }
}

/// Map a failure to start the child to the exit code shells use for it
pub fn exit_code_for_spawn(err: &std::io::Error) -> i32 {
    match err.kind() {
        std::io::ErrorKind::NotFound => EXIT_COMMAND_NOT_FOUND,
        _ => EXIT_CANNOT_EXECUTE,
    }
}

/// Build the configured store, retrying for up to `wait` when given
pub async fn connect_store(
    config: &StoreConfig,
    wait: Option<Duration>,
) -> Result<SharedStore, StoreError> {
    let Some(wait) = wait else {
        return connect(config).await;
    };

    let give_up_at = Instant::now().checked_add(wait);
    let store = loop {
        match connect(config).await {
            Ok(store) => break store,
            Err(e) if !out_of_time(give_up_at, READY_POLL_INTERVAL) => {
                warn!(backend = %config.backend, error = %e, "Store not reachable yet, retrying");
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
            Err(e) => return Err(e),
        }
    };

    let remaining = give_up_at.map_or(wait, |at| at.saturating_duration_since(Instant::now()));
    wait_until_ready(store.as_ref(), READY_POLL_INTERVAL, remaining).await?;
    Ok(store)
}

/// `kvlock ping`: report whether the store answers
pub async fn ping(store: &SharedStore) -> i32 {
    match store.ping().await {
        Ok(()) => {
            info!(backend = store.backend(), "Store is reachable");
            0
        }
        Err(e) => {
            error!(backend = store.backend(), error = %e, "Store ping failed");
            EXIT_STORE_UNAVAILABLE
        }
    }
}

/// `kvlock exec`: claim `key`, run `command`, release
///
/// The command never runs when the claim fails. Its exit code (126 or 127
/// when it could not be started) is returned unless the release shows the
/// lock was lost or the store failed.
pub async fn exec(
    manager: &LockManager,
    key: &str,
    ttl: Duration,
    command: &[String],
) -> anyhow::Result<i32> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("no command given to exec");
    };

    let lock = match manager.try_acquire(key, ttl).await {
        Ok(lock) => lock,
        Err(e) => {
            error!(key = %key, error = %e, "Could not acquire lock");
            return Ok(exit_code_for(&e));
        }
    };
    info!(key = %key, ttl_ms = ttl.as_millis() as u64, program = %program, "Lock acquired, running command");

    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await;

    let release = lock.release().await;

    let child_code = match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            error!(key = %key, program = %program, error = %e, "Failed to start command");
            exit_code_for_spawn(&e)
        }
    };

    match release {
        Ok(()) => {
            info!(key = %key, exit_code = child_code, "Command finished, lock released");
            Ok(child_code)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Lock release failed after command finished");
            Ok(exit_code_for(&e))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use kvlock_store::{MemoryStore, StoreBackend};
    use std::sync::Arc;

    const MINUTE: Duration = Duration::from_secs(60);

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_exec_runs_and_releases() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let code = exec(
            &manager,
            "exec-key",
            MINUTE,
            &sh(&format!("touch {}", marker.display())),
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
        assert!(marker.exists());
        assert!(!store.contains_key("exec-key"));
    }

    #[tokio::test]
    async fn test_exec_propagates_child_exit_code() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());

        let code = exec(&manager, "exec-key", MINUTE, &sh("exit 3"))
            .await
            .unwrap();

        assert_eq!(code, 3);
        assert!(!store.contains_key("exec-key"));
    }

    #[tokio::test]
    async fn test_exec_contended_skips_command() {
        let store = Arc::new(MemoryStore::new());
        store.set("busy-key", "other-holder", MINUTE);
        let manager = LockManager::new(store.clone());
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let code = exec(
            &manager,
            "busy-key",
            MINUTE,
            &sh(&format!("touch {}", marker.display())),
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_LOCK_CONTENDED);
        assert!(!marker.exists());
        assert_eq!(store.get("busy-key").as_deref(), Some("other-holder"));
    }

    #[tokio::test]
    async fn test_exec_reports_lost_lock() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());

        let code = exec(&manager, "short-key", Duration::from_millis(20), &sh("sleep 0.2"))
            .await
            .unwrap();

        assert_eq!(code, EXIT_LOCK_LOST);
    }

    #[tokio::test]
    async fn test_exec_missing_program_still_releases() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());

        let code = exec(
            &manager,
            "exec-key",
            MINUTE,
            &["/nonexistent/kvlock-test-binary".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_COMMAND_NOT_FOUND);
        assert_ne!(code, EXIT_USAGE);
        assert!(!store.contains_key("exec-key"));
    }

    #[tokio::test]
    async fn test_exec_non_executable_program() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());
        let dir = tempfile::tempdir().unwrap();

        // A directory exists but cannot be executed
        let code = exec(
            &manager,
            "exec-key",
            MINUTE,
            &[dir.path().display().to_string()],
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_CANNOT_EXECUTE);
        assert!(!store.contains_key("exec-key"));
    }

    #[tokio::test]
    async fn test_exec_huge_ttl_is_usage_error() {
        let store = Arc::new(MemoryStore::new());
        let manager = LockManager::new(store.clone());

        let code = exec(&manager, "exec-key", Duration::from_secs(u64::MAX / 2), &sh("true"))
            .await
            .unwrap();

        assert_eq!(code, EXIT_USAGE);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_connect_store_with_unbounded_wait() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        let store = connect_store(&config, Some(Duration::MAX)).await.unwrap();
        assert_eq!(ping(&store).await, 0);
    }

    #[tokio::test]
    async fn test_exec_invalid_key() {
        let manager = LockManager::new(Arc::new(MemoryStore::new()));
        let code = exec(&manager, "", MINUTE, &sh("true")).await.unwrap();
        assert_eq!(code, EXIT_USAGE);
    }

    #[tokio::test]
    async fn test_ping_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        let store = connect_store(&config, Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(ping(&store).await, 0);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&LockError::contended("k")), EXIT_LOCK_CONTENDED);
        assert_eq!(exit_code_for(&LockError::not_held("k")), EXIT_LOCK_LOST);
        assert_eq!(
            exit_code_for(&LockError::from(StoreError::Cancelled)),
            EXIT_STORE_UNAVAILABLE
        );
        assert_eq!(
            exit_code_for(&LockError::IllegalArgument("empty".to_string())),
            EXIT_USAGE
        );
    }
}
