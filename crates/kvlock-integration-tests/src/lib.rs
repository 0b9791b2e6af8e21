//! Shared helpers for kvlock end-to-end tests
//!
//! Tests in this crate talk to a real Redis at `KVLOCK_REDIS_URL`
//! (default `redis://127.0.0.1:6379`) and are ignored unless run with
//! `cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use kvlock_core::LockManager;
use kvlock_foundation::wait_until_ready;
use kvlock_store::RedisStore;
use redis::aio::ConnectionManager;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

pub fn redis_url() -> String {
    std::env::var("KVLOCK_REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string())
}

/// Raw connection used to seed and inspect keys behind the lock's back
pub async fn raw_connection() -> ConnectionManager {
    let client = redis::Client::open(redis_url()).expect("Invalid KVLOCK_REDIS_URL");
    ConnectionManager::new(client)
        .await
        .expect("Failed to connect to redis")
}

/// A lock manager over Redis, after the server answers PING
pub async fn redis_manager() -> LockManager {
    let store = RedisStore::connect(&redis_url())
        .await
        .expect("Failed to connect to redis");
    wait_until_ready(&store, Duration::from_millis(100), Duration::from_secs(10))
        .await
        .expect("Redis never became ready");
    LockManager::new(Arc::new(store))
}

/// Key unique to this test run so parallel runs do not collide
pub fn unique_key(name: &str) -> String {
    format!("kvlock-test:{}:{}", name, kvlock_common::OwnershipToken::generate())
}
