//! Redis-backed key-value store
//!
//! Claims use `SET key value NX PX ttl`; releases evaluate the
//! compare-and-delete Lua script through `EVALSHA`, loading it on first use.

use std::time::Duration;

use async_trait::async_trait;
use kvlock_common::StoreError;
use kvlock_foundation::{COMPARE_AND_DELETE_SCRIPT, KvStore};
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::{debug, info};

/// Redis store sharing one multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    release_script: Script,
}

impl RedisStore {
    /// Open a connection manager for `url` (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)
            .map_err(|e| StoreError::Connection(format!("invalid redis url '{}': {}", url, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(StoreError::backend)?;

        info!(url = %url, "Connected to redis");
        Ok(Self::with_connection(conn))
    }

    /// Wrap an existing connection manager owned by the caller
    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            release_script: Script::new(COMPARE_AND_DELETE_SCRIPT),
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let ttl_ms = i64::try_from(ttl.as_millis())
            .map_err(|_| StoreError::Protocol(format!("ttl {:?} does not fit in PX", ttl)))?;
        let mut conn = self.conn.clone();

        // Replies OK when the key was set and nil when it already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(StoreError::backend)?;

        debug!(key = %key, set = reply.is_some(), "SET NX PX");
        Ok(reply.is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();

        let mut invocation = self.release_script.key(key);
        invocation.arg(expected);
        let deleted: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(StoreError::backend)?;

        debug!(key = %key, deleted, "Compare-and-delete script");
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::backend)?;

        if pong != "PONG" {
            return Err(StoreError::Protocol(format!(
                "unexpected PING reply '{}'",
                pong
            )));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
