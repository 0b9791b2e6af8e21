//! Store configuration and backend construction

use std::sync::Arc;
use std::time::Duration;

use kvlock_common::StoreError;
use kvlock_foundation::SharedStore;
use tracing::info;

use crate::memory::MemoryStore;
use crate::redis_store::RedisStore;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Which store backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Redis,
    /// In-process store, only meaningful within a single process
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Redis => write!(f, "redis"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Store connection configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Maximum time to establish the initial connection
    pub connect_timeout: Duration,
    /// Sweep interval for the memory backend (None = lazy expiry only)
    pub sweep_interval: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            sweep_interval: None,
        }
    }
}

/// Build the configured store backend
pub async fn connect(config: &StoreConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            let store = match config.sweep_interval {
                Some(interval) => MemoryStore::with_sweeper(interval),
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Redis => {
            let store = tokio::time::timeout(
                config.connect_timeout,
                RedisStore::connect(&config.redis_url),
            )
            .await
            .map_err(|_| StoreError::Timeout(config.connect_timeout))??;
            Ok(Arc::new(store))
        }
    }
}
