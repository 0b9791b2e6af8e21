//! Configuration management for kvlock
//!
//! Settings are layered, later sources winning:
//! 1. the configuration file (optional, default `conf/kvlock.yml`)
//! 2. `KVLOCK_`-prefixed environment variables, `__` separating levels
//! 3. command line flags

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use config::{Config, ConfigError, Environment};
use kvlock_common::{DEFAULT_LOCK_TTL_MS, parse_duration};
use kvlock_core::LockOptions;
use kvlock_store::{StoreBackend, StoreConfig};
use tracing::Level;

use crate::cli::Cli;
use crate::logging::{LogRotation, LoggingConfig};

const STORE_BACKEND: &str = "store.backend";
const STORE_REDIS_URL: &str = "store.redis.url";
const STORE_CONNECT_TIMEOUT_MS: &str = "store.connect_timeout_ms";
const STORE_SWEEP_INTERVAL_MS: &str = "store.sweep_interval_ms";
const LOCK_DEFAULT_TTL: &str = "lock.default_ttl";
const LOCK_OPERATION_TIMEOUT_MS: &str = "lock.operation_timeout_ms";
const LOGGING_LEVEL: &str = "logging.level";
const LOGGING_CONSOLE: &str = "logging.console";
const LOGGING_FILE: &str = "logging.file";
const LOGGING_DIR: &str = "logging.dir";
const LOGGING_ROTATION: &str = "logging.rotation";

/// Application configuration loaded from file, environment, and flags
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder()
            .add_source(config::File::from(cli.config.as_path()).required(false))
            .add_source(
                Environment::with_prefix("KVLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = &cli.backend {
            config_builder = config_builder.set_override(STORE_BACKEND, v.as_str())?;
        }
        if let Some(v) = &cli.redis_url {
            config_builder = config_builder.set_override(STORE_REDIS_URL, v.as_str())?;
        }
        if let Some(v) = &cli.log_level {
            config_builder = config_builder.set_override(LOGGING_LEVEL, v.as_str())?;
        }

        Ok(Configuration {
            config: config_builder.build()?,
        })
    }

    // ========================================================================
    // Store Configuration
    // ========================================================================

    pub fn store_backend(&self) -> anyhow::Result<StoreBackend> {
        match self.string(STORE_BACKEND)? {
            Some(v) => v
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid store.backend"),
            None => Ok(StoreBackend::default()),
        }
    }

    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let defaults = StoreConfig::default();

        Ok(StoreConfig {
            backend: self.store_backend()?,
            redis_url: self
                .string(STORE_REDIS_URL)?
                .unwrap_or(defaults.redis_url),
            connect_timeout: self
                .millis(STORE_CONNECT_TIMEOUT_MS)?
                .unwrap_or(defaults.connect_timeout),
            sweep_interval: self.millis(STORE_SWEEP_INTERVAL_MS)?,
        })
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    pub fn default_ttl(&self) -> anyhow::Result<Duration> {
        match self.string(LOCK_DEFAULT_TTL)? {
            Some(v) => parse_duration(&v)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a duration such as 30s or 500ms", v))
                .context("Invalid lock.default_ttl"),
            None => Ok(Duration::from_millis(DEFAULT_LOCK_TTL_MS)),
        }
    }

    pub fn lock_options(&self) -> anyhow::Result<LockOptions> {
        Ok(LockOptions {
            operation_timeout: self.millis(LOCK_OPERATION_TIMEOUT_MS)?,
        })
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> anyhow::Result<LoggingConfig> {
        let defaults = LoggingConfig::default();

        let level = match self.string(LOGGING_LEVEL)? {
            Some(v) => v
                .parse::<Level>()
                .map_err(|e| anyhow::anyhow!("'{}': {}", v, e))
                .context("Invalid logging.level")?,
            None => defaults.level,
        };
        let rotation = match self.string(LOGGING_ROTATION)? {
            Some(v) => v
                .parse::<LogRotation>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Invalid logging.rotation")?,
            None => defaults.rotation,
        };

        Ok(LoggingConfig {
            log_dir: self
                .string(LOGGING_DIR)?
                .map(|v| expand_home(&v))
                .unwrap_or(defaults.log_dir),
            console_output: self.flag(LOGGING_CONSOLE)?.unwrap_or(defaults.console_output),
            file_logging: self.flag(LOGGING_FILE)?.unwrap_or(defaults.file_logging),
            level,
            rotation,
        })
    }

    fn string(&self, key: &str) -> anyhow::Result<Option<String>> {
        optional(key, self.config.get_string(key))
    }

    fn flag(&self, key: &str) -> anyhow::Result<Option<bool>> {
        optional(key, self.config.get_bool(key))
    }

    /// Millisecond setting as a duration; missing or 0 yields None
    fn millis(&self, key: &str) -> anyhow::Result<Option<Duration>> {
        match optional(key, self.config.get_int(key))? {
            Some(v) if v < 0 => anyhow::bail!("Invalid {}: {} is negative", key, v),
            Some(0) | None => Ok(None),
            Some(v) => Ok(Some(Duration::from_millis(v as u64))),
        }
    }
}

/// A missing key is None; a key that is present but malformed is an error
fn optional<T>(key: &str, value: Result<T, ConfigError>) -> anyhow::Result<Option<T>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Invalid {}", key)),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}
