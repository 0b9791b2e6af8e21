//! Command line arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kvlock_common::parse_duration;

/// Command line arguments for kvlock
#[derive(Debug, Parser)]
#[command(
    name = "kvlock",
    version,
    about = "Distributed mutual exclusion over a shared key-value store"
)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        env = "KVLOCK_CONFIG",
        default_value = "conf/kvlock.yml"
    )]
    pub config: PathBuf,

    /// Store backend override (redis | memory)
    #[arg(long = "backend")]
    pub backend: Option<String>,

    /// Redis URL override
    #[arg(long = "redis-url", env = "KVLOCK_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the configured store answers
    Ping {
        /// Keep retrying for up to this long (e.g. 30s)
        #[arg(long, value_parser = parse_duration_arg)]
        wait: Option<Duration>,
    },
    /// Run a command while holding a lock on KEY
    Exec {
        /// Lock key
        #[arg(short, long)]
        key: String,

        /// Lock time-to-live (defaults to lock.default_ttl)
        #[arg(short, long, value_parser = parse_duration_arg)]
        ttl: Option<Duration>,

        /// Program and arguments, after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{}', expected e.g. 500ms, 30s, 1m", s))
}
