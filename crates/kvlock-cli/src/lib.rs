//! kvlock CLI - command line access to distributed locks
//!
//! This crate provides:
//! - `Configuration`: layered settings from file, environment, and flags
//! - Logging setup for console and rolling file output
//! - The `ping` and `exec` subcommands

pub mod cli;
pub mod command;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use crate::config::Configuration;
pub use logging::{LoggingConfig, LoggingGuard, init_logging};
