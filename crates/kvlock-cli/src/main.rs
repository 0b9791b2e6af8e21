//! Main entry point for the kvlock command line tool.
//!
//! Any error that escapes `run` is a configuration or usage problem and
//! exits with 64. No metrics recorder is installed, so the lock metrics are
//! only observable when kvlock-core is embedded in a process that has one.

use anyhow::Context;
use clap::Parser;
use kvlock_cli::command::{self, EXIT_STORE_UNAVAILABLE, EXIT_USAGE};
use kvlock_cli::{Cli, Command, Configuration, init_logging};
use kvlock_core::LockManager;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("kvlock: {:#}", e);
            EXIT_USAGE
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let configuration = Configuration::load(&cli).context("Failed to load configuration")?;

    // Keep the guard until the command finishes so file output is flushed
    let _logging_guard = init_logging(&configuration.logging_config()?)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let store_config = configuration.store_config()?;

    match cli.command {
        Command::Ping { wait } => match command::connect_store(&store_config, wait).await {
            Ok(store) => Ok(command::ping(&store).await),
            Err(e) => {
                error!(backend = %store_config.backend, error = %e, "Store is not reachable");
                Ok(EXIT_STORE_UNAVAILABLE)
            }
        },
        Command::Exec { key, ttl, command: argv } => {
            let ttl = match ttl {
                Some(ttl) => ttl,
                None => configuration.default_ttl()?,
            };
            let lock_options = configuration.lock_options()?;

            let store = match command::connect_store(&store_config, None).await {
                Ok(store) => store,
                Err(e) => {
                    error!(backend = %store_config.backend, error = %e, "Store is not reachable");
                    return Ok(EXIT_STORE_UNAVAILABLE);
                }
            };

            let manager = LockManager::with_options(store, lock_options);
            command::exec(&manager, &key, ttl, &argv).await
        }
    }
}
