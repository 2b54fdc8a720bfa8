//! Terminal runner for the Sprout idle farm.
//!
//! Wires together configuration, the on-disk document store, the identity
//! channel, and the farm loop. Player commands are read line by line from
//! stdin; Ctrl-C ends the current session with a final save.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `sprout-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the crop catalog
//! 4. Open the document store under the data directory
//! 5. Log in the configured user
//! 6. Start the stdin and Ctrl-C command feeders
//! 7. Run the farm loop
//! 8. Log the result

mod command;
mod error;

use std::path::Path;
use std::sync::Arc;

use sprout_core::clock::SystemClock;
use sprout_core::config::{ConfigError, FarmConfig};
use sprout_core::identity::Identity;
use sprout_core::runner::{self, FarmCommand, FarmContext};
use sprout_core::session::SessionSettings;
use sprout_db::FileStore;
use sprout_types::UserId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::CommandLine;
use crate::error::EngineError;

/// Buffered commands between the feeders and the farm loop.
const COMMAND_BUFFER: usize = 64;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, storage, or the farm loop fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!("sprout-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        rows = config.grid.rows,
        columns = config.grid.columns,
        tick_interval_ms = config.timing.tick_interval_ms,
        batch_delay_ms = config.save.batch_delay_ms,
        data_dir = %config.storage.data_dir.display(),
        "Configuration loaded"
    );

    // 3. Build the crop catalog.
    let catalog = config.catalog()?;
    info!(crops = catalog.len(), "Crop catalog ready");

    // 4. Open the document store.
    let store = FileStore::open(config.storage.data_dir.clone()).await?;
    info!(root = %store.root().display(), "Document store opened");

    // 5. Log in the configured user.
    let identity = Identity::logged_in(UserId::new(config.user.id.clone()));

    // 6. Start the command feeders.
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    spawn_stdin_reader(tx.clone());
    spawn_shutdown_listener(tx);

    // 7. Run the farm loop.
    let context = FarmContext {
        store: Arc::new(store),
        catalog: Arc::new(catalog),
        clock: Arc::new(SystemClock),
        settings: SessionSettings::from_config(&config),
        tick_interval_ms: config.timing.tick_interval_ms,
        max_catch_up_ticks: config.timing.max_catch_up_ticks,
    };
    let summary = runner::run_farm(context, identity, rx).await?;

    // 8. Log the result.
    info!(
        sessions = summary.sessions,
        ticks = summary.ticks,
        harvested = summary.harvested,
        commands_applied = summary.commands_applied,
        commands_rejected = summary.commands_rejected,
        failed_saves = summary.failed_saves,
        "sprout-engine stopped"
    );

    Ok(())
}

/// Load the farm configuration, falling back to defaults when the file is
/// missing. The flag reports whether the file was read.
fn load_config() -> Result<(FarmConfig, bool), ConfigError> {
    let config_path = Path::new("sprout-config.yaml");
    if config_path.exists() {
        return Ok((FarmConfig::from_file(config_path)?, true));
    }
    let mut config = FarmConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok((config, false))
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &FarmConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<FarmCommand>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("stdin closed, waiting for Ctrl-C");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read stdin, command input disabled");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<CommandLine>() {
                Ok(CommandLine(command)) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(input = %line.trim(), error = %e, "Unrecognised command"),
            }
        }
    });
}

fn spawn_shutdown_listener(tx: mpsc::Sender<FarmCommand>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        info!("Ctrl-C received, shutting down");
        let _ = tx.send(FarmCommand::Quit).await;
    });
}
