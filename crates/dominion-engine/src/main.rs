//! Node binary for the Dominion simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `DOMINION_CONFIG` or `dominion-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the node: storage, connector, chain loops, game and pump
//! 4. Seed genesis and start every loop
//! 5. Supervise until Ctrl-C or the first fatal error
//!
//! The process exits non-zero when any task fails, since a node whose
//! world diverged from the chain must not keep serving it.

mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use dominion_chain::CancelToken;
use dominion_core::{LogFormat, LoggingConfig, Node, NodeConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the configuration file.
const ENV_CONFIG_PATH: &str = "DOMINION_CONFIG";

/// Configuration file used when `DOMINION_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "dominion-config.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let (config, source) = match load_config() {
        Ok(loaded) => loaded,
        Err(err) => {
            init_logging(&LoggingConfig::default());
            error!(error = %err, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    info!("dominion-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        authority = config.chain.authority,
        block_interval_ms = config.chain.block_interval_ms,
        time_compression = config.world.time_compression,
        "Node configuration"
    );

    match run(config).await {
        Ok(()) => {
            info!("dominion-engine stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "dominion-engine halted");
            ExitCode::FAILURE
        }
    }
}

/// Start the node and block until it stops.
async fn run(config: NodeConfig) -> Result<(), EngineError> {
    let node = Node::build(config)?;
    let cancel = CancelToken::new();
    let tasks = node.start(&cancel)?;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(err) => warn!(error = %err, "Failed to listen for Ctrl-C"),
            },
            () = shutdown.canceled() => {}
        }
    });

    Node::supervise(tasks, &cancel).await?;
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_env| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Read the configuration file, falling back to defaults when it is absent.
///
/// Environment overrides apply in both cases. Returns the path actually
/// read, if any.
fn load_config() -> Result<(NodeConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os(ENV_CONFIG_PATH)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = NodeConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }
    let mut config = NodeConfig::default();
    config.apply_env_overrides()?;
    Ok((config, None))
}
