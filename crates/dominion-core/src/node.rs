//! Node assembly and task supervision.
//!
//! A [`Node`] owns one chain [`Network`], one shared [`Game`] and the
//! [`EventPump`] between them. [`Node::start`] seeds block storage with
//! genesis and spawns every loop into a single [`JoinSet`];
//! [`Node::supervise`] waits on that set, cancels the rest on the first
//! failure and reports it.

use std::sync::Arc;

use dominion_chain::{
    AcceptAllSignatures, CancelToken, LocalConnector, MemoryBlockStorage, MemoryEventStorage,
    Network, NetworkDependencies, NetworkError, SignatureVerifier, SystemTimeSource,
};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::api::GameApi;
use crate::config::{ConfigError, NodeConfig};
use crate::game::{Game, GameError};
use crate::pump::{EventPump, PumpError};

/// Errors that stop a node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The configuration was rejected.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The game could not be created.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: GameError,
    },

    /// A chain loop failed.
    #[error("network error: {source}")]
    Network {
        /// The underlying network error.
        #[from]
        source: NetworkError,
    },

    /// The event pump failed.
    #[error("event pump error: {source}")]
    Pump {
        /// The underlying pump error.
        #[from]
        source: PumpError,
    },

    /// A task panicked or was aborted.
    #[error("task failed: {reason}")]
    Task {
        /// What the runtime reported.
        reason: String,
    },
}

impl NodeError {
    /// Whether the error means local state can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Network { source } => source.is_fatal(),
            Self::Config { .. } | Self::Game { .. } | Self::Pump { .. } | Self::Task { .. } => {
                true
            }
        }
    }
}

/// A running Dominion node.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    network: Arc<Network>,
    game: Arc<Mutex<Game>>,
    pump: EventPump,
    api: GameApi,
}

impl Node {
    /// Build a node with in-memory storage, the in-process connector and
    /// the system clock.
    pub fn build(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let verifier: Arc<dyn SignatureVerifier> = Arc::new(AcceptAllSignatures);
        let deps = NetworkDependencies {
            connector: Arc::new(LocalConnector::from_config(&config.chain)),
            block_storage: Arc::new(MemoryBlockStorage::new()),
            event_storage: Arc::new(MemoryEventStorage::new()),
            time_source: Arc::new(SystemTimeSource),
            signature_verifier: verifier,
        };
        Self::with_dependencies(config, deps)
    }

    /// Build a node around caller-supplied collaborators.
    pub fn with_dependencies(
        config: NodeConfig,
        deps: NetworkDependencies,
    ) -> Result<Self, NodeError> {
        let game = Game::new(&config.world, Arc::clone(&deps.signature_verifier))?;
        let game = Arc::new(Mutex::new(game));
        let network = Arc::new(Network::new(config.chain.clone(), deps));
        let pump = EventPump::new(Arc::clone(network.emitter()), Arc::clone(&game));
        let api = GameApi::new(Arc::clone(&game), Arc::clone(network.local_event_backlog()));
        Ok(Self {
            config,
            network,
            game,
            pump,
            api,
        })
    }

    /// Seed storage with genesis and spawn every loop.
    pub fn start(&self, cancel: &CancelToken) -> Result<JoinSet<Result<(), NodeError>>, NodeError> {
        self.network.initialize()?;
        let mut tasks = JoinSet::new();
        self.network.spawn_into(&mut tasks, cancel);
        self.pump.spawn_into(&mut tasks, cancel);
        info!(
            authority = self.config.chain.authority,
            tasks = tasks.len(),
            "Node started"
        );
        Ok(tasks)
    }

    /// Wait for every task. The first failure cancels the others and is
    /// returned once they have all stopped.
    pub async fn supervise(
        mut tasks: JoinSet<Result<(), NodeError>>,
        cancel: &CancelToken,
    ) -> Result<(), NodeError> {
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|err| NodeError::Task {
                    reason: err.to_string(),
                })
                .and_then(|outcome| outcome);
            let Err(err) = result else {
                continue;
            };
            if first_error.is_some() {
                warn!(error = %err, "Additional task failure during shutdown");
                continue;
            }
            if err.is_fatal() {
                error!(error = %err, "Fatal node error, shutting down");
            } else {
                warn!(error = %err, "Node task failed, shutting down");
            }
            cancel.cancel();
            first_error = Some(err);
        }
        info!("All node tasks stopped");
        first_error.map_or(Ok(()), Err)
    }

    /// Node configuration.
    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The chain pipeline.
    pub const fn network(&self) -> &Arc<Network> {
        &self.network
    }

    /// The shared game.
    pub const fn game(&self) -> &Arc<Mutex<Game>> {
        &self.game
    }

    /// Query and submission facade.
    pub const fn api(&self) -> &GameApi {
        &self.api
    }
}
