//! The long-running loops of a chain node.
//!
//! Every node runs four loops:
//!
//! - local event sender: pushes unsent [`LocalEventBacklog`] items out;
//! - event receiver: collects network events into the
//!   [`NetworkEventBacklog`];
//! - local block sender: pushes unsent [`LocalBlockBacklog`] items out;
//! - block ingestion: the [`BlockReceiver`].
//!
//! The authority additionally runs block production. Loops log transient
//! failures and retry after a fixed backoff. They end on cancellation or a
//! fatal ingestion error; the receive loops also end once their transport
//! is closed.

use std::collections::BTreeSet;
use std::sync::Arc;

use dominion_types::{Block, BlockId, Event, EventId, IdentityError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::backlog::{BacklogError, LocalBlockBacklog, LocalEventBacklog, NetworkEventBacklog};
use crate::builder::BlockBuilder;
use crate::cancel::{CancelToken, Canceled};
use crate::config::ChainConfig;
use crate::connector::{Connector, ConnectorError};
use crate::emitter::EventEmitter;
use crate::genesis::genesis_block;
use crate::receiver::{BlockReceiver, IngestError, ReceiverDependencies};
use crate::signature::SignatureVerifier;
use crate::storage::{BlockStorage, EventStorage, StorageError};
use crate::ticker::BlockTicker;
use crate::time::TimeSource;
use crate::validator::{BlockValidator, ChainBlockValidator, EventValidator, SignatureEventValidator};

/// Errors raised by the network loops.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// A wait was interrupted by cancellation.
    #[error("network operation canceled")]
    Canceled,

    /// Block storage failed.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },

    /// A backlog rejected an operation.
    #[error("backlog error: {source}")]
    Backlog {
        /// The underlying backlog error.
        #[from]
        source: BacklogError,
    },

    /// The transport failed.
    #[error("connector error: {source}")]
    Connector {
        /// The underlying transport error.
        #[from]
        source: ConnectorError,
    },

    /// An identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },

    /// Block ingestion failed.
    #[error("ingestion error: {source}")]
    Ingest {
        /// The underlying ingestion error.
        #[from]
        source: IngestError,
    },
}

impl From<Canceled> for NetworkError {
    fn from(_: Canceled) -> Self {
        Self::Canceled
    }
}

impl NetworkError {
    /// Whether the node must halt.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Ingest { source } => source.is_fatal(),
            _ => false,
        }
    }

    const fn is_canceled(&self) -> bool {
        matches!(
            self,
            Self::Canceled
                | Self::Connector {
                    source: ConnectorError::Canceled
                }
        )
    }
}

/// External collaborators of a [`Network`].
#[derive(Debug, Clone)]
pub struct NetworkDependencies {
    /// Transport to the network backlog.
    pub connector: Arc<dyn Connector>,
    /// The accepted chain.
    pub block_storage: Arc<dyn BlockStorage>,
    /// Events confirmed by stored blocks.
    pub event_storage: Arc<dyn EventStorage>,
    /// Wall clock.
    pub time_source: Arc<dyn TimeSource>,
    /// Event signature check.
    pub signature_verifier: Arc<dyn SignatureVerifier>,
}

/// A chain node: backlogs, emitter and the loops that drive them.
#[derive(Debug)]
pub struct Network {
    config: ChainConfig,
    connector: Arc<dyn Connector>,
    block_storage: Arc<dyn BlockStorage>,
    event_storage: Arc<dyn EventStorage>,
    local_events: Arc<LocalEventBacklog>,
    network_events: Arc<NetworkEventBacklog>,
    local_blocks: Arc<LocalBlockBacklog>,
    emitter: Arc<EventEmitter>,
    ticker: BlockTicker,
    receiver: BlockReceiver,
    genesis: Block,
}

impl Network {
    /// Wire a node from its configuration and collaborators.
    pub fn new(config: ChainConfig, deps: NetworkDependencies) -> Self {
        let event_validator: Arc<dyn EventValidator> =
            Arc::new(SignatureEventValidator::new(deps.signature_verifier));
        let block_validator: Arc<dyn BlockValidator> =
            Arc::new(ChainBlockValidator::new(Arc::clone(&event_validator)));

        let local_events = Arc::new(LocalEventBacklog::new(
            Arc::clone(&event_validator),
            Arc::clone(&deps.time_source),
        ));
        let network_events = Arc::new(NetworkEventBacklog::new(event_validator));
        let local_blocks = Arc::new(LocalBlockBacklog::new(Arc::clone(&block_validator)));
        let emitter = Arc::new(EventEmitter::new(config.emitter_capacity));

        let receiver = BlockReceiver::new(ReceiverDependencies {
            connector: Arc::clone(&deps.connector),
            block_storage: Arc::clone(&deps.block_storage),
            event_storage: Arc::clone(&deps.event_storage),
            block_validator,
            local_events: Arc::clone(&local_events),
            network_events: Arc::clone(&network_events),
            local_blocks: Arc::clone(&local_blocks),
            emitter: Arc::clone(&emitter),
        });

        Self {
            ticker: BlockTicker::from_config(&config, deps.time_source),
            config,
            connector: deps.connector,
            block_storage: deps.block_storage,
            event_storage: deps.event_storage,
            local_events,
            network_events,
            local_blocks,
            emitter,
            receiver,
            genesis: genesis_block(),
        }
    }

    /// Replace the genesis block used to seed empty storage.
    #[must_use]
    pub fn with_genesis(mut self, genesis: Block) -> Self {
        self.genesis = genesis;
        self
    }

    /// Seed empty block storage with the genesis block.
    ///
    /// Returns the genesis id when it was stored, `None` when storage was
    /// already populated.
    pub fn initialize(&self) -> Result<Option<BlockId>, NetworkError> {
        if self.block_storage.count() > 0 {
            return Ok(None);
        }
        let id = self.block_storage.add(self.genesis.clone())?;
        info!(block_id = %id, "Block storage initialized with genesis block");
        Ok(Some(id))
    }

    // -----------------------------------------------------------------------
    // Block production
    // -----------------------------------------------------------------------

    /// Wait for the next block slot, then build a block from unconfirmed
    /// network events and stage it in the local block backlog.
    pub async fn produce_block_once(&self, cancel: &CancelToken) -> Result<BlockId, NetworkError> {
        let latest = self.block_storage.latest()?;
        let due = self.ticker.wait_for_next(cancel, latest.timestamp()).await?;

        // Ingestion may have moved the chain on while we slept.
        let parent = self.block_storage.latest()?;
        let timestamp = due.max(parent.timestamp());
        let events = self.pending_events(&parent)?;
        let event_count = events.len();

        let block = BlockBuilder::new(&parent, events).build(timestamp)?;
        let block_id = self.local_blocks.add(block)?;
        info!(
            block_id = %block_id,
            events = event_count,
            timestamp = %timestamp,
            "Block added to local backlog"
        );
        Ok(block_id)
    }

    /// Unconfirmed network events not yet carried by a staged block built on
    /// `parent`, oldest first.
    fn pending_events(&self, parent: &Block) -> Result<Vec<Event>, NetworkError> {
        let parent_id = parent.id()?;
        let in_flight: BTreeSet<EventId> = self
            .local_blocks
            .unconfirmed()
            .values()
            .filter(|block| block.previous_block_id() == parent_id)
            .flat_map(|block| block.events().iter().map(|carried| carried.id))
            .collect();

        let mut events: Vec<(EventId, Event)> = self
            .network_events
            .unconfirmed()
            .into_iter()
            .filter(|(id, _)| !in_flight.contains(id))
            .collect();
        events.sort_by(|(a_id, a), (b_id, b)| a.timestamp.cmp(&b.timestamp).then(a_id.cmp(b_id)));
        Ok(events.into_iter().map(|(_, event)| event).collect())
    }

    /// Produce blocks until cancelled.
    pub async fn run_block_production(&self, cancel: &CancelToken) -> Result<(), NetworkError> {
        info!(interval_ms = self.config.block_interval_ms, "Block production started");
        while !cancel.is_canceled() {
            let rest = match self.produce_block_once(cancel).await {
                Ok(_) => self.config.production_rest(),
                Err(err) if err.is_canceled() => break,
                Err(err) => {
                    warn!(error = %err, "Block production failed");
                    self.config.failure_backoff()
                }
            };
            if cancel.sleep(rest).await.is_err() {
                break;
            }
        }
        info!("Block production stopped");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Push every unsent local event to the network. Returns how many were
    /// sent; failures stay unsent for the next round.
    pub async fn send_unsent_events_once(&self, cancel: &CancelToken) -> usize {
        let mut sent = 0_usize;
        for (event_id, event) in self.local_events.unsent() {
            let outcome = tokio::select! {
                biased;
                () = cancel.canceled() => break,
                outcome = self.connector.send_event_to_backlog(&event) => outcome,
            };
            if let Err(err) = outcome {
                warn!(event_id = %event_id, error = %err, "Failed to send local event");
                continue;
            }
            match self.local_events.mark_as_sent(&event_id) {
                Ok(()) => {
                    sent = sent.saturating_add(1);
                    debug!(event_id = %event_id, "Local event sent");
                }
                Err(err) => warn!(event_id = %event_id, error = %err, "Failed to mark event as sent"),
            }
        }
        sent
    }

    /// Push every unsent local block to the network.
    pub async fn send_unsent_blocks_once(&self, cancel: &CancelToken) -> usize {
        let mut sent = 0_usize;
        for (block_id, block) in self.local_blocks.unsent() {
            let outcome = tokio::select! {
                biased;
                () = cancel.canceled() => break,
                outcome = self.connector.send_block_to_backlog(&block) => outcome,
            };
            if let Err(err) = outcome {
                warn!(block_id = %block_id, error = %err, "Failed to send local block");
                continue;
            }
            match self.local_blocks.mark_as_sent(&block_id) {
                Ok(()) => {
                    sent = sent.saturating_add(1);
                    debug!(block_id = %block_id, "Local block sent");
                }
                Err(err) => warn!(block_id = %block_id, error = %err, "Failed to mark block as sent"),
            }
        }
        sent
    }

    /// Send local events on every poll until cancelled.
    pub async fn run_local_event_sender(&self, cancel: &CancelToken) -> Result<(), NetworkError> {
        while !cancel.is_canceled() {
            self.send_unsent_events_once(cancel).await;
            if cancel.sleep(self.config.poll_interval()).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Send local blocks on every poll until cancelled.
    pub async fn run_local_block_sender(&self, cancel: &CancelToken) -> Result<(), NetworkError> {
        while !cancel.is_canceled() {
            self.send_unsent_blocks_once(cancel).await;
            if cancel.sleep(self.config.poll_interval()).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Take the next network event into the network backlog.
    ///
    /// Returns `None` when the event was already confirmed or already staged.
    pub async fn receive_event_once(
        &self,
        cancel: &CancelToken,
    ) -> Result<Option<EventId>, NetworkError> {
        let event = self.connector.get_backlog_event(cancel).await?;
        let event_id = event.id()?;

        if self.event_storage.exists(&event_id) {
            warn!(event_id = %event_id, "Received event is already confirmed");
            return Ok(None);
        }
        if self.local_events.exists(&event_id) {
            self.local_events.mark_as_received(&event_id)?;
        }
        match self.network_events.add(event) {
            Ok(_) => {
                debug!(event_id = %event_id, "Network event received");
                Ok(Some(event_id))
            }
            Err(BacklogError::AlreadyExists { .. }) => {
                debug!(event_id = %event_id, "Network event already staged");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Receive network events until cancelled.
    pub async fn run_event_receiver(&self, cancel: &CancelToken) -> Result<(), NetworkError> {
        while !cancel.is_canceled() {
            match self.receive_event_once(cancel).await {
                Ok(_) => {}
                Err(err) if err.is_canceled() => break,
                Err(NetworkError::Connector {
                    source: ConnectorError::Closed,
                }) => {
                    info!("Event transport closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to receive network event");
                    if cancel.sleep(self.config.failure_backoff()).await.is_err() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Ingest blocks until cancelled or until the chain diverges.
    ///
    /// The emitter is closed on the way out so the world engine can drain
    /// what was already confirmed and stop.
    pub async fn run_block_ingestion(&self, cancel: &CancelToken) -> Result<(), NetworkError> {
        let outcome = self.receiver.run(cancel, self.config.poll_interval()).await;
        self.emitter.close();
        outcome.map_err(NetworkError::from)
    }

    // -----------------------------------------------------------------------
    // Supervision
    // -----------------------------------------------------------------------

    /// Spawn every loop this node runs into `tasks`.
    pub fn spawn_into<E>(self: &Arc<Self>, tasks: &mut JoinSet<Result<(), E>>, cancel: &CancelToken)
    where
        E: From<NetworkError> + Send + 'static,
    {
        macro_rules! spawn_loop {
            ($method:ident) => {{
                let network = Arc::clone(self);
                let cancel = cancel.clone();
                tasks.spawn(async move { network.$method(&cancel).await.map_err(E::from) });
            }};
        }

        spawn_loop!(run_local_event_sender);
        spawn_loop!(run_event_receiver);
        spawn_loop!(run_local_block_sender);
        spawn_loop!(run_block_ingestion);
        if self.config.authority {
            spawn_loop!(run_block_production);
        }
        info!(authority = self.config.authority, "Network loops started");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Pipeline settings.
    pub const fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Events submitted on this node.
    pub const fn local_event_backlog(&self) -> &Arc<LocalEventBacklog> {
        &self.local_events
    }

    /// Events observed on the network.
    pub const fn network_event_backlog(&self) -> &Arc<NetworkEventBacklog> {
        &self.network_events
    }

    /// Blocks proposed by this node.
    pub const fn local_block_backlog(&self) -> &Arc<LocalBlockBacklog> {
        &self.local_blocks
    }

    /// Hand-off towards the world engine.
    pub const fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// The accepted chain.
    pub const fn block_storage(&self) -> &Arc<dyn BlockStorage> {
        &self.block_storage
    }

    /// Events confirmed by stored blocks.
    pub const fn event_storage(&self) -> &Arc<dyn EventStorage> {
        &self.event_storage
    }
}
