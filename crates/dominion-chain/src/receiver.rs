//! Block ingestion.
//!
//! The [`BlockReceiver`] pulls candidate blocks from the [`Connector`] and
//! applies each accepted block exactly once:
//!
//! 1. Blocks already in storage are dropped as re-deliveries.
//! 2. The candidate is validated against the latest stored block; blocks
//!    carrying an event that an earlier block already confirmed are
//!    rejected as replays.
//! 3. The block is announced to the [`EventEmitter`].
//! 4. Every carried event, in block order, is marked confirmed in both
//!    event backlogs, recorded in event storage and emitted.
//! 5. The block is appended to storage and confirmed in the local block
//!    backlog.
//!
//! Once step 4 has started the world engine may already be replaying the
//! block, so any later failure means local state no longer matches the
//! chain. Those failures surface as [`IngestError::Diverged`].

use std::sync::Arc;
use std::time::Duration;

use dominion_types::{Block, BlockId, BlockEvent, IdentityError};
use tracing::{debug, error, info, warn};

use crate::backlog::{LocalBlockBacklog, LocalEventBacklog, NetworkEventBacklog};
use crate::cancel::CancelToken;
use crate::connector::{Connector, ConnectorError};
use crate::emitter::{EmitterError, EventEmitter};
use crate::storage::{BlockStorage, EventStorage, StorageError};
use crate::validator::{BlockValidator, ValidationError};

/// Errors raised while ingesting a block.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The wait for the next block was cancelled.
    #[error("ingestion canceled")]
    Canceled,

    /// The transport failed.
    #[error("connector error: {source}")]
    Connector {
        /// The underlying transport error.
        #[from]
        source: ConnectorError,
    },

    /// Storage could not serve the latest block.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },

    /// The candidate's identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },

    /// The block could not be announced.
    #[error("emitter error: {source}")]
    Emitter {
        /// The underlying emitter error.
        #[from]
        source: EmitterError,
    },

    /// Local state no longer matches the chain.
    #[error("chain diverged at block {block_id}: {reason}")]
    Diverged {
        /// The block being applied.
        block_id: BlockId,
        /// What failed.
        reason: String,
    },
}

impl IngestError {
    /// Whether the node must halt.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// Whether the error only reflects cancellation.
    pub const fn is_canceled(&self) -> bool {
        matches!(
            self,
            Self::Canceled
                | Self::Connector {
                    source: ConnectorError::Canceled
                }
                | Self::Emitter {
                    source: EmitterError::Canceled
                }
        )
    }
}

/// What happened to a candidate block.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The block was already stored.
    Duplicate(BlockId),
    /// The block failed validation and was dropped.
    Rejected {
        /// Identity of the rejected block.
        block_id: BlockId,
        /// Why it was rejected.
        reason: ValidationError,
    },
    /// The block was applied and stored.
    Stored(BlockId),
}

/// Everything the receiver reads from and writes to.
#[derive(Debug, Clone)]
pub struct ReceiverDependencies {
    /// Source of candidate blocks.
    pub connector: Arc<dyn Connector>,
    /// The accepted chain.
    pub block_storage: Arc<dyn BlockStorage>,
    /// Events confirmed by stored blocks.
    pub event_storage: Arc<dyn EventStorage>,
    /// Acceptance rules for candidates.
    pub block_validator: Arc<dyn BlockValidator>,
    /// Locally submitted events.
    pub local_events: Arc<LocalEventBacklog>,
    /// Events observed on the network.
    pub network_events: Arc<NetworkEventBacklog>,
    /// Locally proposed blocks.
    pub local_blocks: Arc<LocalBlockBacklog>,
    /// Hand-off towards the world engine.
    pub emitter: Arc<EventEmitter>,
}

/// Validates and applies blocks coming from the network.
#[derive(Debug)]
pub struct BlockReceiver {
    deps: ReceiverDependencies,
}

impl BlockReceiver {
    /// Receiver wired to `deps`.
    pub const fn new(deps: ReceiverDependencies) -> Self {
        Self { deps }
    }

    /// Apply one candidate block.
    pub async fn ingest(
        &self,
        block: Block,
        cancel: &CancelToken,
    ) -> Result<IngestOutcome, IngestError> {
        let block_id = block.id()?;
        if self.deps.block_storage.exists(&block_id) {
            return Ok(IngestOutcome::Duplicate(block_id));
        }

        let latest = self.deps.block_storage.latest()?;
        if let Err(reason) = self.check(&latest, &block) {
            return Ok(IngestOutcome::Rejected { block_id, reason });
        }

        self.deps.emitter.emit_block(block.clone(), cancel).await?;

        for carried in block.events() {
            self.confirm_event(block_id, carried, cancel).await?;
        }

        self.deps
            .block_storage
            .add(block)
            .map_err(|err| IngestError::Diverged {
                block_id,
                reason: format!("applied block could not be stored: {err}"),
            })?;

        if self.deps.local_blocks.exists(&block_id) {
            self.deps
                .local_blocks
                .mark_as_confirmed(&block_id)
                .unwrap_or_else(|err| {
                    warn!(block_id = %block_id, error = %err, "Failed to confirm local block");
                });
        }

        Ok(IngestOutcome::Stored(block_id))
    }

    fn check(&self, latest: &Block, candidate: &Block) -> Result<(), ValidationError> {
        self.deps.block_validator.validate(latest, candidate)?;
        match candidate
            .events()
            .iter()
            .find(|carried| self.deps.event_storage.exists(&carried.id))
        {
            Some(replayed) => Err(ValidationError::EventAlreadyConfirmed(replayed.id)),
            None => Ok(()),
        }
    }

    async fn confirm_event(
        &self,
        block_id: BlockId,
        carried: &BlockEvent,
        cancel: &CancelToken,
    ) -> Result<(), IngestError> {
        let id = carried.id;
        let diverged = |what: String| IngestError::Diverged {
            block_id,
            reason: format!("event {id} {what}"),
        };
        if self.deps.local_events.exists(&id) {
            self.deps
                .local_events
                .mark_as_confirmed(&id)
                .map_err(|err| diverged(format!("not confirmed locally: {err}")))?;
        }
        if self.deps.network_events.exists(&id) {
            self.deps
                .network_events
                .mark_as_confirmed(&id)
                .map_err(|err| diverged(format!("not confirmed on the network: {err}")))?;
        }
        self.deps.event_storage.add(id);
        self.deps
            .emitter
            .emit_event(carried.event.clone(), cancel)
            .await
            .map_err(|err| match err {
                EmitterError::Canceled => IngestError::Canceled,
                EmitterError::Closed => diverged("not emitted".to_owned()),
            })?;
        debug!(event_id = %id, kind = %carried.event.kind(), "Event confirmed");
        Ok(())
    }

    /// Wait for the next candidate block and ingest it.
    pub async fn receive_once(&self, cancel: &CancelToken) -> Result<IngestOutcome, IngestError> {
        let block = self.deps.connector.get_backlog_block(cancel).await?;
        self.ingest(block, cancel).await
    }

    /// Ingest blocks until cancelled or until the chain diverges.
    pub async fn run(&self, cancel: &CancelToken, poll: Duration) -> Result<(), IngestError> {
        info!("Block ingestion started");
        while !cancel.is_canceled() {
            match self.receive_once(cancel).await {
                Ok(IngestOutcome::Stored(block_id)) => {
                    info!(block_id = %block_id, "Block stored");
                }
                Ok(IngestOutcome::Duplicate(block_id)) => {
                    warn!(block_id = %block_id, "Block already stored, dropped");
                }
                Ok(IngestOutcome::Rejected { block_id, reason }) => {
                    warn!(block_id = %block_id, reason = %reason, "Block rejected");
                }
                Err(err) if err.is_fatal() => {
                    error!(error = %err, "Inconsistency detected, halting ingestion");
                    return Err(err);
                }
                Err(err) if err.is_canceled() => break,
                Err(IngestError::Connector {
                    source: ConnectorError::Closed,
                }) => {
                    info!("Block transport closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Block ingestion failed");
                }
            }
            if cancel.sleep(poll).await.is_err() {
                break;
            }
        }
        info!("Block ingestion stopped");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{BlockTimestamp, CreatePlanet, Event};

    use super::*;
    use crate::builder::BlockBuilder;
    use crate::connector::LocalConnector;
    use crate::genesis::genesis_block;
    use crate::signature::AcceptAllSignatures;
    use crate::storage::{MemoryBlockStorage, MemoryEventStorage};
    use crate::time::ManualTimeSource;
    use crate::validator::{ChainBlockValidator, SignatureEventValidator};

    const NOW: u64 = 1_700_000_000_000;

    struct Fixture {
        receiver: BlockReceiver,
        deps: ReceiverDependencies,
    }

    fn fixture() -> Fixture {
        let events = Arc::new(SignatureEventValidator::new(Arc::new(AcceptAllSignatures)));
        let blocks = Arc::new(ChainBlockValidator::new(events.clone()));
        let time = Arc::new(ManualTimeSource::new(BlockTimestamp::from_unix_millis(NOW)));
        let block_storage = Arc::new(MemoryBlockStorage::new());
        block_storage.add(genesis_block()).unwrap();
        let deps = ReceiverDependencies {
            connector: Arc::new(LocalConnector::default()),
            block_storage,
            event_storage: Arc::new(MemoryEventStorage::new()),
            block_validator: blocks.clone(),
            local_events: Arc::new(LocalEventBacklog::new(events.clone(), time)),
            network_events: Arc::new(NetworkEventBacklog::new(events)),
            local_blocks: Arc::new(LocalBlockBacklog::new(blocks)),
            emitter: Arc::new(EventEmitter::new(16)),
        };
        Fixture {
            receiver: BlockReceiver::new(deps.clone()),
            deps,
        }
    }

    fn block_on_latest(deps: &ReceiverDependencies, events: Vec<Event>, at: u64) -> Block {
        let latest = deps.block_storage.latest().unwrap();
        BlockBuilder::new(&latest, events)
            .build(BlockTimestamp::from_unix_millis(at))
            .unwrap()
    }

    #[tokio::test]
    async fn stores_block_and_confirms_everything() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let local_id = deps.local_events.add(CreatePlanet {}).unwrap();
        let local_event = deps.local_events.all().remove(&local_id).unwrap();
        deps.network_events.add(local_event.clone()).unwrap();

        let block = block_on_latest(&deps, vec![local_event.clone()], NOW);
        let block_id = deps.local_blocks.add(block.clone()).unwrap();

        let outcome = receiver.ingest(block.clone(), &cancel).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Stored(id) if id == block_id));

        assert!(deps.local_events.status(&local_id).unwrap().confirmed);
        assert!(deps.network_events.unconfirmed().is_empty());
        assert!(deps.local_blocks.unconfirmed().is_empty());
        assert!(deps.event_storage.exists(&local_id));
        assert_eq!(deps.block_storage.latest().unwrap(), block);

        assert_eq!(deps.emitter.wait_for_block(&cancel).await.unwrap(), block);
        assert_eq!(
            deps.emitter.wait_for_event(&cancel).await.unwrap(),
            local_event
        );
    }

    #[tokio::test]
    async fn network_only_event_is_confirmed() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(NOW));
        let id = deps.network_events.add(event.clone()).unwrap();

        let block = block_on_latest(&deps, vec![event], NOW);
        assert!(matches!(
            receiver.ingest(block, &cancel).await.unwrap(),
            IngestOutcome::Stored(_)
        ));
        assert!(deps.network_events.unconfirmed().is_empty());
        assert!(!deps.local_events.exists(&id));
        assert!(deps.event_storage.exists(&id));
    }

    #[tokio::test]
    async fn closed_emitter_mid_block_is_divergence() {
        let Fixture { deps, .. } = fixture();
        let emitter = Arc::new(EventEmitter::new(1));
        let receiver = BlockReceiver::new(ReceiverDependencies {
            emitter: emitter.clone(),
            ..deps.clone()
        });
        let cancel = CancelToken::new();
        let stuck = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(NOW - 1));
        emitter.emit_event(stuck, &cancel).await.unwrap();

        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(NOW));
        let block = block_on_latest(&deps, vec![event], NOW);
        let closing = async {
            tokio::task::yield_now().await;
            emitter.close();
        };
        let (outcome, ()) = tokio::join!(receiver.ingest(block, &cancel), closing);

        let err = outcome.unwrap_err();
        assert!(matches!(err, IngestError::Diverged { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn redelivery_is_a_duplicate() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let block = block_on_latest(&deps, Vec::new(), NOW);
        receiver.ingest(block.clone(), &cancel).await.unwrap();
        assert!(matches!(
            receiver.ingest(block, &cancel).await.unwrap(),
            IngestOutcome::Duplicate(_)
        ));
        assert_eq!(deps.block_storage.count(), 2);
    }

    #[tokio::test]
    async fn stale_parent_is_rejected() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let first = block_on_latest(&deps, Vec::new(), NOW);
        let competitor = block_on_latest(&deps, Vec::new(), NOW + 1);
        receiver.ingest(first, &cancel).await.unwrap();

        let outcome = receiver.ingest(competitor, &cancel).await.unwrap();
        assert!(matches!(
            outcome,
            IngestOutcome::Rejected {
                reason: ValidationError::BrokenLink { .. },
                ..
            }
        ));
        assert_eq!(deps.block_storage.count(), 2);
    }

    #[tokio::test]
    async fn replayed_event_is_rejected() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(NOW));
        let first = block_on_latest(&deps, vec![event.clone()], NOW);
        receiver.ingest(first, &cancel).await.unwrap();

        let replay = block_on_latest(&deps, vec![event], NOW + 10);
        assert!(matches!(
            receiver.ingest(replay, &cancel).await.unwrap(),
            IngestOutcome::Rejected {
                reason: ValidationError::EventAlreadyConfirmed(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_storage_is_transient() {
        let Fixture { deps, .. } = fixture();
        let empty = Arc::new(MemoryBlockStorage::new());
        let receiver_on_empty = BlockReceiver::new(ReceiverDependencies {
            block_storage: empty,
            ..deps.clone()
        });
        let block = block_on_latest(&deps, Vec::new(), NOW);
        let err = receiver_on_empty
            .ingest(block, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Storage {
                source: StorageError::Empty
            }
        ));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn receive_once_reads_from_connector() {
        let Fixture { receiver, deps } = fixture();
        let cancel = CancelToken::new();
        let block = block_on_latest(&deps, Vec::new(), NOW);
        deps.connector.send_block_to_backlog(&block).await.unwrap();
        assert!(matches!(
            receiver.receive_once(&cancel).await.unwrap(),
            IngestOutcome::Stored(_)
        ));
    }

    #[tokio::test]
    async fn run_ends_when_transport_closes() {
        let connector = Arc::new(LocalConnector::default());
        let Fixture { deps, .. } = fixture();
        let receiver = BlockReceiver::new(ReceiverDependencies {
            connector: connector.clone(),
            ..deps
        });
        connector.close();
        receiver
            .run(&CancelToken::new(), Duration::from_millis(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let Fixture { receiver, .. } = fixture();
        let cancel = CancelToken::new();
        cancel.cancel();
        receiver
            .run(&cancel, Duration::from_millis(10))
            .await
            .unwrap();
    }
}
