//! Replays emitted events and block timestamps into the game.
//!
//! Two loops share one [`Game`] behind a single async mutex:
//!
//! - the event loop applies every confirmed event in emission order;
//! - the clock loop advances the world clock to each accepted block's
//!   timestamp and ages the world by the scaled delta.
//!
//! A confirmed event that fails to apply means this node's world no longer
//! matches the chain, so every [`PumpError`] is fatal. When ingestion stops
//! and closes the emitter, both loops drain what is queued and end.

use std::sync::Arc;

use dominion_chain::{CancelToken, EmitterError, EventEmitter};
use dominion_types::{Block, BlockTimestamp, Event, EventKind};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::game::{EventOutcome, Game, GameError};

/// Errors that stop the pump.
#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    /// A confirmed event could not be applied.
    #[error("failed to apply {kind} event at {timestamp}: {source}")]
    Apply {
        /// Kind of the failing event.
        kind: EventKind,
        /// Timestamp of the failing event.
        timestamp: BlockTimestamp,
        /// The game's reason.
        source: GameError,
    },

    /// The world clock rejected a block timestamp.
    #[error("failed to advance world clock to {timestamp}: {source}")]
    Clock {
        /// The rejected block timestamp.
        timestamp: BlockTimestamp,
        /// The game's reason.
        source: GameError,
    },
}

/// Drives the shared [`Game`] from the [`EventEmitter`].
#[derive(Debug, Clone)]
pub struct EventPump {
    emitter: Arc<EventEmitter>,
    game: Arc<Mutex<Game>>,
}

impl EventPump {
    /// Pump from `emitter` into `game`.
    pub const fn new(emitter: Arc<EventEmitter>, game: Arc<Mutex<Game>>) -> Self {
        Self { emitter, game }
    }

    /// Apply one confirmed event under the game lock.
    pub async fn apply(&self, event: &Event) -> Result<EventOutcome, PumpError> {
        let outcome = self.game.lock().await.apply_event(event).map_err(|source| {
            error!(
                kind = %event.kind(),
                timestamp = %event.timestamp,
                error = %source,
                "Confirmed event failed to apply"
            );
            PumpError::Apply {
                kind: event.kind(),
                timestamp: event.timestamp,
                source,
            }
        })?;
        debug!(kind = %outcome.kind(), "Event applied");
        Ok(outcome)
    }

    /// Advance the world clock to `block`'s timestamp.
    pub async fn advance(&self, block: &Block) -> Result<u64, PumpError> {
        let timestamp = block.timestamp();
        self.game
            .lock()
            .await
            .set_current_timestamp(timestamp)
            .map_err(|source| {
                error!(timestamp = %timestamp, error = %source, "World clock rejected block");
                PumpError::Clock { timestamp, source }
            })
    }

    /// Apply events until cancelled.
    pub async fn run_event_loop(&self, cancel: &CancelToken) -> Result<(), PumpError> {
        loop {
            match self.emitter.wait_for_event(cancel).await {
                Ok(event) => {
                    self.apply(&event).await?;
                }
                Err(EmitterError::Canceled) => break,
                Err(EmitterError::Closed) => {
                    info!("Event queue drained after close");
                    break;
                }
            }
        }
        info!("Event loop stopped");
        Ok(())
    }

    /// Advance the clock on every accepted block until cancelled.
    pub async fn run_clock_loop(&self, cancel: &CancelToken) -> Result<(), PumpError> {
        loop {
            match self.emitter.wait_for_block(cancel).await {
                Ok(block) => {
                    self.advance(&block).await?;
                }
                Err(EmitterError::Canceled) => break,
                Err(EmitterError::Closed) => {
                    info!("Block queue drained after close");
                    break;
                }
            }
        }
        info!("Clock loop stopped");
        Ok(())
    }

    /// Spawn both loops into `tasks`.
    pub fn spawn_into<E>(&self, tasks: &mut JoinSet<Result<(), E>>, cancel: &CancelToken)
    where
        E: From<PumpError> + Send + 'static,
    {
        let pump = self.clone();
        let token = cancel.clone();
        tasks.spawn(async move { pump.run_event_loop(&token).await.map_err(E::from) });

        let pump = self.clone();
        let token = cancel.clone();
        tasks.spawn(async move { pump.run_clock_loop(&token).await.map_err(E::from) });
    }

    /// The shared game.
    pub const fn game(&self) -> &Arc<Mutex<Game>> {
        &self.game
    }
}
