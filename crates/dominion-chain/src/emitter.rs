//! Hand-off from block ingestion to the world engine.
//!
//! Two bounded queues: one for confirmed events, one for accepted blocks.
//! The ingestion loop pushes, the event pump waits. Waits on either side
//! end with [`EmitterError::Canceled`] when the token fires. Once ingestion
//! stops it closes the emitter; the pump drains what is queued and then
//! sees [`EmitterError::Closed`].

use dominion_types::{Block, Event};

use crate::cancel::CancelToken;
use crate::queue::{Queue, QueueError};

/// Errors raised by the [`EventEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmitterError {
    /// The wait was interrupted by cancellation.
    #[error("emitter wait canceled")]
    Canceled,

    /// The emitter was closed and nothing is left to drain.
    #[error("emitter closed")]
    Closed,
}

impl From<QueueError> for EmitterError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Canceled => Self::Canceled,
            QueueError::Closed => Self::Closed,
        }
    }
}

/// Fan-out point between ingestion and the event pump.
#[derive(Debug)]
pub struct EventEmitter {
    events: Queue<Event>,
    blocks: Queue<Block>,
}

impl EventEmitter {
    /// Emitter whose queues each hold up to `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Queue::bounded(capacity),
            blocks: Queue::bounded(capacity),
        }
    }

    /// Stop accepting announcements on both queues.
    pub fn close(&self) {
        self.events.close();
        self.blocks.close();
    }

    /// Announce a confirmed event, waiting for room.
    pub async fn emit_event(&self, event: Event, cancel: &CancelToken) -> Result<(), EmitterError> {
        Ok(self.events.push(event, cancel).await?)
    }

    /// Announce an accepted block, waiting for room.
    pub async fn emit_block(&self, block: Block, cancel: &CancelToken) -> Result<(), EmitterError> {
        Ok(self.blocks.push(block, cancel).await?)
    }

    /// Next confirmed event.
    pub async fn wait_for_event(&self, cancel: &CancelToken) -> Result<Event, EmitterError> {
        Ok(self.events.pop(cancel).await?)
    }

    /// Next accepted block.
    pub async fn wait_for_block(&self, cancel: &CancelToken) -> Result<Block, EmitterError> {
        Ok(self.blocks.pop(cancel).await?)
    }
}
