//! Blocks: ordered batches of confirmed events linked by hash.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::ids::{BlockId, Checksum, EventId};
use crate::timestamp::BlockTimestamp;

/// An event as carried inside a block, paired with its precomputed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockEvent {
    /// Identity of `event`.
    pub id: EventId,
    /// The event itself.
    pub event: Event,
}

/// The hashed part of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockBody {
    /// Identity of the parent block. All zero for genesis.
    pub previous_block_id: BlockId,
    /// Production time of the block.
    pub timestamp: BlockTimestamp,
    /// Events in application order.
    pub events: Vec<BlockEvent>,
}

/// A block of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Linked, timestamped event batch.
    pub body: BlockBody,
    /// Digest of `body`.
    pub checksum: Checksum,
}

impl Block {
    /// Production time of the block.
    pub const fn timestamp(&self) -> BlockTimestamp {
        self.body.timestamp
    }

    /// Identity of the parent block.
    pub const fn previous_block_id(&self) -> BlockId {
        self.body.previous_block_id
    }

    /// Events carried by the block, in order.
    pub fn events(&self) -> &[BlockEvent] {
        &self.body.events
    }
}
