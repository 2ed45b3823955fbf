//! Deterministic block assembly.

use dominion_types::{Block, BlockBody, BlockEvent, BlockTimestamp, Event, IdentityError};

/// Assembles the successor of a block from a batch of events.
///
/// The output is a pure function of `(previous, events, timestamp)`:
/// building twice from the same inputs yields identical blocks.
#[derive(Debug)]
pub struct BlockBuilder<'a> {
    previous: &'a Block,
    events: Vec<Event>,
}

impl<'a> BlockBuilder<'a> {
    /// Builder for a block extending `previous` and carrying `events` in order.
    pub const fn new(previous: &'a Block, events: Vec<Event>) -> Self {
        Self { previous, events }
    }

    /// Build the block stamped with `timestamp`.
    pub fn build(&self, timestamp: BlockTimestamp) -> Result<Block, IdentityError> {
        let previous_block_id = self.previous.id()?;
        let events = self
            .events
            .iter()
            .map(|event| {
                Ok(BlockEvent {
                    id: event.id()?,
                    event: event.clone(),
                })
            })
            .collect::<Result<Vec<_>, IdentityError>>()?;

        let body = BlockBody {
            previous_block_id,
            timestamp,
            events,
        };
        let checksum = body.checksum()?;
        Ok(Block { body, checksum })
    }
}
