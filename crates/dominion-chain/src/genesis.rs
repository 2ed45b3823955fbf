//! The fixed first block of every chain.

use dominion_types::{Block, BlockBody, BlockId, BlockTimestamp, Checksum};

/// Timestamp of the genesis block, unix millis.
pub const GENESIS_TIMESTAMP_MILLIS: u64 = 1_616_087_057_000;

/// The genesis block: zero parent, zero checksum, no events.
///
/// Its checksum is a fixed constant rather than a digest of its body, so
/// it is stored as-is and never validated.
pub fn genesis_block() -> Block {
    Block {
        body: BlockBody {
            previous_block_id: BlockId::ZERO,
            timestamp: BlockTimestamp::from_unix_millis(GENESIS_TIMESTAMP_MILLIS),
            events: Vec::new(),
        },
        checksum: Checksum::ZERO,
    }
}
