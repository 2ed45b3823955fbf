//! Block and event storage.
//!
//! Storage is append-only: blocks are never removed or rewritten, and the
//! latest block is always the last one appended. The in-memory stores are
//! the reference implementation; a durable backend implements the same
//! traits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dominion_types::{Block, BlockId, EventId, IdentityError};

/// Errors returned by storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store holds no blocks yet.
    #[error("block storage is empty")]
    Empty,

    /// A block with the same identity is already stored.
    #[error("block {id} already stored")]
    AlreadyExists {
        /// Identity of the stored block.
        id: BlockId,
    },

    /// The block's identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },
}

/// Append-only chain of accepted blocks.
pub trait BlockStorage: Send + Sync + std::fmt::Debug {
    /// Number of stored blocks.
    fn count(&self) -> usize;

    /// Append `block` and return its identity.
    fn add(&self, block: Block) -> Result<BlockId, StorageError>;

    /// The most recently appended block.
    fn latest(&self) -> Result<Block, StorageError>;

    /// Whether a block with this identity is stored.
    fn exists(&self, id: &BlockId) -> bool;

    /// The block with this identity, if stored.
    fn get(&self, id: &BlockId) -> Option<Block>;
}

/// Identities of events carried by stored blocks.
pub trait EventStorage: Send + Sync + std::fmt::Debug {
    /// Whether the event was carried by a stored block.
    fn exists(&self, id: &EventId) -> bool;

    /// Record a confirmed event. Returns `false` if it was already recorded.
    fn add(&self, id: EventId) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory block storage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Chain {
    blocks: Vec<Block>,
    index: BTreeMap<BlockId, usize>,
}

/// Block storage held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlockStorage {
    chain: Mutex<Chain>,
}

impl MemoryBlockStorage {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies of every stored block, oldest first.
    pub fn blocks(&self) -> Vec<Block> {
        self.lock().blocks.clone()
    }
}

impl BlockStorage for MemoryBlockStorage {
    fn count(&self) -> usize {
        self.lock().blocks.len()
    }

    fn add(&self, block: Block) -> Result<BlockId, StorageError> {
        let id = block.id()?;
        let mut chain = self.lock();
        if chain.index.contains_key(&id) {
            return Err(StorageError::AlreadyExists { id });
        }
        let position = chain.blocks.len();
        chain.blocks.push(block);
        chain.index.insert(id, position);
        Ok(id)
    }

    fn latest(&self) -> Result<Block, StorageError> {
        self.lock().blocks.last().cloned().ok_or(StorageError::Empty)
    }

    fn exists(&self, id: &BlockId) -> bool {
        self.lock().index.contains_key(id)
    }

    fn get(&self, id: &BlockId) -> Option<Block> {
        let chain = self.lock();
        chain
            .index
            .get(id)
            .and_then(|position| chain.blocks.get(*position))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// In-memory event storage
// ---------------------------------------------------------------------------

/// Event storage held in process memory.
#[derive(Debug, Default)]
pub struct MemoryEventStorage {
    ids: Mutex<BTreeSet<EventId>>,
}

impl MemoryEventStorage {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no event is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStorage for MemoryEventStorage {
    fn exists(&self, id: &EventId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    fn add(&self, id: EventId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }
}
