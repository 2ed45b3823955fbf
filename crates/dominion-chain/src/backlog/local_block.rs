use std::collections::BTreeMap;
use std::sync::Arc;

use dominion_types::{Block, BlockId};

use super::{BacklogError, BacklogTable, Flag};
use crate::validator::BlockValidator;

/// Blocks proposed by this node.
///
/// A block is `sent` once pushed to the network and `confirmed` once the
/// ingestion loop has stored it.
#[derive(Debug)]
pub struct LocalBlockBacklog {
    table: BacklogTable<BlockId, Block>,
    validator: Arc<dyn BlockValidator>,
}

impl LocalBlockBacklog {
    /// Empty backlog checking block structure with `validator`.
    pub fn new(validator: Arc<dyn BlockValidator>) -> Self {
        Self {
            table: BacklogTable::default(),
            validator,
        }
    }

    /// Check the block's structure and stage it.
    pub fn add(&self, block: Block) -> Result<BlockId, BacklogError> {
        self.validator.validate_structure(&block)?;
        self.table.insert_with(block, |block| Ok(block.id()?))
    }

    /// Whether the block is staged.
    pub fn exists(&self, id: &BlockId) -> bool {
        self.table.exists(id)
    }

    /// Flag the block as pushed to the network.
    pub fn mark_as_sent(&self, id: &BlockId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Sent)
    }

    /// Flag the block as stored by ingestion.
    pub fn mark_as_confirmed(&self, id: &BlockId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Confirmed)
    }

    /// Copies of blocks not yet sent.
    pub fn unsent(&self) -> BTreeMap<BlockId, Block> {
        self.table.without(Flag::Sent)
    }

    /// Copies of blocks not yet confirmed.
    pub fn unconfirmed(&self) -> BTreeMap<BlockId, Block> {
        self.table.without(Flag::Confirmed)
    }

    /// Copies of every staged block.
    pub fn all(&self) -> BTreeMap<BlockId, Block> {
        self.table.all()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{BlockTimestamp, Checksum};

    use super::*;
    use crate::builder::BlockBuilder;
    use crate::genesis::genesis_block;
    use crate::signature::AcceptAllSignatures;
    use crate::validator::{ChainBlockValidator, SignatureEventValidator, ValidationError};

    fn backlog() -> LocalBlockBacklog {
        let events = Arc::new(SignatureEventValidator::new(Arc::new(AcceptAllSignatures)));
        LocalBlockBacklog::new(Arc::new(ChainBlockValidator::new(events)))
    }

    fn block() -> Block {
        BlockBuilder::new(&genesis_block(), Vec::new())
            .build(BlockTimestamp::from_unix_millis(1_700_000_000_000))
            .unwrap()
    }

    #[test]
    fn add_send_confirm() {
        let backlog = backlog();
        let id = backlog.add(block()).unwrap();
        assert!(backlog.exists(&id));
        assert!(matches!(
            backlog.add(block()),
            Err(BacklogError::AlreadyExists { .. })
        ));

        backlog.mark_as_sent(&id).unwrap();
        assert!(backlog.unsent().is_empty());
        assert!(backlog.unconfirmed().contains_key(&id));
        backlog.mark_as_confirmed(&id).unwrap();
        assert!(backlog.unconfirmed().is_empty());
        assert_eq!(backlog.all().len(), 1);
    }

    #[test]
    fn malformed_block_rejected() {
        let mut bad = block();
        bad.checksum = Checksum::ZERO;
        assert!(matches!(
            backlog().add(bad),
            Err(BacklogError::Validation {
                source: ValidationError::ChecksumMismatch { .. }
            })
        ));
    }

    #[test]
    fn marking_unknown_block_fails() {
        let backlog = backlog();
        assert!(matches!(
            backlog.mark_as_sent(&BlockId::ZERO),
            Err(BacklogError::NotFound { .. })
        ));
        assert!(matches!(
            backlog.mark_as_confirmed(&BlockId::ZERO),
            Err(BacklogError::NotFound { .. })
        ));
    }
}
