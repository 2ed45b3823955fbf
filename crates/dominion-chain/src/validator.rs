//! Acceptance rules for events and blocks.
//!
//! Validators are traits so a node can tighten the rules without touching
//! the pipeline. The provided implementations check what a single-authority
//! chain can check locally:
//!
//! - events: the configured [`SignatureVerifier`] accepts the signature;
//! - block structure: the checksum covers the body, every carried event id
//!   matches its event, no event appears twice, every event is valid;
//! - block linkage: the parent is the latest stored block and time does
//!   not run backwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use dominion_types::{Block, BlockId, BlockTimestamp, Checksum, Event, EventId, IdentityError};

use crate::signature::{SignatureError, SignatureVerifier};

/// Why an event or block was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The event signature was rejected.
    #[error("invalid signature: {source}")]
    Signature {
        /// The verifier's reason.
        #[from]
        source: SignatureError,
    },

    /// The stored checksum does not match the body.
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        /// Checksum carried by the block.
        stored: Checksum,
        /// Checksum of the body as received.
        computed: Checksum,
    },

    /// A carried event id does not match its event.
    #[error("event {index} carries id {stored}, computed {computed}")]
    EventIdMismatch {
        /// Position in the block.
        index: usize,
        /// Id carried by the block.
        stored: EventId,
        /// Id of the event as received.
        computed: EventId,
    },

    /// The same event appears twice in one block.
    #[error("event {0} appears more than once")]
    DuplicateEvent(EventId),

    /// The event was already confirmed by an earlier block.
    #[error("event {0} is already confirmed")]
    EventAlreadyConfirmed(EventId),

    /// The block does not extend the latest stored block.
    #[error("block extends {found}, expected {expected}")]
    BrokenLink {
        /// Identity of the latest stored block.
        expected: BlockId,
        /// Parent named by the candidate.
        found: BlockId,
    },

    /// The block is older than its parent.
    #[error("block timestamp {candidate} precedes parent timestamp {previous}")]
    TimestampRegression {
        /// Parent timestamp.
        previous: BlockTimestamp,
        /// Candidate timestamp.
        candidate: BlockTimestamp,
    },

    /// An identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },
}

/// Acceptance rules for a single event.
pub trait EventValidator: Send + Sync + std::fmt::Debug {
    /// Accept or reject `event`.
    fn validate(&self, event: &Event) -> Result<(), ValidationError>;
}

/// Acceptance rules for blocks.
pub trait BlockValidator: Send + Sync + std::fmt::Debug {
    /// Checks that need only the block itself.
    fn validate_structure(&self, block: &Block) -> Result<(), ValidationError>;

    /// Full check of `candidate` as the successor of `previous`.
    fn validate(&self, previous: &Block, candidate: &Block) -> Result<(), ValidationError>;
}

/// Event validator backed by a [`SignatureVerifier`].
#[derive(Debug, Clone)]
pub struct SignatureEventValidator {
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignatureEventValidator {
    /// Validate events with `verifier`.
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }
}

impl EventValidator for SignatureEventValidator {
    fn validate(&self, event: &Event) -> Result<(), ValidationError> {
        self.verifier.verify(&event.signature, &event.body)?;
        Ok(())
    }
}

/// Default block validator.
#[derive(Debug, Clone)]
pub struct ChainBlockValidator {
    events: Arc<dyn EventValidator>,
}

impl ChainBlockValidator {
    /// Validate carried events with `events`.
    pub fn new(events: Arc<dyn EventValidator>) -> Self {
        Self { events }
    }
}

impl BlockValidator for ChainBlockValidator {
    fn validate_structure(&self, block: &Block) -> Result<(), ValidationError> {
        let computed = block.body.checksum()?;
        if computed != block.checksum {
            return Err(ValidationError::ChecksumMismatch {
                stored: block.checksum,
                computed,
            });
        }

        let mut seen = BTreeSet::new();
        for (index, carried) in block.events().iter().enumerate() {
            let computed = carried.event.id()?;
            if computed != carried.id {
                return Err(ValidationError::EventIdMismatch {
                    index,
                    stored: carried.id,
                    computed,
                });
            }
            if !seen.insert(computed) {
                return Err(ValidationError::DuplicateEvent(computed));
            }
            self.events.validate(&carried.event)?;
        }
        Ok(())
    }

    fn validate(&self, previous: &Block, candidate: &Block) -> Result<(), ValidationError> {
        let expected = previous.id()?;
        if candidate.previous_block_id() != expected {
            return Err(ValidationError::BrokenLink {
                expected,
                found: candidate.previous_block_id(),
            });
        }
        if candidate.timestamp() < previous.timestamp() {
            return Err(ValidationError::TimestampRegression {
                previous: previous.timestamp(),
                candidate: candidate.timestamp(),
            });
        }
        self.validate_structure(candidate)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{CreatePlanet, CreatePlayer, EventBody, Signature};

    use super::*;
    use crate::builder::BlockBuilder;
    use crate::genesis::genesis_block;
    use crate::signature::AcceptAllSignatures;

    #[derive(Debug)]
    struct RejectUnsigned;

    impl SignatureVerifier for RejectUnsigned {
        fn verify(&self, signature: &Signature, _body: &EventBody) -> Result<(), SignatureError> {
            if signature.is_empty() {
                Err(SignatureError::Rejected)
            } else {
                Ok(())
            }
        }
    }

    fn validator() -> ChainBlockValidator {
        ChainBlockValidator::new(Arc::new(SignatureEventValidator::new(Arc::new(
            AcceptAllSignatures,
        ))))
    }

    fn event(at: u64) -> Event {
        Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(at))
    }

    fn block_after(previous: &Block, events: Vec<Event>, at: u64) -> Block {
        BlockBuilder::new(previous, events)
            .build(BlockTimestamp::from_unix_millis(at))
            .unwrap()
    }

    #[test]
    fn accepts_built_successor() {
        let genesis = genesis_block();
        let block = block_after(&genesis, vec![event(1), event(2)], genesis.timestamp().unix_millis() + 10);
        validator().validate(&genesis, &block).unwrap();
    }

    #[test]
    fn rejects_broken_link() {
        let genesis = genesis_block();
        let first = block_after(&genesis, vec![], 1_700_000_000_000);
        let second = block_after(&first, vec![], 1_700_000_010_000);
        assert!(matches!(
            validator().validate(&genesis, &second),
            Err(ValidationError::BrokenLink { .. })
        ));
    }

    #[test]
    fn rejects_time_running_backwards() {
        let genesis = genesis_block();
        let block = block_after(&genesis, vec![], genesis.timestamp().unix_millis() - 1);
        assert!(matches!(
            validator().validate(&genesis, &block),
            Err(ValidationError::TimestampRegression { .. })
        ));
    }

    #[test]
    fn rejects_tampered_body() {
        let genesis = genesis_block();
        let mut block = block_after(&genesis, vec![event(1)], 1_700_000_000_000);
        block.body.events[0].event = Event::new(CreatePlayer {}, BlockTimestamp::from_unix_millis(1));
        assert!(matches!(
            validator().validate_structure(&block),
            Err(ValidationError::ChecksumMismatch { .. })
        ));

        // Recomputing the checksum exposes the stale event id instead.
        block.checksum = block.body.checksum().unwrap();
        assert!(matches!(
            validator().validate_structure(&block),
            Err(ValidationError::EventIdMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_events() {
        let genesis = genesis_block();
        let block = block_after(&genesis, vec![event(3), event(3)], 1_700_000_000_000);
        assert!(matches!(
            validator().validate_structure(&block),
            Err(ValidationError::DuplicateEvent(_))
        ));
    }

    #[test]
    fn event_signatures_are_checked() {
        let strict = ChainBlockValidator::new(Arc::new(SignatureEventValidator::new(Arc::new(
            RejectUnsigned,
        ))));
        let genesis = genesis_block();
        let block = block_after(&genesis, vec![event(1)], 1_700_000_000_000);
        assert!(matches!(
            strict.validate_structure(&block),
            Err(ValidationError::Signature {
                source: SignatureError::Rejected
            })
        ));
    }
}
