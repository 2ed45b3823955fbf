//! Content-addressed identity.
//!
//! The canonical encoding of a chain object is its `serde_json`
//! serialization. Every wire type is a plain struct or enum with no maps,
//! so field order is fixed by the type definition and the encoding is
//! stable across nodes. Identity is the SHA-256 digest of those bytes.
//!
//! One scope applies everywhere:
//!
//! - [`EventId`]: digest of the whole [`Event`] (body, timestamp, signature)
//! - [`Checksum`]: digest of a [`BlockBody`]
//! - [`BlockId`]: digest of the whole [`Block`], checksum included

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::block::{Block, BlockBody};
use crate::event::Event;
use crate::ids::{BlockId, Checksum, DIGEST_LEN, EventId};

/// Errors raised while computing an identity.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The value could not be canonically serialized.
    #[error("cannot serialize {what} for hashing: {source}")]
    Serialization {
        /// Which kind of object was being hashed.
        what: &'static str,
        /// The underlying serializer error.
        source: serde_json::Error,
    },
}

/// Canonical bytes of a chain object.
pub fn canonical_bytes<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, IdentityError> {
    serde_json::to_vec(value).map_err(|source| IdentityError::Serialization { what, source })
}

/// SHA-256 of the canonical bytes of `value`.
pub fn digest<T: Serialize>(what: &'static str, value: &T) -> Result<[u8; DIGEST_LEN], IdentityError> {
    let bytes = canonical_bytes(what, value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = hasher.finalize();
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hash);
    Ok(out)
}

impl Event {
    /// Identity of this event.
    pub fn id(&self) -> Result<EventId, IdentityError> {
        digest("event", self).map(EventId::from_bytes)
    }
}

impl BlockBody {
    /// Checksum of this body.
    pub fn checksum(&self) -> Result<Checksum, IdentityError> {
        digest("block body", self).map(Checksum::from_bytes)
    }
}

impl Block {
    /// Identity of this block.
    pub fn id(&self) -> Result<BlockId, IdentityError> {
        digest("block", self).map(BlockId::from_bytes)
    }
}
