//! Shared wire types for the Dominion chain.
//!
//! Blocks and events are the only values exchanged between the chain
//! pipeline and the world engine. Both are content addressed: their
//! identifiers are SHA-256 digests of a canonical JSON encoding.
//!
//! # Modules
//!
//! - [`ids`] -- 32-byte digest identifiers ([`BlockId`], [`EventId`], [`Checksum`])
//! - [`timestamp`] -- [`BlockTimestamp`] in unix milliseconds
//! - [`event`] -- [`Event`], [`EventBody`] and the authoritative [`EventKind`] list
//! - [`block`] -- [`Block`], [`BlockBody`], [`BlockEvent`]
//! - [`identity`] -- canonical serialization and hashing
//! - [`signature`] -- opaque [`Signature`] bytes carried by events

pub mod block;
pub mod event;
pub mod identity;
pub mod ids;
pub mod signature;
pub mod timestamp;

pub use block::{Block, BlockBody, BlockEvent};
pub use event::{CreatePlanet, CreatePlayer, Event, EventBody, EventKind};
pub use identity::IdentityError;
pub use ids::{BlockId, Checksum, DIGEST_LEN, EventId};
pub use signature::Signature;
pub use timestamp::BlockTimestamp;
