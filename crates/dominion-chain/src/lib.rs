//! Block and event pipeline for a single-authority private chain.
//!
//! Locally submitted events are staged in a [`LocalEventBacklog`], pushed
//! through a [`Connector`] and collected by every node into its
//! [`NetworkEventBacklog`]. The authority batches unconfirmed network
//! events into blocks on a fixed cadence ([`BlockTicker`],
//! [`BlockBuilder`]). Every node ingests blocks through the
//! [`BlockReceiver`], which validates them, marks their events confirmed
//! and hands both blocks and events to the [`EventEmitter`] for the world
//! engine to replay.
//!
//! # Modules
//!
//! - [`backlog`] -- the three backlog state machines
//! - [`builder`] -- deterministic block assembly
//! - [`cancel`] -- [`CancelToken`] for every blocking wait
//! - [`config`] -- [`ChainConfig`]
//! - [`connector`] -- transport contract and the in-process [`LocalConnector`]
//! - [`emitter`] -- hand-off queues towards the world engine
//! - [`genesis`] -- the fixed first block
//! - [`network`] -- the long-running send, receive and production loops
//! - [`receiver`] -- block ingestion
//! - [`signature`] -- [`SignatureVerifier`] contract
//! - [`storage`] -- block and event storage
//! - [`ticker`] -- block production cadence
//! - [`time`] -- [`TimeSource`] abstraction over the wall clock
//! - [`validator`] -- block and event acceptance rules

pub mod backlog;
pub mod builder;
pub mod cancel;
pub mod config;
pub mod connector;
pub mod emitter;
pub mod genesis;
pub mod network;
mod queue;
pub mod receiver;
pub mod signature;
pub mod storage;
pub mod ticker;
pub mod time;
pub mod validator;

pub use backlog::{
    BacklogError, ItemStatus, LocalBlockBacklog, LocalEventBacklog, NetworkEventBacklog,
};
pub use builder::BlockBuilder;
pub use cancel::{CancelToken, Canceled};
pub use config::ChainConfig;
pub use connector::{Connector, ConnectorError, LocalConnector};
pub use emitter::{EmitterError, EventEmitter};
pub use genesis::genesis_block;
pub use network::{Network, NetworkDependencies, NetworkError};
pub use receiver::{BlockReceiver, IngestError, IngestOutcome, ReceiverDependencies};
pub use signature::{AcceptAllSignatures, SignatureError, SignatureVerifier};
pub use storage::{
    BlockStorage, EventStorage, MemoryBlockStorage, MemoryEventStorage, StorageError,
};
pub use ticker::BlockTicker;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use validator::{
    BlockValidator, ChainBlockValidator, EventValidator, SignatureEventValidator, ValidationError,
};
