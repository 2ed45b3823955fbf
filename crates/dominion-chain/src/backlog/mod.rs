//! Backlog state machines.
//!
//! A backlog is a staging map of items keyed by identity. Each item
//! carries independent lifecycle flags (sent, received, confirmed) that
//! only ever go from false to true. Items are never evicted.
//!
//! Three backlogs track three views of the same traffic:
//!
//! - [`LocalEventBacklog`] -- events submitted on this node
//! - [`NetworkEventBacklog`] -- events observed on the network
//! - [`LocalBlockBacklog`] -- blocks proposed by this node
//!
//! Each backlog guards its map with its own lock. Readers get deep copies.

mod local_block;
mod local_event;
mod network_event;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dominion_types::{EventKind, IdentityError};

pub use local_block::LocalBlockBacklog;
pub use local_event::LocalEventBacklog;
pub use network_event::NetworkEventBacklog;

use crate::validator::ValidationError;

/// Errors returned by backlog operations.
#[derive(Debug, thiserror::Error)]
pub enum BacklogError {
    /// An item with the same identity is already staged.
    #[error("backlog item {id} already exists")]
    AlreadyExists {
        /// Identity of the existing item, hex encoded.
        id: String,
    },

    /// No item with this identity is staged.
    #[error("backlog item {id} not found")]
    NotFound {
        /// Requested identity, hex encoded.
        id: String,
    },

    /// The backlog does not accept this kind of event.
    #[error("unsupported event payload {kind}")]
    UnsupportedPayload {
        /// The rejected kind.
        kind: EventKind,
    },

    /// The item failed validation.
    #[error("validation failed: {source}")]
    Validation {
        /// The validator's reason.
        #[from]
        source: ValidationError,
    },

    /// The item's identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },
}

/// Lifecycle flag of a backlog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    Sent,
    Received,
    Confirmed,
}

/// Snapshot of an item's lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemStatus {
    /// Pushed to the network.
    pub sent: bool,
    /// Seen coming back from the network.
    pub received: bool,
    /// Seen inside an accepted block.
    pub confirmed: bool,
}

impl ItemStatus {
    const fn get(self, flag: Flag) -> bool {
        match flag {
            Flag::Sent => self.sent,
            Flag::Received => self.received,
            Flag::Confirmed => self.confirmed,
        }
    }

    const fn set(&mut self, flag: Flag) {
        match flag {
            Flag::Sent => self.sent = true,
            Flag::Received => self.received = true,
            Flag::Confirmed => self.confirmed = true,
        }
    }
}

#[derive(Debug)]
struct Item<T> {
    payload: T,
    status: ItemStatus,
}

/// Lock-guarded map shared by the three backlogs.
#[derive(Debug)]
pub(crate) struct BacklogTable<Id, T> {
    items: Mutex<BTreeMap<Id, Item<T>>>,
}

impl<Id, T> Default for BacklogTable<Id, T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<Id, T> BacklogTable<Id, T>
where
    Id: Ord + Copy + Display,
    T: Clone,
{
    /// Flags are monotonic, so a map left behind by a panicking holder is
    /// still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<Id, Item<T>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compute the id under the lock and insert, refusing duplicates.
    pub(crate) fn insert_with<F>(&self, payload: T, identify: F) -> Result<Id, BacklogError>
    where
        F: FnOnce(&T) -> Result<Id, BacklogError>,
    {
        let mut items = self.lock();
        let id = identify(&payload)?;
        if items.contains_key(&id) {
            return Err(BacklogError::AlreadyExists { id: id.to_string() });
        }
        items.insert(
            id,
            Item {
                payload,
                status: ItemStatus::default(),
            },
        );
        Ok(id)
    }

    pub(crate) fn exists(&self, id: &Id) -> bool {
        self.lock().contains_key(id)
    }

    pub(crate) fn mark(&self, id: &Id, flag: Flag) -> Result<(), BacklogError> {
        let mut items = self.lock();
        let item = items
            .get_mut(id)
            .ok_or_else(|| BacklogError::NotFound { id: id.to_string() })?;
        item.status.set(flag);
        Ok(())
    }

    pub(crate) fn status(&self, id: &Id) -> Option<ItemStatus> {
        self.lock().get(id).map(|item| item.status)
    }

    pub(crate) fn without(&self, flag: Flag) -> BTreeMap<Id, T> {
        self.lock()
            .iter()
            .filter(|(_, item)| !item.status.get(flag))
            .map(|(id, item)| (*id, item.payload.clone()))
            .collect()
    }

    pub(crate) fn all(&self) -> BTreeMap<Id, T> {
        self.lock()
            .iter()
            .map(|(id, item)| (*id, item.payload.clone()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
