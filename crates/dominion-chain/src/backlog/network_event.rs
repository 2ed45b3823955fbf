use std::collections::BTreeMap;
use std::sync::Arc;

use dominion_types::{Event, EventId};

use super::{BacklogError, BacklogTable, Flag};
use crate::validator::EventValidator;

/// Events observed on the network, waiting to be carried by a block.
#[derive(Debug)]
pub struct NetworkEventBacklog {
    table: BacklogTable<EventId, Event>,
    validator: Arc<dyn EventValidator>,
}

impl NetworkEventBacklog {
    /// Empty backlog validating events with `validator`.
    pub fn new(validator: Arc<dyn EventValidator>) -> Self {
        Self {
            table: BacklogTable::default(),
            validator,
        }
    }

    /// Validate and stage an event as received.
    pub fn add(&self, event: Event) -> Result<EventId, BacklogError> {
        self.validator.validate(&event)?;
        self.table.insert_with(event, |event| Ok(event.id()?))
    }

    /// Whether the event is staged.
    pub fn exists(&self, id: &EventId) -> bool {
        self.table.exists(id)
    }

    /// Flag the event as carried by an accepted block.
    pub fn mark_as_confirmed(&self, id: &EventId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Confirmed)
    }

    /// Copies of events not yet confirmed.
    pub fn unconfirmed(&self) -> BTreeMap<EventId, Event> {
        self.table.without(Flag::Confirmed)
    }

    /// Copies of every staged event.
    pub fn all(&self) -> BTreeMap<EventId, Event> {
        self.table.all()
    }
}
