use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dominion_types::{Event, EventBody, EventId, EventKind};
use tracing::debug;

use super::{BacklogError, BacklogTable, Flag, ItemStatus};
use crate::time::TimeSource;
use crate::validator::EventValidator;

/// Events submitted on this node.
///
/// An item is `sent` once pushed to the network, `received` once seen
/// coming back from it, and `confirmed` once carried by an accepted block.
#[derive(Debug)]
pub struct LocalEventBacklog {
    table: BacklogTable<EventId, Event>,
    accepted: BTreeSet<EventKind>,
    validator: Arc<dyn EventValidator>,
    time: Arc<dyn TimeSource>,
}

impl LocalEventBacklog {
    /// Backlog accepting every [`EventKind`].
    pub fn new(validator: Arc<dyn EventValidator>, time: Arc<dyn TimeSource>) -> Self {
        Self::with_accepted_kinds(EventKind::ALL, validator, time)
    }

    /// Backlog accepting only `kinds`.
    pub fn with_accepted_kinds(
        kinds: impl IntoIterator<Item = EventKind>,
        validator: Arc<dyn EventValidator>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            table: BacklogTable::default(),
            accepted: kinds.into_iter().collect(),
            validator,
            time,
        }
    }

    /// Stamp `body` with the current time, validate it and stage it.
    pub fn add(&self, body: impl Into<EventBody>) -> Result<EventId, BacklogError> {
        let body = body.into();
        let kind = body.kind();
        if !self.accepted.contains(&kind) {
            return Err(BacklogError::UnsupportedPayload { kind });
        }
        let event = Event::new(body, self.time.now());
        self.validator.validate(&event)?;
        let id = self.table.insert_with(event, |event| Ok(event.id()?))?;
        debug!(event_id = %id, %kind, "Local event staged");
        Ok(id)
    }

    /// Whether the event is staged.
    pub fn exists(&self, id: &EventId) -> bool {
        self.table.exists(id)
    }

    /// Flag the event as pushed to the network.
    pub fn mark_as_sent(&self, id: &EventId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Sent)
    }

    /// Flag the event as seen coming back from the network.
    pub fn mark_as_received(&self, id: &EventId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Received)
    }

    /// Flag the event as carried by an accepted block.
    pub fn mark_as_confirmed(&self, id: &EventId) -> Result<(), BacklogError> {
        self.table.mark(id, Flag::Confirmed)
    }

    /// Flags of a staged event.
    pub fn status(&self, id: &EventId) -> Option<ItemStatus> {
        self.table.status(id)
    }

    /// Copies of events not yet sent.
    pub fn unsent(&self) -> BTreeMap<EventId, Event> {
        self.table.without(Flag::Sent)
    }

    /// Copies of events not yet seen coming back.
    pub fn unreceived(&self) -> BTreeMap<EventId, Event> {
        self.table.without(Flag::Received)
    }

    /// Copies of events not yet confirmed.
    pub fn unconfirmed(&self) -> BTreeMap<EventId, Event> {
        self.table.without(Flag::Confirmed)
    }

    /// Copies of every staged event.
    pub fn all(&self) -> BTreeMap<EventId, Event> {
        self.table.all()
    }

    /// Number of staged events.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use dominion_types::{BlockTimestamp, CreatePlanet, CreatePlayer, Signature};

    use super::*;
    use crate::signature::{AcceptAllSignatures, SignatureError, SignatureVerifier};
    use crate::time::ManualTimeSource;
    use crate::validator::{SignatureEventValidator, ValidationError};

    #[derive(Debug)]
    struct RejectAll;

    impl SignatureVerifier for RejectAll {
        fn verify(&self, _: &Signature, _: &EventBody) -> Result<(), SignatureError> {
            Err(SignatureError::Rejected)
        }
    }

    fn backlog() -> (LocalEventBacklog, Arc<ManualTimeSource>) {
        let time = Arc::new(ManualTimeSource::new(BlockTimestamp::from_unix_millis(1_000)));
        let validator = Arc::new(SignatureEventValidator::new(Arc::new(AcceptAllSignatures)));
        (LocalEventBacklog::new(validator, time.clone()), time)
    }

    #[test]
    fn add_then_exists() {
        let (backlog, _) = backlog();
        let id = backlog.add(CreatePlanet {}).unwrap();
        assert!(backlog.exists(&id));
        let stored = backlog.all().remove(&id).unwrap();
        assert_eq!(stored.timestamp.unix_millis(), 1_000);
        assert_eq!(stored.id().unwrap(), id);
    }

    #[test]
    fn same_payload_at_same_instant_conflicts() {
        let (backlog, time) = backlog();
        backlog.add(CreatePlanet {}).unwrap();
        assert!(matches!(
            backlog.add(CreatePlanet {}),
            Err(BacklogError::AlreadyExists { .. })
        ));

        time.advance(Duration::from_millis(1));
        backlog.add(CreatePlanet {}).unwrap();
        assert_eq!(backlog.len(), 2);
    }

    #[test]
    fn rejected_event_is_not_staged() {
        let time = Arc::new(ManualTimeSource::new(BlockTimestamp::from_unix_millis(1_000)));
        let validator = Arc::new(SignatureEventValidator::new(Arc::new(RejectAll)));
        let backlog = LocalEventBacklog::new(validator, time);

        assert!(matches!(
            backlog.add(CreatePlanet {}),
            Err(BacklogError::Validation {
                source: ValidationError::Signature {
                    source: SignatureError::Rejected
                }
            })
        ));
        assert!(backlog.is_empty());
        assert!(backlog.all().is_empty());
        assert!(backlog.unsent().is_empty());
    }

    #[test]
    fn unsupported_kind_rejected() {
        let time = Arc::new(ManualTimeSource::default());
        let validator = Arc::new(SignatureEventValidator::new(Arc::new(AcceptAllSignatures)));
        let backlog =
            LocalEventBacklog::with_accepted_kinds([EventKind::CreatePlanet], validator, time);
        assert!(matches!(
            backlog.add(CreatePlayer {}),
            Err(BacklogError::UnsupportedPayload {
                kind: EventKind::CreatePlayer
            })
        ));
        assert!(backlog.is_empty());
    }

    #[test]
    fn flags_filter_views_independently() {
        let (backlog, time) = backlog();
        let first = backlog.add(CreatePlanet {}).unwrap();
        time.advance(Duration::from_millis(5));
        let second = backlog.add(CreatePlayer {}).unwrap();

        backlog.mark_as_sent(&first).unwrap();
        assert!(!backlog.unsent().contains_key(&first));
        assert!(backlog.unsent().contains_key(&second));
        assert!(backlog.unreceived().contains_key(&first));

        backlog.mark_as_received(&first).unwrap();
        backlog.mark_as_confirmed(&second).unwrap();
        assert!(!backlog.unreceived().contains_key(&first));
        assert!(!backlog.unconfirmed().contains_key(&second));
        assert!(backlog.unconfirmed().contains_key(&first));

        // Marking again is a no-op.
        backlog.mark_as_sent(&first).unwrap();
        assert_eq!(
            backlog.status(&first),
            Some(ItemStatus {
                sent: true,
                received: true,
                confirmed: false,
            })
        );
        assert!(backlog.exists(&first));
        assert_eq!(backlog.all().len(), 2);
    }

    #[test]
    fn marking_unknown_item_fails() {
        let (backlog, _) = backlog();
        let unknown = EventId::ZERO;
        assert!(matches!(
            backlog.mark_as_sent(&unknown),
            Err(BacklogError::NotFound { .. })
        ));
        assert!(matches!(
            backlog.mark_as_received(&unknown),
            Err(BacklogError::NotFound { .. })
        ));
        assert!(matches!(
            backlog.mark_as_confirmed(&unknown),
            Err(BacklogError::NotFound { .. })
        ));
    }

    #[test]
    fn views_are_copies() {
        let (backlog, _) = backlog();
        let id = backlog.add(CreatePlanet {}).unwrap();
        let mut copy = backlog.unsent();
        copy.get_mut(&id).unwrap().timestamp = BlockTimestamp::from_unix_millis(0);
        assert_eq!(backlog.all()[&id].timestamp.unix_millis(), 1_000);
    }
}
