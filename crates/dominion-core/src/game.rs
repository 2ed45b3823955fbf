//! The authoritative game: world state, world clock and event dispatch.

use std::sync::Arc;
use std::time::Instant;

use dominion_chain::{SignatureError, SignatureVerifier};
use dominion_types::{BlockTimestamp, Event, EventBody, EventId, EventKind, IdentityError};
use dominion_world::{ClockError, Entity, State, WorldClock, WorldError, WorldSettings};
use im::OrdSet;
use tracing::{info, trace};

use crate::handlers::{CreatePlanetHandler, CreatePlayerHandler, EventHandler, PlanetCreated};

/// Errors raised while mutating the game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The event signature was rejected.
    #[error("signature error: {source}")]
    Signature {
        /// The verifier's reason.
        #[from]
        source: SignatureError,
    },

    /// The event's identity could not be computed.
    #[error("identity error: {source}")]
    Identity {
        /// The underlying identity error.
        #[from]
        source: IdentityError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The world clock rejected a timestamp.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// What applying an event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A planet was created.
    PlanetCreated(PlanetCreated),
    /// A player was registered.
    PlayerCreated(Entity),
}

impl EventOutcome {
    /// Kind of the event that produced this outcome.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PlanetCreated(_) => EventKind::CreatePlanet,
            Self::PlayerCreated(_) => EventKind::CreatePlayer,
        }
    }
}

/// World state, world clock and the signature check guarding them.
///
/// Cloning is cheap: the state and the applied-event set are persistent
/// collections.
#[derive(Debug, Clone)]
pub struct Game {
    state: State,
    clock: WorldClock,
    applied: OrdSet<EventId>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl Game {
    /// An empty world.
    pub fn new(
        settings: &WorldSettings,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Self, GameError> {
        Ok(Self {
            state: State::new(settings.planet),
            clock: WorldClock::new(settings.time_compression)?,
            applied: OrdSet::new(),
            verifier,
        })
    }

    /// Verify the event's signature and apply it to the live state.
    pub fn apply_event(&mut self, event: &Event) -> Result<EventOutcome, GameError> {
        self.verifier.verify(&event.signature, &event.body)?;
        let id = event.id()?;
        let outcome = match &event.body {
            EventBody::CreatePlanet(payload) => EventOutcome::PlanetCreated(
                CreatePlanetHandler.handle(&mut self.state, payload, &event.signature)?,
            ),
            EventBody::CreatePlayer(payload) => EventOutcome::PlayerCreated(
                CreatePlayerHandler.handle(&mut self.state, payload, &event.signature)?,
            ),
        };
        self.applied.insert(id);
        Ok(outcome)
    }

    /// Check whether `event` would apply cleanly, without changing anything.
    pub fn verify_event(&self, event: &Event) -> Result<EventOutcome, GameError> {
        self.clone().apply_event(event)
    }

    /// Advance the world clock to `timestamp` and age the world by the
    /// resulting simulated delta. Returns the delta in simulated millis.
    pub fn set_current_timestamp(&mut self, timestamp: BlockTimestamp) -> Result<u64, GameError> {
        let seeded = self.clock.is_seeded();
        let delta = self.clock.set_current_timestamp(timestamp.unix_millis())?;
        if !seeded {
            info!(timestamp = %timestamp, "World clock seeded");
        }
        let started = Instant::now();
        trace!(delta_ms = delta, "Delta time processing started");
        self.state.apply_delta_time(delta)?;
        trace!(
            delta_ms = delta,
            elapsed = ?started.elapsed(),
            "Delta time processing finished"
        );
        Ok(delta)
    }

    /// Whether the event with `id` has been applied.
    pub fn has_applied(&self, id: &EventId) -> bool {
        self.applied.contains(id)
    }

    /// The live world state.
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// The world clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }
}
