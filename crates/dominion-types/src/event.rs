//! Events: the only inputs that change world state.

use serde::{Deserialize, Serialize};

use crate::signature::Signature;
use crate::timestamp::BlockTimestamp;

/// Request to generate the next planet.
///
/// Carries no parameters: the planet seed is derived from the number of
/// planets already in the world, so every node generates the same planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CreatePlanet {}

/// Request to register a new player entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CreatePlayer {}

/// Discriminant of [`EventBody`].
///
/// [`EventKind::ALL`] is the single list of recognised kinds; backlogs use
/// it as their accepted set and the game dispatcher matches on
/// [`EventBody`] exhaustively, so a new kind cannot be half-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// [`CreatePlanet`].
    CreatePlanet,
    /// [`CreatePlayer`].
    CreatePlayer,
}

impl EventKind {
    /// Every recognised event kind.
    pub const ALL: [Self; 2] = [Self::CreatePlanet, Self::CreatePlayer];

    /// Stable name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatePlanet => "create_planet",
            Self::CreatePlayer => "create_player",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Populated payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventBody {
    /// See [`CreatePlanet`].
    CreatePlanet(CreatePlanet),
    /// See [`CreatePlayer`].
    CreatePlayer(CreatePlayer),
}

impl EventBody {
    /// Kind of this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::CreatePlanet(_) => EventKind::CreatePlanet,
            Self::CreatePlayer(_) => EventKind::CreatePlayer,
        }
    }
}

impl From<CreatePlanet> for EventBody {
    fn from(payload: CreatePlanet) -> Self {
        Self::CreatePlanet(payload)
    }
}

impl From<CreatePlayer> for EventBody {
    fn from(payload: CreatePlayer) -> Self {
        Self::CreatePlayer(payload)
    }
}

/// A signed, timestamped event.
///
/// Immutable once built; its identity covers every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// What the event asks the world to do.
    pub body: EventBody,
    /// When the event was first accepted into a local backlog.
    pub timestamp: BlockTimestamp,
    /// Author signature over the event.
    #[serde(default)]
    pub signature: Signature,
}

impl Event {
    /// Build an unsigned event.
    pub fn new(body: impl Into<EventBody>, timestamp: BlockTimestamp) -> Self {
        Self {
            body: body.into(),
            timestamp,
            signature: Signature::default(),
        }
    }

    /// Kind of the payload.
    pub const fn kind(&self) -> EventKind {
        self.body.kind()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_body() {
        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(5));
        assert_eq!(event.kind(), EventKind::CreatePlanet);
        assert_eq!(EventBody::from(CreatePlayer {}).kind(), EventKind::CreatePlayer);
    }

    #[test]
    fn every_kind_is_listed() {
        let bodies = [EventBody::from(CreatePlanet {}), EventBody::from(CreatePlayer {})];
        for body in &bodies {
            assert!(EventKind::ALL.contains(&body.kind()));
        }
    }

    #[test]
    fn wire_shape() {
        let event = Event::new(CreatePlayer {}, BlockTimestamp::from_unix_millis(42));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["signature"], "");
        assert!(json["body"].get("create_player").is_some());
    }
}
