//! Per-event-kind handlers.
//!
//! A handler owns the mutation sequence for one event kind. Handling runs
//! that sequence twice: first on a clone of the state, where any failure
//! is harmless, then on the live state. A failing event therefore never
//! leaves the live state half-mutated.

use dominion_types::{CreatePlanet, CreatePlayer, Signature};
use dominion_world::{Entity, State, WorldError};
use tracing::debug;

/// Mutation logic for one event kind.
pub trait EventHandler {
    /// Payload handled.
    type Event;
    /// What a successful application produced.
    type Output;

    /// Apply the event's mutations to `state`.
    fn execute(
        &self,
        state: &mut State,
        event: &Self::Event,
        signature: &Signature,
    ) -> Result<Self::Output, WorldError>;

    /// Dry-run the event on a clone of `state`.
    fn validate(
        &self,
        state: &State,
        event: &Self::Event,
        signature: &Signature,
    ) -> Result<(), WorldError> {
        let mut scratch = state.clone();
        self.execute(&mut scratch, event, signature).map(drop)
    }

    /// Validate on a clone, then apply to `state`.
    fn handle(
        &self,
        state: &mut State,
        event: &Self::Event,
        signature: &Signature,
    ) -> Result<Self::Output, WorldError> {
        self.validate(state, event, signature)?;
        self.execute(state, event, signature)
    }
}

/// Result of a planet creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanetCreated {
    /// The new planet.
    pub planet: Entity,
    /// Seeds scattered on its surface.
    pub seeds: Vec<Entity>,
}

/// Creates a planet and scatters random seeds over it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePlanetHandler;

impl EventHandler for CreatePlanetHandler {
    type Event = CreatePlanet;
    type Output = PlanetCreated;

    fn execute(
        &self,
        state: &mut State,
        _event: &CreatePlanet,
        _signature: &Signature,
    ) -> Result<PlanetCreated, WorldError> {
        let planet = state.actions().create_planet()?;
        let seeds = state.actions().create_random_seeds_on_planet(planet)?;
        debug!(planet = %planet, seeds = seeds.len(), "Planet populated");
        Ok(PlanetCreated { planet, seeds })
    }
}

/// Registers a player entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePlayerHandler;

impl EventHandler for CreatePlayerHandler {
    type Event = CreatePlayer;
    type Output = Entity;

    fn execute(
        &self,
        state: &mut State,
        _event: &CreatePlayer,
        _signature: &Signature,
    ) -> Result<Entity, WorldError> {
        state.actions().create_player()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_world::{EntityKind, PlanetSettings};

    use super::*;

    fn state() -> State {
        State::new(PlanetSettings::new(16, 24))
    }

    #[test]
    fn validate_leaves_state_untouched() {
        let state = state();
        CreatePlanetHandler
            .validate(&state, &CreatePlanet {}, &Signature::default())
            .unwrap();
        assert!(state.entities().is_empty());
        assert_eq!(state.planet().count(), 0);
    }

    #[test]
    fn handle_creates_planet_with_seeds() {
        let mut state = state();
        let created = CreatePlanetHandler
            .handle(&mut state, &CreatePlanet {}, &Signature::default())
            .unwrap();
        assert_eq!(state.kind(created.planet).unwrap(), EntityKind::Planet);
        for seed in &created.seeds {
            assert_eq!(
                state.possession().get(*seed).unwrap().owner_entity,
                created.planet
            );
        }
    }

    #[test]
    fn failing_event_does_not_mutate() {
        let mut state = State::new(PlanetSettings::new(4, 4));
        for _ in 0..9 {
            CreatePlanetHandler
                .handle(&mut state, &CreatePlanet {}, &Signature::default())
                .unwrap();
        }
        let before = state.entities().len();
        assert_eq!(
            CreatePlanetHandler.handle(&mut state, &CreatePlanet {}, &Signature::default()),
            Err(WorldError::PlanetNameOutOfBounds(10))
        );
        assert_eq!(state.entities().len(), before);
        assert_eq!(state.planet().count(), 9);
    }

    #[test]
    fn player_handler_registers_player() {
        let mut state = state();
        let player = CreatePlayerHandler
            .handle(&mut state, &CreatePlayer {}, &Signature::default())
            .unwrap();
        assert_eq!(state.kind(player).unwrap(), EntityKind::Player);
    }
}
