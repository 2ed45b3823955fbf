//! The world state: entity registry plus every component system.
//!
//! `State` is the only owner of world data. It is not internally
//! synchronised; the node serialises every mutation behind a single lock,
//! and speculative work happens on clones. Clones share structure through
//! persistent maps, so the cost of a clone does not grow with the world.

use tracing::debug;

use crate::actions::Actions;
use crate::entity::{Entity, EntityKind, EntityRegistry};
use crate::error::WorldError;
use crate::settings::PlanetSettings;
use crate::systems::{AreaSystem, PlanetSystem, PlantSystem, PossessionSystem, SeedSystem};

/// Complete world state.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub(crate) entities: EntityRegistry,
    pub(crate) area: AreaSystem,
    pub(crate) seed: SeedSystem,
    pub(crate) plant: PlantSystem,
    pub(crate) planet: PlanetSystem,
    pub(crate) possession: PossessionSystem,
    pub(crate) planet_settings: PlanetSettings,
}

impl State {
    /// An empty world generating planets within `planet_settings`.
    pub fn new(planet_settings: PlanetSettings) -> Self {
        Self {
            planet_settings,
            ..Self::default()
        }
    }

    /// Register a new entity.
    pub fn create(&mut self, kind: EntityKind) -> Result<Entity, WorldError> {
        self.entities.create(kind)
    }

    /// Kind the entity was registered with.
    pub fn kind(&self, entity: Entity) -> Result<EntityKind, WorldError> {
        self.entities.kind(entity)
    }

    /// Whether the entity is registered.
    pub fn exists(&self, entity: Entity) -> bool {
        self.entities.exists(entity)
    }

    /// Remove an entity and every component it has.
    ///
    /// Components are dropped in a fixed order: area position, area, seed,
    /// plant, planet, possession. The registry entry goes last.
    pub fn remove(&mut self, entity: Entity) -> Result<(), WorldError> {
        if !self.entities.exists(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        if self.area.has_position(entity) {
            self.area.remove_position(entity)?;
        }
        if self.area.has_area(entity) {
            self.area.remove_area(entity)?;
        }
        if self.seed.exists(entity) {
            self.seed.remove(entity)?;
        }
        if self.plant.exists(entity) {
            self.plant.remove(entity)?;
        }
        if self.planet.exists(entity) {
            self.planet.remove(entity)?;
        }
        if self.possession.exists(entity) {
            self.possession.remove(entity)?;
        }
        self.entities.remove(entity)?;
        Ok(())
    }

    /// Advance every system by `delta_millis` of simulated time.
    ///
    /// Seeds that mature are replaced by plants in ascending entity order.
    pub fn apply_delta_time(&mut self, delta_millis: u64) -> Result<(), WorldError> {
        if delta_millis == 0 {
            return Ok(());
        }
        let area = &self.area;
        let matured = self.seed.grow(delta_millis, |entity| area.has_position(entity));
        for seed in matured {
            let plant = self.actions().create_plant_from_seed(seed)?;
            debug!(%seed, %plant, "Seed matured into plant");
        }
        Ok(())
    }

    /// Multi-system operations on this state.
    pub const fn actions(&mut self) -> Actions<'_> {
        Actions::new(self)
    }

    /// Entity registry.
    pub const fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Area and position storage.
    pub const fn area(&self) -> &AreaSystem {
        &self.area
    }

    /// Seed storage.
    pub const fn seed(&self) -> &SeedSystem {
        &self.seed
    }

    /// Plant storage.
    pub const fn plant(&self) -> &PlantSystem {
        &self.plant
    }

    /// Planet storage.
    pub const fn planet(&self) -> &PlanetSystem {
        &self.planet
    }

    /// Possession storage.
    pub const fn possession(&self) -> &PossessionSystem {
        &self.possession
    }

    /// Bounds used when generating planets.
    pub const fn planet_settings(&self) -> PlanetSettings {
        self.planet_settings
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::component::{
        Area, AreaPosition, AreaPositionLayer, AreaTile, AreaTileKind, Possession, Seed, SeedKind,
    };

    fn world_with_area() -> (State, Entity) {
        let mut state = State::new(PlanetSettings::new(8, 8));
        let planet = state.create(EntityKind::Planet).unwrap();
        let tiles = vec![
            AreaTile {
                kind: AreaTileKind::Ground,
                owner_entity: planet,
            };
            16
        ];
        state
            .area
            .add_area(planet, Area { width: 4, height: 4 }, tiles)
            .unwrap();
        (state, planet)
    }

    #[test]
    fn remove_unknown_entity() {
        let mut state = State::default();
        assert_eq!(
            state.remove(Entity::new(1)),
            Err(WorldError::EntityNotFound(Entity::new(1)))
        );
    }

    #[test]
    fn remove_drops_every_component() {
        let (mut state, planet) = world_with_area();
        let seed = state
            .actions()
            .create_seed(SeedKind::Corn, planet, planet, 1, 1)
            .unwrap();
        assert!(state.area.is_occupied(planet, AreaPositionLayer::Surface, 1, 1));

        state.remove(seed).unwrap();
        assert!(!state.exists(seed));
        assert!(!state.seed.exists(seed));
        assert!(!state.area.has_position(seed));
        assert!(!state.possession.exists(seed));
        assert!(!state.area.is_occupied(planet, AreaPositionLayer::Surface, 1, 1));
    }

    #[test]
    fn clone_is_independent() {
        let (mut state, planet) = world_with_area();
        let snapshot = state.clone();
        let seed = state
            .actions()
            .create_seed(SeedKind::Wheat, planet, planet, 0, 0)
            .unwrap();
        assert!(state.exists(seed));
        assert!(!snapshot.exists(seed));
        assert!(!snapshot.seed().exists(seed));
        assert!(!snapshot.area().is_occupied(planet, AreaPositionLayer::Surface, 0, 0));
    }

    #[test]
    fn matured_seed_becomes_plant_in_place() {
        let (mut state, planet) = world_with_area();
        let seed = state
            .actions()
            .create_seed(SeedKind::Cannabis, planet, planet, 2, 3)
            .unwrap();

        // Half a simulated day: not yet.
        state.apply_delta_time(43_200_000).unwrap();
        assert!(state.seed().exists(seed));

        // Another full day pushes it past 1.0.
        state.apply_delta_time(86_400_000).unwrap();
        assert!(!state.exists(seed));
        assert!(!state.seed().exists(seed));

        let plants = state.plant().entities();
        assert_eq!(plants.len(), 1);
        let plant = plants[0];
        assert_eq!(state.kind(plant).unwrap(), EntityKind::PlantCannabis);
        assert_eq!(
            state.area().position(plant).unwrap(),
            AreaPosition {
                entity: planet,
                layer: AreaPositionLayer::Surface,
                x: 2,
                y: 3,
                width: 1,
                height: 1,
            }
        );
        assert_eq!(
            state.possession().get(plant).unwrap(),
            Possession {
                owner_entity: planet
            }
        );
    }

    #[test]
    fn seed_without_position_is_skipped() {
        let (mut state, _) = world_with_area();
        let loose = state.create(EntityKind::SeedCorn).unwrap();
        state
            .seed
            .add(
                loose,
                Seed {
                    kind: SeedKind::Corn,
                    maturity: 0.99,
                },
            )
            .unwrap();
        state.apply_delta_time(86_400_000_000).unwrap();
        assert!(state.seed().exists(loose));
        assert!(state.plant().is_empty());
    }
}
