//! Planets.

use im::OrdMap;

use crate::component::Planet;
use crate::entity::Entity;
use crate::error::WorldError;

/// Owner of [`Planet`] components.
#[derive(Debug, Clone, Default)]
pub struct PlanetSystem {
    planets: OrdMap<Entity, Planet>,
}

impl PlanetSystem {
    pub(crate) fn add(&mut self, entity: Entity, planet: Planet) -> Result<(), WorldError> {
        if self.planets.contains_key(&entity) {
            return Err(WorldError::PlanetAlreadyExists(entity));
        }
        self.planets.insert(entity, planet);
        Ok(())
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<Planet, WorldError> {
        self.planets
            .remove(&entity)
            .ok_or(WorldError::PlanetNotFound(entity))
    }

    /// Planet component of an entity.
    pub fn get(&self, entity: Entity) -> Result<Planet, WorldError> {
        self.planets
            .get(&entity)
            .cloned()
            .ok_or(WorldError::PlanetNotFound(entity))
    }

    /// Whether the entity is a planet.
    pub fn exists(&self, entity: Entity) -> bool {
        self.planets.contains_key(&entity)
    }

    /// Number of planets.
    pub fn count(&self) -> usize {
        self.planets.len()
    }

    /// Every planet entity in ascending id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.planets.keys().copied().collect()
    }
}
