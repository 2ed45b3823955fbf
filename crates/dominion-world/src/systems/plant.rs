//! Plants.

use im::OrdMap;

use crate::component::Plant;
use crate::entity::Entity;
use crate::error::WorldError;

/// Owner of [`Plant`] components.
#[derive(Debug, Clone, Default)]
pub struct PlantSystem {
    plants: OrdMap<Entity, Plant>,
}

impl PlantSystem {
    pub(crate) fn add(&mut self, entity: Entity, plant: Plant) -> Result<(), WorldError> {
        if self.plants.contains_key(&entity) {
            return Err(WorldError::PlantAlreadyExists(entity));
        }
        self.plants.insert(entity, plant);
        Ok(())
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<Plant, WorldError> {
        self.plants
            .remove(&entity)
            .ok_or(WorldError::PlantNotFound(entity))
    }

    /// Plant component of an entity.
    pub fn get(&self, entity: Entity) -> Result<Plant, WorldError> {
        self.plants
            .get(&entity)
            .copied()
            .ok_or(WorldError::PlantNotFound(entity))
    }

    /// Whether the entity has a plant.
    pub fn exists(&self, entity: Entity) -> bool {
        self.plants.contains_key(&entity)
    }

    /// Every plant entity in ascending id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.plants.keys().copied().collect()
    }

    /// Number of plants.
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Whether there are no plants.
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}
