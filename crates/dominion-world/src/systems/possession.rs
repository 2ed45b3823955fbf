//! Ownership of entities by planets and players.

use im::OrdMap;

use crate::component::Possession;
use crate::entity::{Entity, EntityRegistry};
use crate::error::WorldError;

/// Owner of [`Possession`] components.
#[derive(Debug, Clone, Default)]
pub struct PossessionSystem {
    possessions: OrdMap<Entity, Possession>,
}

impl PossessionSystem {
    /// The owner must be registered as a planet or a player.
    pub fn validate(possession: &Possession, registry: &EntityRegistry) -> Result<(), WorldError> {
        let owner = possession.owner_entity;
        let kind = registry.kind(owner)?;
        if !kind.can_own() {
            return Err(WorldError::PossessionOwnerInvalidEntity { owner, kind });
        }
        Ok(())
    }

    pub(crate) fn add(
        &mut self,
        entity: Entity,
        possession: Possession,
        registry: &EntityRegistry,
    ) -> Result<(), WorldError> {
        if self.possessions.contains_key(&entity) {
            return Err(WorldError::PossessionAlreadyExists(entity));
        }
        Self::validate(&possession, registry)?;
        self.possessions.insert(entity, possession);
        Ok(())
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<Possession, WorldError> {
        self.possessions
            .remove(&entity)
            .ok_or(WorldError::PossessionNotFound(entity))
    }

    /// Possession component of an entity.
    pub fn get(&self, entity: Entity) -> Result<Possession, WorldError> {
        self.possessions
            .get(&entity)
            .copied()
            .ok_or(WorldError::PossessionNotFound(entity))
    }

    /// Whether the entity has a possession.
    pub fn exists(&self, entity: Entity) -> bool {
        self.possessions.contains_key(&entity)
    }

    /// Keep the entities whose possession satisfies `predicate`.
    ///
    /// Entities without a possession are dropped.
    pub fn filter<P>(&self, entities: &[Entity], predicate: P) -> Vec<Entity>
    where
        P: Fn(&Possession) -> bool,
    {
        entities
            .iter()
            .copied()
            .filter(|entity| self.possessions.get(entity).is_some_and(&predicate))
            .collect()
    }
}
