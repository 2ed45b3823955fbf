//! Entity handles and the registry that allocates them.

use std::fmt;

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Opaque handle naming a row across component systems.
///
/// Ids start at 1, increase monotonically and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag recorded for each entity at creation.
///
/// Only used to validate ownership; systems never dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// No particular kind.
    Unknown,
    /// A planet.
    Planet,
    /// A player.
    Player,
    /// Oak tree seed.
    SeedOakTree,
    /// Pine tree seed.
    SeedPineTree,
    /// Wheat seed.
    SeedWheat,
    /// Cannabis seed.
    SeedCannabis,
    /// Corn seed.
    SeedCorn,
    /// Oak tree.
    PlantOakTree,
    /// Pine tree.
    PlantPineTree,
    /// Wheat.
    PlantWheat,
    /// Cannabis.
    PlantCannabis,
    /// Corn.
    PlantCorn,
}

impl EntityKind {
    /// Whether entities of this kind may own possessions.
    pub const fn can_own(self) -> bool {
        matches!(self, Self::Planet | Self::Player)
    }
}

/// Allocator and kind registry for entities.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    next: u64,
    kinds: OrdMap<Entity, EntityKind>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    /// An empty registry whose first entity will be `#1`.
    pub fn new() -> Self {
        Self {
            next: 1,
            kinds: OrdMap::new(),
        }
    }

    /// Allocate a fresh entity tagged with `kind`.
    pub fn create(&mut self, kind: EntityKind) -> Result<Entity, WorldError> {
        let entity = Entity(self.next);
        self.next = self.next.checked_add(1).ok_or(WorldError::EntityIdsExhausted)?;
        self.kinds.insert(entity, kind);
        Ok(entity)
    }

    /// Kind the entity was created with.
    pub fn kind(&self, entity: Entity) -> Result<EntityKind, WorldError> {
        self.kinds
            .get(&entity)
            .copied()
            .ok_or(WorldError::EntityNotFound(entity))
    }

    /// Whether the entity is registered.
    pub fn exists(&self, entity: Entity) -> bool {
        self.kinds.contains_key(&entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no entity is live.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<EntityKind, WorldError> {
        self.kinds
            .remove(&entity)
            .ok_or(WorldError::EntityNotFound(entity))
    }
}
