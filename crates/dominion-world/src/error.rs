//! Error types for the `dominion-world` crate.
//!
//! Variants fall into three groups: lookups that found nothing, inserts
//! that collided with an existing component or occupied cell, and values
//! rejected by a system's validation rules. None of them is fatal on its
//! own; the caller decides whether a failed mutation matters.

use crate::component::AreaPositionLayer;
use crate::entity::{Entity, EntityKind};

/// Errors raised by world-state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity is not registered.
    #[error("entity {0} not found")]
    EntityNotFound(Entity),

    /// The registry ran out of fresh ids.
    #[error("entity id space exhausted")]
    EntityIdsExhausted,

    // -----------------------------------------------------------------------
    // Area
    // -----------------------------------------------------------------------
    /// No area component for the entity.
    #[error("area of entity {0} not found")]
    AreaNotFound(Entity),

    /// The entity already has an area.
    #[error("entity {0} already has an area")]
    AreaAlreadyExists(Entity),

    /// Width or height is zero.
    #[error("area has zero width or height")]
    AreaWithoutDimensions,

    /// The tile grid does not match the area dimensions.
    #[error("area expects {expected} tiles, got {actual}")]
    AreaTilesInvalidCount {
        /// `width * height`.
        expected: u64,
        /// Tiles supplied.
        actual: usize,
    },

    /// A tile coordinate or extent lies outside the area.
    #[error("tile request outside the bounds of area {0}")]
    AreaTileOutOfBounds(Entity),

    /// The extent has `left > right` or `top > bottom`.
    #[error("tile extent is inverted")]
    AreaTilesExtentInverted,

    // -----------------------------------------------------------------------
    // Area positions
    // -----------------------------------------------------------------------
    /// No area position for the entity.
    #[error("area position of entity {0} not found")]
    AreaPositionNotFound(Entity),

    /// The entity already has an area position.
    #[error("entity {0} already has an area position")]
    AreaPositionAlreadyExists(Entity),

    /// The position refers to an entity without an area.
    #[error("position refers to entity {0} which has no area")]
    AreaPositionEntityHasNoArea(Entity),

    /// Width or height is zero.
    #[error("area position has zero width or height")]
    AreaPositionWithoutDimensions,

    /// The rectangle extends past the area's edge.
    #[error("area position overflows its area")]
    AreaPositionOverflow,

    /// The layer has no occupancy map.
    #[error("layer {0:?} cannot hold positions")]
    AreaPositionLayerInvalid(AreaPositionLayer),

    /// A target cell is held by another position.
    #[error("area position cell already taken")]
    AreaPositionAlreadyTaken,

    /// A cell expected to be held is free.
    #[error("area position cell is not taken")]
    AreaPositionNotTaken,

    /// An update tried to change the layer.
    #[error("area position layer cannot change")]
    AreaPositionLayerImmutable,

    /// An update tried to change width or height.
    #[error("area position dimensions cannot change")]
    AreaPositionDimensionsImmutable,

    /// An update tried to move the position to another area.
    #[error("area position cannot move between areas")]
    AreaPositionAreaImmutable,

    // -----------------------------------------------------------------------
    // Seeds, plants, planets
    // -----------------------------------------------------------------------
    /// No seed component for the entity.
    #[error("seed {0} not found")]
    SeedNotFound(Entity),

    /// The entity already has a seed.
    #[error("entity {0} already has a seed")]
    SeedAlreadyExists(Entity),

    /// Seed maturity is above 1.0 (or not a number).
    #[error("seed maturity overflow")]
    SeedMaturityOverflow,

    /// The seed kind cannot be planted.
    #[error("seed kind is empty")]
    SeedKindEmpty,

    /// No plant component for the entity.
    #[error("plant {0} not found")]
    PlantNotFound(Entity),

    /// The entity already has a plant.
    #[error("entity {0} already has a plant")]
    PlantAlreadyExists(Entity),

    /// No planet component for the entity.
    #[error("planet {0} not found")]
    PlanetNotFound(Entity),

    /// The entity already has a planet.
    #[error("entity {0} already has a planet")]
    PlanetAlreadyExists(Entity),

    /// No planet name exists for the seed.
    #[error("no planet name for seed {0}")]
    PlanetNameOutOfBounds(i64),

    // -----------------------------------------------------------------------
    // Possession
    // -----------------------------------------------------------------------
    /// No possession component for the entity.
    #[error("possession of entity {0} not found")]
    PossessionNotFound(Entity),

    /// The entity already has a possession.
    #[error("entity {0} already has a possession")]
    PossessionAlreadyExists(Entity),

    /// The owner is neither a planet nor a player.
    #[error("entity {owner} of kind {kind:?} cannot own things")]
    PossessionOwnerInvalidEntity {
        /// The rejected owner.
        owner: Entity,
        /// Its registered kind.
        kind: EntityKind,
    },
}
