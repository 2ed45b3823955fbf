//! Component values.
//!
//! Components are plain data. Each kind is stored by exactly one system,
//! keyed by the entity it belongs to; validation lives with the system.

use serde::{Deserialize, Serialize};

use crate::clock::{DAY_DELTA_FACTOR, THREE_DAYS_DELTA_FACTOR, TWO_DAYS_DELTA_FACTOR};
use crate::entity::{Entity, EntityKind};

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// A rectangular tile grid owned by an entity (usually a planet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl Area {
    /// Number of tiles in the grid.
    pub fn tile_count(self) -> u64 {
        u64::from(self.width).saturating_mul(u64::from(self.height))
    }
}

/// Occupancy layer of an [`AreaPosition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaPositionLayer {
    /// No layer. Positions on it cannot be placed.
    Empty,
    /// Things lying on the ground: seeds and plants.
    Surface,
    /// Players.
    Player,
}

/// A rectangle placed on another entity's area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaPosition {
    /// Entity whose area this position lies on.
    pub entity: Entity,
    /// Occupancy layer.
    pub layer: AreaPositionLayer,
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Columns covered.
    pub width: u8,
    /// Rows covered.
    pub height: u8,
}

/// Terrain of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaTileKind {
    /// Nothing.
    Empty,
    /// Deep water.
    Water,
    /// Shallow water.
    ShallowWater,
    /// Sand.
    Sand,
    /// Ground.
    Ground,
    /// Fertile ground.
    FertileGround,
    /// Gravel.
    Gravel,
    /// Lava.
    Lava,
    /// Stone.
    Stone,
    /// Snow.
    Snow,
}

impl AreaTileKind {
    /// Whether seeds can be scattered on this terrain.
    pub const fn is_arable(self) -> bool {
        matches!(self, Self::Ground | Self::FertileGround)
    }
}

/// One cell of an area grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaTile {
    /// Terrain.
    pub kind: AreaTileKind,
    /// Entity owning the tile.
    pub owner_entity: Entity,
}

// ---------------------------------------------------------------------------
// Flora
// ---------------------------------------------------------------------------

/// Species of a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedKind {
    /// No species.
    Empty,
    /// Oak tree.
    OakTree,
    /// Pine tree.
    PineTree,
    /// Wheat.
    Wheat,
    /// Cannabis.
    Cannabis,
    /// Corn.
    Corn,
}

impl SeedKind {
    /// Maturity gained per simulated second.
    pub const fn growth_per_second(self) -> f32 {
        match self {
            Self::Empty => 0.0,
            Self::OakTree => THREE_DAYS_DELTA_FACTOR,
            Self::PineTree | Self::Wheat | Self::Corn => TWO_DAYS_DELTA_FACTOR,
            Self::Cannabis => DAY_DELTA_FACTOR,
        }
    }

    /// Registry tag for a seed entity of this species.
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Empty => EntityKind::Unknown,
            Self::OakTree => EntityKind::SeedOakTree,
            Self::PineTree => EntityKind::SeedPineTree,
            Self::Wheat => EntityKind::SeedWheat,
            Self::Cannabis => EntityKind::SeedCannabis,
            Self::Corn => EntityKind::SeedCorn,
        }
    }

    /// Plant species this seed grows into.
    pub const fn plant_kind(self) -> PlantKind {
        match self {
            Self::Empty => PlantKind::Empty,
            Self::OakTree => PlantKind::OakTree,
            Self::PineTree => PlantKind::PineTree,
            Self::Wheat => PlantKind::Wheat,
            Self::Cannabis => PlantKind::Cannabis,
            Self::Corn => PlantKind::Corn,
        }
    }
}

/// A seed lying on an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    /// Species.
    pub kind: SeedKind,
    /// Growth progress in `[0, 1]`.
    pub maturity: f32,
}

/// Species of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantKind {
    /// No species.
    Empty,
    /// Oak tree.
    OakTree,
    /// Pine tree.
    PineTree,
    /// Wheat.
    Wheat,
    /// Cannabis.
    Cannabis,
    /// Corn.
    Corn,
}

impl PlantKind {
    /// Registry tag for a plant entity of this species.
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Empty => EntityKind::Unknown,
            Self::OakTree => EntityKind::PlantOakTree,
            Self::PineTree => EntityKind::PlantPineTree,
            Self::Wheat => EntityKind::PlantWheat,
            Self::Cannabis => EntityKind::PlantCannabis,
            Self::Corn => EntityKind::PlantCorn,
        }
    }
}

/// A growing plant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Species.
    pub kind: PlantKind,
    /// Growth progress.
    pub maturity: f32,
    /// Progress towards dispersing seeds by wind.
    pub anemochory_maturity: f32,
}

// ---------------------------------------------------------------------------
// Planet and ownership
// ---------------------------------------------------------------------------

/// A generated planet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Planet {
    /// Generation seed. Determines dimensions, name and terrain.
    pub seed: i64,
    /// Display name.
    pub name: String,
}

/// Marks an entity as owned by a planet or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Possession {
    /// The owner.
    pub owner_entity: Entity,
}
