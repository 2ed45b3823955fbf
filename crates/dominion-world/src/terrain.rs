//! Deterministic planet generation.
//!
//! Everything about a planet derives from its integer seed: dimensions
//! come from a ChaCha stream seeded with it, the name from a fixed table,
//! and terrain from three layered OpenSimplex channels. Every node replays
//! the same `CreatePlanet` event and must produce the same grid.
//!
//! Terrain rules, per tile:
//!
//! 1. Sample the surface channel.
//! 2. Past 85% of the distance from centre to edge, push the surface
//!    towards zero so planet borders read as deep water.
//! 3. Classify: below 0.30 shallow water, below 0.40 water, below 0.43
//!    sand, above 0.80 stone (lava where the stone channel exceeds 0.7),
//!    otherwise ground or fertile ground split by the fertile channel.

use noise::{NoiseFn, OpenSimplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::component::{AreaTile, AreaTileKind};
use crate::entity::Entity;
use crate::error::WorldError;
use crate::settings::PlanetSettings;

/// Planet names indexed by `seed - 1`.
pub const PLANET_NAMES: [&str; 9] = [
    "New Ganymede",
    "Tatlon",
    "Aertan",
    "New Kenya",
    "Satai",
    "Callisto",
    "9733 Sagittae III",
    "Ru-Shou Prime",
    "New Earth",
];

const SHALLOW_WATER_LEVEL: f64 = 0.30;
const WATER_LEVEL: f64 = 0.40;
const SAND_LEVEL: f64 = 0.43;
const STONE_LEVEL: f64 = 0.80;
const LAVA_LEVEL: f64 = 0.70;
const GROUND_LEVEL: f64 = 0.25;
const WRAP_DISTANCE: f64 = 0.85;

const SURFACE_FREQUENCY: u32 = 8;
const FERTILE_FREQUENCY: u32 = 16;
const STONE_FREQUENCY: u32 = 32;

/// Octave weights and their frequency multipliers.
const OCTAVES: [(f64, f64); 3] = [(1.0, 1.0), (0.5, 4.0), (0.25, 8.0)];
const OCTAVE_WEIGHT_SUM: f64 = 1.75;

/// RNG stream for everything derived from a planet seed.
pub fn seeded_rng(seed: i64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed.to_le_bytes()))
}

/// Name of the planet generated from `seed`.
pub fn planet_name(seed: i64) -> Result<&'static str, WorldError> {
    usize::try_from(seed)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| PLANET_NAMES.get(index))
        .copied()
        .ok_or(WorldError::PlanetNameOutOfBounds(seed))
}

/// Width and height of the planet generated from `seed`.
pub fn planet_dimensions(seed: i64, settings: PlanetSettings) -> (u32, u32) {
    let mut rng = seeded_rng(seed);
    let low = settings.min_dimension.min(settings.max_dimension);
    let span = f64::from(settings.max_dimension.max(low).saturating_sub(low));
    let mut draw = || {
        let offset = (rng.random::<f64>() * span).floor();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let offset = offset as u32;
        low.saturating_add(offset)
    };
    let width = draw();
    let height = draw();
    (width, height)
}

/// One noise channel: three OpenSimplex octaves at rising frequencies.
struct Channel {
    octaves: [OpenSimplex; 3],
    frequency: f64,
    width: f64,
    height: f64,
}

impl Channel {
    fn new(seed: i64, frequency: u32, width: u32, height: u32) -> Self {
        let base = seed.wrapping_mul(i64::from(frequency));
        Self {
            octaves: [
                OpenSimplex::new(fold_seed(base)),
                OpenSimplex::new(fold_seed(base.wrapping_mul(2))),
                OpenSimplex::new(fold_seed(base.wrapping_mul(4))),
            ],
            frequency: f64::from(frequency),
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Weighted octave sum, normalised to roughly `[0, 1]`.
    fn sample(&self, x: u32, y: u32) -> f64 {
        let nx = f64::from(x) / self.width * self.frequency;
        let ny = f64::from(y) / self.height * self.frequency;
        let sum: f64 = self
            .octaves
            .iter()
            .zip(OCTAVES)
            .map(|(octave, (weight, scale))| weight * normalised(octave.get([nx * scale, ny * scale])))
            .sum();
        sum / OCTAVE_WEIGHT_SUM
    }
}

/// Map OpenSimplex output from `[-1, 1]` to `[0, 1]`.
fn normalised(value: f64) -> f64 {
    ((value + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn fold_seed(seed: i64) -> u32 {
    u32::try_from(seed.rem_euclid(1 << 32)).unwrap_or_default()
}

/// Terrain generator for one planet.
pub struct TerrainGenerator {
    surface: Channel,
    fertile: Channel,
    stone: Channel,
    width: u32,
    height: u32,
}

impl TerrainGenerator {
    /// Generator for a `width * height` planet grown from `seed`.
    pub fn new(seed: i64, width: u32, height: u32) -> Self {
        Self {
            surface: Channel::new(seed, SURFACE_FREQUENCY, width, height),
            fertile: Channel::new(seed, FERTILE_FREQUENCY, width, height),
            stone: Channel::new(seed, STONE_FREQUENCY, width, height),
            width,
            height,
        }
    }

    /// Terrain of tile `(x, y)`.
    pub fn tile_kind(&self, x: u32, y: u32) -> AreaTileKind {
        let mut level = self.surface.sample(x, y);

        let distance = edge_distance(x, self.width).max(edge_distance(y, self.height));
        if distance > WRAP_DISTANCE {
            level = (level - (distance - WRAP_DISTANCE) / (1.0 - WRAP_DISTANCE)).max(0.0);
        }

        if level < SHALLOW_WATER_LEVEL {
            AreaTileKind::ShallowWater
        } else if level < WATER_LEVEL {
            AreaTileKind::Water
        } else if level < SAND_LEVEL {
            AreaTileKind::Sand
        } else if level > STONE_LEVEL {
            if self.stone.sample(x, y) > LAVA_LEVEL {
                AreaTileKind::Lava
            } else {
                AreaTileKind::Stone
            }
        } else if self.fertile.sample(x, y) > GROUND_LEVEL {
            AreaTileKind::Ground
        } else {
            AreaTileKind::FertileGround
        }
    }

    /// Full grid, row by row, every tile owned by `owner`.
    pub fn tiles(&self, owner: Entity) -> Vec<AreaTile> {
        let mut tiles = Vec::with_capacity(
            usize::try_from(u64::from(self.width).saturating_mul(u64::from(self.height)))
                .unwrap_or_default(),
        );
        for y in 0..self.height {
            for x in 0..self.width {
                tiles.push(AreaTile {
                    kind: self.tile_kind(x, y),
                    owner_entity: owner,
                });
            }
        }
        tiles
    }
}

/// Distance of `coordinate` from the centre along one axis, as a fraction
/// of the half-extent.
fn edge_distance(coordinate: u32, extent: u32) -> f64 {
    let half = f64::from((extent / 2).max(1));
    (half - f64::from(coordinate)).abs() / half
}
