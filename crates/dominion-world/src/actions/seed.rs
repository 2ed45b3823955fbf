use rand::Rng;
use tracing::debug;

use super::Actions;
use crate::component::{AreaPosition, AreaPositionLayer, Possession, Seed, SeedKind};
use crate::entity::Entity;
use crate::error::WorldError;
use crate::terrain;

/// Draws above this place an oak seed.
pub const OAK_TREE_THRESHOLD: f64 = 0.999_99;
/// Draws above this (and not above the oak threshold) place a pine seed.
pub const PINE_TREE_THRESHOLD: f64 = 0.999_95;
/// Draws above this (and not above the pine threshold) place a wheat seed.
pub const WHEAT_THRESHOLD: f64 = 0.999_90;

impl Actions<'_> {
    /// Place a fresh seed on a 1x1 surface cell of `area`, owned by `owner`.
    pub fn create_seed(
        &mut self,
        kind: SeedKind,
        owner: Entity,
        area: Entity,
        x: u32,
        y: u32,
    ) -> Result<Entity, WorldError> {
        if kind == SeedKind::Empty {
            return Err(WorldError::SeedKindEmpty);
        }
        let entity = self.state.create(kind.entity_kind())?;
        self.state.area.add_position(
            entity,
            AreaPosition {
                entity: area,
                layer: AreaPositionLayer::Surface,
                x,
                y,
                width: 1,
                height: 1,
            },
        )?;
        self.state.seed.add(
            entity,
            Seed {
                kind,
                maturity: 0.0,
            },
        )?;
        self.state.possession.add(
            entity,
            Possession {
                owner_entity: owner,
            },
            &self.state.entities,
        )?;
        Ok(entity)
    }

    /// Scatter seeds over the arable tiles of a planet.
    ///
    /// One draw is taken per ground or fertile-ground tile, row by row,
    /// from an RNG seeded with the planet seed. Seeds are owned by the
    /// planet.
    pub fn create_random_seeds_on_planet(&mut self, planet: Entity) -> Result<Vec<Entity>, WorldError> {
        let seed = self.state.planet.get(planet)?.seed;
        let area = self.state.area.area(planet)?;
        let grid = self.state.area.tile_grid(planet)?;
        let mut rng = terrain::seeded_rng(seed);
        let mut created = Vec::new();

        let width = area.width.max(1);
        let mut x = 0u32;
        let mut y = 0u32;
        for tile in grid.iter() {
            if tile.kind.is_arable() {
                let draw: f64 = rng.random();
                if let Some(kind) = seed_for_draw(draw) {
                    created.push(self.create_seed(kind, planet, planet, x, y)?);
                }
            }
            x = x.saturating_add(1);
            if x == width {
                x = 0;
                y = y.saturating_add(1);
            }
        }

        debug!(%planet, seeds = created.len(), "Seeds scattered");
        Ok(created)
    }
}

fn seed_for_draw(draw: f64) -> Option<SeedKind> {
    if draw > OAK_TREE_THRESHOLD {
        Some(SeedKind::OakTree)
    } else if draw > PINE_TREE_THRESHOLD {
        Some(SeedKind::PineTree)
    } else if draw > WHEAT_THRESHOLD {
        Some(SeedKind::Wheat)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_thresholds() {
        assert_eq!(seed_for_draw(0.999_995), Some(SeedKind::OakTree));
        assert_eq!(seed_for_draw(0.999_97), Some(SeedKind::PineTree));
        assert_eq!(seed_for_draw(0.999_92), Some(SeedKind::Wheat));
        assert_eq!(seed_for_draw(0.5), None);
    }
}
