use tracing::info;

use super::Actions;
use crate::component::{Area, Planet};
use crate::entity::{Entity, EntityKind};
use crate::error::WorldError;
use crate::terrain::{self, TerrainGenerator};

impl Actions<'_> {
    /// Generate the next planet.
    ///
    /// The seed is the number of existing planets plus one, which makes the
    /// result a pure function of world state.
    pub fn create_planet(&mut self) -> Result<Entity, WorldError> {
        let count = self.state.planet.count();
        let seed = i64::try_from(count.saturating_add(1)).unwrap_or(i64::MAX);
        let name = terrain::planet_name(seed)?;
        let (width, height) = terrain::planet_dimensions(seed, self.state.planet_settings);

        let entity = self.state.create(EntityKind::Planet)?;
        let tiles = TerrainGenerator::new(seed, width, height).tiles(entity);
        self.state.area.add_area(entity, Area { width, height }, tiles)?;
        self.state.planet.add(
            entity,
            Planet {
                seed,
                name: name.to_owned(),
            },
        )?;

        info!(planet = %entity, seed, name, width, height, "Planet created");
        Ok(entity)
    }
}
