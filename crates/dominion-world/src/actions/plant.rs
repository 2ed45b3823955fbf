use super::Actions;
use crate::component::{Plant, PlantKind};
use crate::entity::Entity;
use crate::error::WorldError;

impl Actions<'_> {
    /// Replace a seed with a plant of the matching species.
    ///
    /// The plant takes over the seed's area position and possession; the
    /// seed entity is removed first so its cells are free to re-take.
    pub fn create_plant_from_seed(&mut self, seed_entity: Entity) -> Result<Entity, WorldError> {
        let seed = self.state.seed.get(seed_entity)?;
        let position = self.state.area.position(seed_entity)?;
        let possession = self.state.possession.get(seed_entity)?;
        let kind = seed.kind.plant_kind();
        if kind == PlantKind::Empty {
            return Err(WorldError::SeedKindEmpty);
        }

        self.state.remove(seed_entity)?;

        let plant = self.state.create(kind.entity_kind())?;
        self.state.area.add_position(plant, position)?;
        self.state.plant.add(
            plant,
            Plant {
                kind,
                maturity: 0.0,
                anemochory_maturity: 0.0,
            },
        )?;
        self.state
            .possession
            .add(plant, possession, &self.state.entities)?;
        Ok(plant)
    }
}
