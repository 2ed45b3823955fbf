//! Seeds and their growth.

use im::OrdMap;

use crate::component::Seed;
use crate::entity::Entity;
use crate::error::WorldError;

/// Owner of [`Seed`] components.
#[derive(Debug, Clone, Default)]
pub struct SeedSystem {
    seeds: OrdMap<Entity, Seed>,
}

impl SeedSystem {
    /// Reject maturities above 1.0.
    pub fn validate(seed: &Seed) -> Result<(), WorldError> {
        if seed.maturity.is_nan() || seed.maturity > 1.0 {
            return Err(WorldError::SeedMaturityOverflow);
        }
        Ok(())
    }

    pub(crate) fn add(&mut self, entity: Entity, seed: Seed) -> Result<(), WorldError> {
        if self.seeds.contains_key(&entity) {
            return Err(WorldError::SeedAlreadyExists(entity));
        }
        Self::validate(&seed)?;
        self.seeds.insert(entity, seed);
        Ok(())
    }

    pub(crate) fn update<F>(&mut self, entity: Entity, update: F) -> Result<(), WorldError>
    where
        F: FnOnce(Seed) -> Seed,
    {
        let next = update(self.get(entity)?);
        Self::validate(&next)?;
        self.seeds.insert(entity, next);
        Ok(())
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<Seed, WorldError> {
        self.seeds
            .remove(&entity)
            .ok_or(WorldError::SeedNotFound(entity))
    }

    /// Seed component of an entity.
    pub fn get(&self, entity: Entity) -> Result<Seed, WorldError> {
        self.seeds
            .get(&entity)
            .copied()
            .ok_or(WorldError::SeedNotFound(entity))
    }

    /// Whether the entity has a seed.
    pub fn exists(&self, entity: Entity) -> bool {
        self.seeds.contains_key(&entity)
    }

    /// Every seed entity in ascending id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.seeds.keys().copied().collect()
    }

    /// Number of seeds.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Whether there are no seeds.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Age every placed seed by `delta_millis` of simulated time.
    ///
    /// Seeds for which `is_placed` is false are skipped. Seeds whose
    /// maturity would pass 1.0 are left untouched and returned so the
    /// caller can turn them into plants.
    pub(crate) fn grow<P>(&mut self, delta_millis: u64, is_placed: P) -> Vec<Entity>
    where
        P: Fn(Entity) -> bool,
    {
        #[allow(clippy::cast_precision_loss)]
        let seconds = delta_millis as f32 / 1000.0;
        let mut matured = Vec::new();

        for entity in self.entities() {
            if !is_placed(entity) {
                continue;
            }
            let Some(seed) = self.seeds.get_mut(&entity) else {
                continue;
            };
            let maturity = seed.kind.growth_per_second().mul_add(seconds, seed.maturity);
            if maturity > 1.0 {
                matured.push(entity);
            } else {
                seed.maturity = maturity;
            }
        }
        matured
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::DAY_DELTA_FACTOR;
    use crate::component::SeedKind;

    fn seed(kind: SeedKind, maturity: f32) -> Seed {
        Seed { kind, maturity }
    }

    #[test]
    fn maturity_overflow_rejected() {
        let mut system = SeedSystem::default();
        assert_eq!(
            system.add(Entity::new(1), seed(SeedKind::Wheat, 1.5)),
            Err(WorldError::SeedMaturityOverflow)
        );
        system.add(Entity::new(1), seed(SeedKind::Wheat, 1.0)).unwrap();
        assert_eq!(
            system.add(Entity::new(1), seed(SeedKind::Wheat, 0.0)),
            Err(WorldError::SeedAlreadyExists(Entity::new(1)))
        );
        assert_eq!(
            system.update(Entity::new(1), |s| seed(s.kind, 2.0)),
            Err(WorldError::SeedMaturityOverflow)
        );
    }

    #[test]
    fn grow_ages_placed_seeds_only() {
        let mut system = SeedSystem::default();
        let placed = Entity::new(1);
        let loose = Entity::new(2);
        system.add(placed, seed(SeedKind::Cannabis, 0.0)).unwrap();
        system.add(loose, seed(SeedKind::Cannabis, 0.0)).unwrap();

        // Twelve simulated hours.
        let matured = system.grow(43_200_000, |e| e == placed);
        assert!(matured.is_empty());
        let grown = system.get(placed).unwrap().maturity;
        assert!((grown - DAY_DELTA_FACTOR * 43_200.0).abs() < 1e-3);
        assert!((grown - 0.5).abs() < 1e-3);
        assert!(system.get(loose).unwrap().maturity.abs() < f32::EPSILON);
    }

    #[test]
    fn grow_reports_matured_seeds() {
        let mut system = SeedSystem::default();
        let oak = Entity::new(1);
        let wheat = Entity::new(2);
        system.add(oak, seed(SeedKind::OakTree, 0.0)).unwrap();
        system.add(wheat, seed(SeedKind::Wheat, 0.0)).unwrap();

        // Two and a half simulated days: wheat (two days) matures, oak (three) does not.
        let matured = system.grow(216_000_000, |_| true);
        assert_eq!(matured, vec![wheat]);
        assert!(system.get(oak).unwrap().maturity < 1.0);
    }
}
