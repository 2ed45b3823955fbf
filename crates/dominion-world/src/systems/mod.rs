//! Component systems.
//!
//! Each system owns the storage of one component kind (two for
//! [`AreaSystem`]) and the rules for changing it. Systems hold persistent
//! maps, so cloning a system shares structure until either copy changes.

pub mod area;
pub mod planet;
pub mod plant;
pub mod possession;
pub mod seed;

pub use area::{AreaSystem, AreaTilesExtent};
pub use planet::PlanetSystem;
pub use plant::PlantSystem;
pub use possession::PossessionSystem;
pub use seed::SeedSystem;
