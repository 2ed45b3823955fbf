//! Deterministic world state for the Dominion simulation.
//!
//! The world is an entity/component store. An [`Entity`] is an opaque
//! handle allocated by the [`EntityRegistry`]; each component kind lives
//! in the map of the system that owns it. [`State`] owns the registry and
//! every system, and clones in sublinear time so callers can dry-run a
//! mutation on a copy before committing it to the live state.
//!
//! # Modules
//!
//! - [`entity`] -- [`Entity`] handles, [`EntityKind`] tags and the registry.
//! - [`component`] -- plain component values (area, position, tiles,
//!   seed, plant, planet, possession).
//! - [`systems`] -- per-component storage with validation and update logic,
//!   including spatial occupancy in [`systems::AreaSystem`].
//! - [`state`] -- [`State`], the owner of every system.
//! - [`actions`] -- multi-system operations (planet creation, seed
//!   scattering, seed to plant conversion).
//! - [`terrain`] -- deterministic planet dimensions, names and tile grids.
//! - [`clock`] -- [`WorldClock`], wall-clock to simulated-time conversion.
//! - [`settings`] -- [`WorldSettings`] loaded from node configuration.
//! - [`error`] -- [`WorldError`].

pub mod actions;
pub mod clock;
pub mod component;
pub mod entity;
pub mod error;
pub mod settings;
pub mod state;
pub mod systems;
pub mod terrain;

pub use actions::Actions;
pub use clock::{ClockError, WorldClock};
pub use component::{
    Area, AreaPosition, AreaPositionLayer, AreaTile, AreaTileKind, Planet, Plant, PlantKind,
    Possession, Seed, SeedKind,
};
pub use entity::{Entity, EntityKind, EntityRegistry};
pub use error::WorldError;
pub use settings::{PlanetSettings, WorldSettings};
pub use state::State;
pub use systems::AreaTilesExtent;
