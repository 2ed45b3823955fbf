//! Game engine and node assembly for the Dominion simulation.
//!
//! This crate joins the chain pipeline to the world state:
//!
//! - [`game`] -- [`Game`], the authoritative world plus its clock, and the
//!   single entry point for applying confirmed events.
//! - [`handlers`] -- one handler per event kind, each dry-running its
//!   mutations on a clone before touching the live state.
//! - [`pump`] -- [`EventPump`], which replays emitted events and block
//!   timestamps into the game under one lock.
//! - [`api`] -- [`GameApi`], the query and submission facade.
//! - [`config`] -- [`NodeConfig`] loaded from YAML.
//! - [`node`] -- [`Node`], which wires everything and supervises the tasks.

pub mod api;
pub mod config;
pub mod game;
pub mod handlers;
pub mod node;
pub mod pump;

pub use api::{ApiError, GameApi, PlanetView, SeedView};
pub use config::{ConfigError, LogFormat, LoggingConfig, NodeConfig};
pub use game::{EventOutcome, Game, GameError};
pub use handlers::{CreatePlanetHandler, CreatePlayerHandler, EventHandler, PlanetCreated};
pub use node::{Node, NodeError};
pub use pump::{EventPump, PumpError};
