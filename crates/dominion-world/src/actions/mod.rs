//! Operations spanning several systems.
//!
//! An action validates and mutates more than one component kind, so a
//! failure part way leaves earlier steps applied. Callers that need all or
//! nothing run the action on a clone of [`State`] first.

mod planet;
mod plant;
mod seed;

pub use seed::{OAK_TREE_THRESHOLD, PINE_TREE_THRESHOLD, WHEAT_THRESHOLD};

use crate::entity::{Entity, EntityKind};
use crate::error::WorldError;
use crate::state::State;

/// Multi-system operations borrowed from a [`State`].
#[derive(Debug)]
pub struct Actions<'a> {
    state: &'a mut State,
}

impl<'a> Actions<'a> {
    pub(crate) const fn new(state: &'a mut State) -> Self {
        Self { state }
    }

    /// Register a player entity.
    pub fn create_player(&mut self) -> Result<Entity, WorldError> {
        self.state.create(EntityKind::Player)
    }
}
