//! Areas, tile grids and spatial occupancy.
//!
//! Every area keeps one occupancy set per position layer. A position is
//! rasterized into cell indices (`y * area_width + x` for each covered
//! cell); placing it takes those cells, removing it releases them. A cell
//! can be held by at most one position per `(area, layer)`.
//!
//! Tile grids are immutable after creation and shared between clones.

use std::sync::Arc;

use im::{OrdMap, OrdSet};

use crate::component::{Area, AreaPosition, AreaPositionLayer, AreaTile};
use crate::entity::Entity;
use crate::error::WorldError;

/// Inclusive rectangle of tiles: columns `left..=right`, rows `top..=bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaTilesExtent {
    /// First column.
    pub left: u32,
    /// First row.
    pub top: u32,
    /// Last column.
    pub right: u32,
    /// Last row.
    pub bottom: u32,
}

impl AreaTilesExtent {
    /// Extent from its four edges.
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Extent covering the whole area.
    pub const fn full(area: Area) -> Self {
        Self {
            left: 0,
            top: 0,
            right: area.width.saturating_sub(1),
            bottom: area.height.saturating_sub(1),
        }
    }
}

/// Cells currently claimed on each layer of one area.
#[derive(Debug, Clone, Default)]
struct Occupancy {
    surface: OrdSet<u64>,
    player: OrdSet<u64>,
}

impl Occupancy {
    fn layer_mut(&mut self, layer: AreaPositionLayer) -> Result<&mut OrdSet<u64>, WorldError> {
        match layer {
            AreaPositionLayer::Surface => Ok(&mut self.surface),
            AreaPositionLayer::Player => Ok(&mut self.player),
            AreaPositionLayer::Empty => Err(WorldError::AreaPositionLayerInvalid(layer)),
        }
    }

    const fn layer(&self, layer: AreaPositionLayer) -> Option<&OrdSet<u64>> {
        match layer {
            AreaPositionLayer::Surface => Some(&self.surface),
            AreaPositionLayer::Player => Some(&self.player),
            AreaPositionLayer::Empty => None,
        }
    }
}

/// Owner of [`Area`] and [`AreaPosition`] components.
#[derive(Debug, Clone, Default)]
pub struct AreaSystem {
    areas: OrdMap<Entity, Area>,
    tiles: OrdMap<Entity, Arc<[AreaTile]>>,
    occupancy: OrdMap<Entity, Occupancy>,
    positions: OrdMap<Entity, AreaPosition>,
}

impl AreaSystem {
    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check that a position fits inside its area.
    ///
    /// Checks run in order: the referenced area exists, the rectangle has
    /// non-zero dimensions, the rectangle stays inside the area, the layer
    /// can hold positions. Occupancy is not checked here.
    pub fn validate_position(&self, position: &AreaPosition) -> Result<(), WorldError> {
        let area = self
            .areas
            .get(&position.entity)
            .ok_or(WorldError::AreaPositionEntityHasNoArea(position.entity))?;

        if position.width == 0 || position.height == 0 {
            return Err(WorldError::AreaPositionWithoutDimensions);
        }

        let right = u64::from(position.x).saturating_add(u64::from(position.width));
        let bottom = u64::from(position.y).saturating_add(u64::from(position.height));
        if right > u64::from(area.width) || bottom > u64::from(area.height) {
            return Err(WorldError::AreaPositionOverflow);
        }

        if position.layer == AreaPositionLayer::Empty {
            return Err(WorldError::AreaPositionLayerInvalid(position.layer));
        }

        Ok(())
    }

    /// Check that an area has dimensions and exactly `width * height` tiles.
    pub fn validate_area(area: Area, tiles: &[AreaTile]) -> Result<(), WorldError> {
        if area.width == 0 || area.height == 0 {
            return Err(WorldError::AreaWithoutDimensions);
        }
        let expected = area.tile_count();
        if u64::try_from(tiles.len()).ok() != Some(expected) {
            return Err(WorldError::AreaTilesInvalidCount {
                expected,
                actual: tiles.len(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Areas
    // -----------------------------------------------------------------------

    pub(crate) fn add_area(
        &mut self,
        entity: Entity,
        area: Area,
        tiles: Vec<AreaTile>,
    ) -> Result<(), WorldError> {
        if self.areas.contains_key(&entity) {
            return Err(WorldError::AreaAlreadyExists(entity));
        }
        Self::validate_area(area, &tiles)?;

        self.areas.insert(entity, area);
        self.tiles.insert(entity, Arc::from(tiles));
        self.occupancy.insert(entity, Occupancy::default());
        Ok(())
    }

    pub(crate) fn remove_area(&mut self, entity: Entity) -> Result<Area, WorldError> {
        let area = self
            .areas
            .remove(&entity)
            .ok_or(WorldError::AreaNotFound(entity))?;
        self.tiles.remove(&entity);
        self.occupancy.remove(&entity);
        Ok(area)
    }

    /// Area component of an entity.
    pub fn area(&self, entity: Entity) -> Result<Area, WorldError> {
        self.areas
            .get(&entity)
            .copied()
            .ok_or(WorldError::AreaNotFound(entity))
    }

    /// Whether the entity has an area.
    pub fn has_area(&self, entity: Entity) -> bool {
        self.areas.contains_key(&entity)
    }

    /// Tiles inside `extent`, row by row.
    ///
    /// Fails with [`WorldError::AreaTileOutOfBounds`] if any edge reaches
    /// the area's width or height.
    pub fn area_tiles(
        &self,
        entity: Entity,
        extent: AreaTilesExtent,
    ) -> Result<Vec<AreaTile>, WorldError> {
        let area = self.area(entity)?;
        if extent.left >= area.width
            || extent.right >= area.width
            || extent.top >= area.height
            || extent.bottom >= area.height
        {
            return Err(WorldError::AreaTileOutOfBounds(entity));
        }
        if extent.left > extent.right || extent.top > extent.bottom {
            return Err(WorldError::AreaTilesExtentInverted);
        }

        let tiles = self.tiles_of(entity)?;
        let row_len = usize::try_from(extent.right.saturating_sub(extent.left))
            .map_or(usize::MAX, |span| span.saturating_add(1));
        let mut out = Vec::new();
        for y in extent.top..=extent.bottom {
            let start = cell_index(area.width, extent.left, y)
                .ok_or(WorldError::AreaTileOutOfBounds(entity))?;
            let row = tiles
                .get(start..start.saturating_add(row_len))
                .ok_or(WorldError::AreaTileOutOfBounds(entity))?;
            out.extend_from_slice(row);
        }
        Ok(out)
    }

    /// Copy of a single tile.
    pub fn tile(&self, entity: Entity, x: u32, y: u32) -> Result<AreaTile, WorldError> {
        let area = self.area(entity)?;
        if x >= area.width || y >= area.height {
            return Err(WorldError::AreaTileOutOfBounds(entity));
        }
        let index =
            cell_index(area.width, x, y).ok_or(WorldError::AreaTileOutOfBounds(entity))?;
        self.tiles_of(entity)?
            .get(index)
            .copied()
            .ok_or(WorldError::AreaTileOutOfBounds(entity))
    }

    /// Shared handle to the whole tile grid of an area, row by row.
    pub fn tile_grid(&self, entity: Entity) -> Result<Arc<[AreaTile]>, WorldError> {
        self.tiles_of(entity).map(Arc::clone)
    }

    fn tiles_of(&self, entity: Entity) -> Result<&Arc<[AreaTile]>, WorldError> {
        self.tiles.get(&entity).ok_or(WorldError::AreaNotFound(entity))
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    pub(crate) fn add_position(
        &mut self,
        entity: Entity,
        position: AreaPosition,
    ) -> Result<(), WorldError> {
        if self.positions.contains_key(&entity) {
            return Err(WorldError::AreaPositionAlreadyExists(entity));
        }
        self.validate_position(&position)?;
        self.take_position(&position)?;
        self.positions.insert(entity, position);
        Ok(())
    }

    /// Apply `update` to an entity's position.
    ///
    /// Only `x` and `y` may change. The move is all or nothing: either the
    /// position and its occupancy both change, or neither does.
    pub(crate) fn update_position<F>(&mut self, entity: Entity, update: F) -> Result<(), WorldError>
    where
        F: FnOnce(AreaPosition) -> AreaPosition,
    {
        let previous = self.position(entity)?;
        let next = update(previous);

        if next.layer != previous.layer {
            return Err(WorldError::AreaPositionLayerImmutable);
        }
        if next.width != previous.width || next.height != previous.height {
            return Err(WorldError::AreaPositionDimensionsImmutable);
        }
        if next.entity != previous.entity {
            return Err(WorldError::AreaPositionAreaImmutable);
        }
        self.validate_position(&next)?;
        self.move_position(&previous, &next)?;
        self.positions.insert(entity, next);
        Ok(())
    }

    /// Removes the position and releases its cells. Cells of an area that
    /// no longer exists need no release.
    pub(crate) fn remove_position(&mut self, entity: Entity) -> Result<AreaPosition, WorldError> {
        let position = self.position(entity)?;
        if self.areas.contains_key(&position.entity) {
            self.release_position(&position)?;
        }
        self.positions.remove(&entity);
        Ok(position)
    }

    /// Area position component of an entity.
    pub fn position(&self, entity: Entity) -> Result<AreaPosition, WorldError> {
        self.positions
            .get(&entity)
            .copied()
            .ok_or(WorldError::AreaPositionNotFound(entity))
    }

    /// Whether the entity has an area position.
    pub fn has_position(&self, entity: Entity) -> bool {
        self.positions.contains_key(&entity)
    }

    /// Whether cell `(x, y)` of `area` is claimed on `layer`.
    pub fn is_occupied(&self, area: Entity, layer: AreaPositionLayer, x: u32, y: u32) -> bool {
        let (Some(dims), Some(occupancy)) = (self.areas.get(&area), self.occupancy.get(&area))
        else {
            return false;
        };
        if x >= dims.width || y >= dims.height {
            return false;
        }
        let cell = u64::from(y)
            .saturating_mul(u64::from(dims.width))
            .saturating_add(u64::from(x));
        occupancy
            .layer(layer)
            .is_some_and(|cells| cells.contains(&cell))
    }

    // -----------------------------------------------------------------------
    // Occupancy
    // -----------------------------------------------------------------------

    /// Cell indices covered by a position. Assumes the position is valid.
    fn cells(&self, position: &AreaPosition) -> Result<Vec<u64>, WorldError> {
        let area = self
            .areas
            .get(&position.entity)
            .ok_or(WorldError::AreaPositionEntityHasNoArea(position.entity))?;
        let width = u64::from(area.width);
        let mut cells =
            Vec::with_capacity(usize::from(position.width).saturating_mul(usize::from(position.height)));
        for dy in 0..u64::from(position.height) {
            let row = u64::from(position.y).saturating_add(dy).saturating_mul(width);
            for dx in 0..u64::from(position.width) {
                cells.push(row.saturating_add(u64::from(position.x)).saturating_add(dx));
            }
        }
        Ok(cells)
    }

    pub(crate) fn take_position(&mut self, position: &AreaPosition) -> Result<(), WorldError> {
        let cells = self.cells(position)?;
        let layer = self.layer_mut(position)?;
        if cells.iter().any(|cell| layer.contains(cell)) {
            return Err(WorldError::AreaPositionAlreadyTaken);
        }
        layer.extend(cells);
        Ok(())
    }

    pub(crate) fn release_position(&mut self, position: &AreaPosition) -> Result<(), WorldError> {
        let cells = self.cells(position)?;
        let layer = self.layer_mut(position)?;
        if !cells.iter().all(|cell| layer.contains(cell)) {
            return Err(WorldError::AreaPositionNotTaken);
        }
        for cell in &cells {
            layer.remove(cell);
        }
        Ok(())
    }

    /// Swap the cells of `previous` for those of `next` in one step.
    ///
    /// The mover must hold every previous cell. Cells it already holds may
    /// be reused; any other claimed cell rejects the move.
    fn move_position(&mut self, previous: &AreaPosition, next: &AreaPosition) -> Result<(), WorldError> {
        let old_cells = self.cells(previous)?;
        let new_cells = self.cells(next)?;
        let layer = self.layer_mut(previous)?;

        let mut moved = layer.clone();
        for cell in &old_cells {
            if moved.remove(cell).is_none() {
                return Err(WorldError::AreaPositionNotTaken);
            }
        }
        if new_cells.iter().any(|cell| moved.contains(cell)) {
            return Err(WorldError::AreaPositionAlreadyTaken);
        }
        moved.extend(new_cells);
        *layer = moved;
        Ok(())
    }

    fn layer_mut(&mut self, position: &AreaPosition) -> Result<&mut OrdSet<u64>, WorldError> {
        self.occupancy
            .get_mut(&position.entity)
            .ok_or(WorldError::AreaPositionEntityHasNoArea(position.entity))?
            .layer_mut(position.layer)
    }
}

fn cell_index(width: u32, x: u32, y: u32) -> Option<usize> {
    let index = u64::from(y)
        .checked_mul(u64::from(width))?
        .checked_add(u64::from(x))?;
    usize::try_from(index).ok()
}
