//! Layered tile-map rendering and collision.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use pushbox_config::schema::TileMapConfig;
use pushbox_core::component::{Component, ComponentSet, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::math::TileIndex;
use pushbox_core::message::MessageHandler;
use pushbox_core::stage::{NodeId, NodeKind};
use pushbox_core::CoreError;

use super::tile::{TileComponent, TileSetComponent};
use super::with_concrete;

// ---------------------------------------------------------------------------
// WallGrid
// ---------------------------------------------------------------------------

/// A static snapshot of a tile map's collision data.
///
/// Taken once when a puzzle spawns; the map's tiles never change during
/// play, so consumers keep the snapshot instead of re-walking the layers
/// every move.
#[derive(Debug, Clone)]
pub struct WallGrid {
    width: i32,
    height: i32,
    spawn: TileIndex,
    walls: Vec<bool>,
}

impl WallGrid {
    /// Build a grid directly from dimensions and a wall bitmap. Meant for
    /// tests; engine code takes snapshots via [`TileMapComponent::grid`].
    pub fn new(width: i32, height: i32, spawn: TileIndex, walls: Vec<bool>) -> Self {
        Self {
            width,
            height,
            spawn,
            walls,
        }
    }

    /// Whether a tile blocks movement. Everything outside the map does.
    pub fn wall_at(&self, tile: TileIndex) -> bool {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width || tile.y >= self.height {
            return true;
        }
        self.walls[(tile.y * self.width + tile.x) as usize]
    }

    /// The player's starting tile.
    pub fn spawn(&self) -> TileIndex {
        self.spawn
    }
}

// ---------------------------------------------------------------------------
// TileMapComponent
// ---------------------------------------------------------------------------

struct TileMapLayer {
    // Row-major, one entry per grid cell.
    tiles: Vec<Option<TileComponent>>,
}

/// Stamps a tile set across a grid, one or more layers deep, and answers
/// collision queries against the result.
pub struct TileMapComponent {
    name: String,
    tile_set_name: String,
    tiles_wide: u32,
    tiles_high: u32,
    spawn: TileIndex,
    layer_ids: Vec<Vec<i32>>,
    tile_set: Option<TileSetComponent>,
    layers: Vec<TileMapLayer>,
    container: Option<NodeId>,
}

impl TileMapComponent {
    /// Build a template from config.
    pub fn from_config(config: &TileMapConfig) -> Self {
        Self {
            name: config.name.clone(),
            tile_set_name: config.tile_set.clone(),
            tiles_wide: config.tiles_wide,
            tiles_high: config.tiles_high,
            spawn: TileIndex::new(config.spawn_tile_x, config.spawn_tile_y),
            layer_ids: config.layers.iter().map(|l| l.tile_ids.clone()).collect(),
            tile_set: None,
            layers: Vec::new(),
            container: None,
        }
    }

    /// A copy carrying the configuration but no stamped layers or nodes.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            tile_set_name: self.tile_set_name.clone(),
            tiles_wide: self.tiles_wide,
            tiles_high: self.tiles_high,
            spawn: self.spawn,
            layer_ids: self.layer_ids.clone(),
            tile_set: None,
            layers: Vec::new(),
            container: None,
        }
    }

    /// Whether a tile blocks movement, across all layers. Out-of-bounds
    /// tiles count as walls.
    pub fn wall_at(&self, tile: TileIndex) -> bool {
        if tile.x < 0
            || tile.y < 0
            || tile.x >= self.tiles_wide as i32
            || tile.y >= self.tiles_high as i32
        {
            return true;
        }
        let cell = (tile.y * self.tiles_wide as i32 + tile.x) as usize;
        self.layers.iter().any(|layer| {
            layer
                .tiles
                .get(cell)
                .and_then(|t| t.as_ref())
                .map(|t| t.is_wall())
                .unwrap_or(false)
        })
    }

    /// The player's starting tile.
    pub fn spawn_tile(&self) -> TileIndex {
        self.spawn
    }

    /// Snapshot the collision data.
    pub fn grid(&self) -> WallGrid {
        let mut walls = Vec::with_capacity((self.tiles_wide * self.tiles_high) as usize);
        for y in 0..self.tiles_high as i32 {
            for x in 0..self.tiles_wide as i32 {
                walls.push(self.wall_at(TileIndex::new(x, y)));
            }
        }
        WallGrid::new(self.tiles_wide as i32, self.tiles_high as i32, self.spawn, walls)
    }
}

impl MessageHandler for TileMapComponent {}

impl Component for TileMapComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, templates: &ComponentSet, ctx: &GameContext) -> Result<(), CoreError> {
        let template =
            templates
                .get(&self.tile_set_name)
                .ok_or_else(|| CoreError::ComponentNotFound {
                    name: self.tile_set_name.clone(),
                })?;
        let mut tile_set =
            with_concrete::<TileSetComponent, _>(template, "tileSet", TileSetComponent::fresh)?;
        tile_set.initialize(templates, ctx)?;

        let cells = (self.tiles_wide * self.tiles_high) as usize;
        self.layers.clear();
        for (layer_index, ids) in self.layer_ids.iter().enumerate() {
            if ids.len() != cells {
                warn!(
                    map = %self.name,
                    layer = layer_index,
                    expected = cells,
                    got = ids.len(),
                    "layer size does not match map dimensions"
                );
            }
            let mut tiles = Vec::with_capacity(cells);
            for cell in 0..cells {
                let id = ids.get(cell).copied().unwrap_or(-1);
                if id < 0 {
                    tiles.push(None);
                    continue;
                }
                match tile_set.tile(id as usize) {
                    Some(tile) => tiles.push(Some(tile.fresh())),
                    None => {
                        warn!(map = %self.name, id, "tile id outside the tile set");
                        tiles.push(None);
                    }
                }
            }
            self.layers.push(TileMapLayer { tiles });
        }
        self.tile_set = Some(tile_set);
        Ok(())
    }

    fn preloading(&mut self, ctx: &GameContext) -> bool {
        let mut waiting = false;
        for layer in &mut self.layers {
            for tile in layer.tiles.iter_mut().flatten() {
                if tile.preloading(ctx) {
                    waiting = true;
                }
            }
        }
        waiting
    }

    fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        let container = ctx.stage.borrow_mut().create(NodeKind::Container);
        let tile_size = ctx.tuning.tile_size;
        for layer in &mut self.layers {
            for (cell, tile) in layer.tiles.iter_mut().enumerate() {
                let Some(tile) = tile else { continue };
                tile.load(ctx)?;
                if let Some(node) = tile.renderable() {
                    let index = TileIndex::new(
                        cell as i32 % self.tiles_wide as i32,
                        cell as i32 / self.tiles_wide as i32,
                    );
                    let (x, y) = index.to_pixels(tile_size);
                    let mut stage = ctx.stage.borrow_mut();
                    stage.attach(container, node);
                    stage.set_position(node, x, y);
                }
            }
        }
        self.container = Some(container);
        Ok(())
    }

    fn unload(&mut self, ctx: &GameContext) {
        // Tiles release their own nodes before the container goes, so no
        // node is destroyed twice through slot reuse.
        for layer in &mut self.layers {
            for tile in layer.tiles.iter_mut().flatten() {
                tile.unload(ctx);
            }
        }
        if let Some(container) = self.container.take() {
            ctx.stage.borrow_mut().destroy(container);
        }
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn renderable(&self) -> Option<NodeId> {
        self.container
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
