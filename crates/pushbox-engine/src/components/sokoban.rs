//! The Sokoban puzzle controller.
//!
//! One controller per level. When the scene comes up it snapshots the tile
//! map's collision grid, spawns the player, crates and goal markers as child
//! objects of its owner, and from then on consumes `Player:move*` messages.
//! Grid state commits the moment a move is accepted; the pixel slide that
//! follows is purely cosmetic.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::json;
use tracing::{debug, info, warn};

use pushbox_config::schema::SokobanControllerConfig;
use pushbox_core::component::{clone_template, Component, ComponentSet, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::math::TileIndex;
use pushbox_core::message::{topics, Message, MessageHandler};
use pushbox_core::object::{self, GameObject, ObjectHandle};
use pushbox_core::scene::Scene;
use pushbox_core::CoreError;

use super::tile_map::{TileMapComponent, WallGrid};
use super::with_concrete;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// CrateEntity
// ---------------------------------------------------------------------------

struct CrateEntity {
    object: ObjectHandle,
    tile: TileIndex,
    on_goal: bool,
}

// ---------------------------------------------------------------------------
// SokobanController
// ---------------------------------------------------------------------------

/// Owns the puzzle state of one level: player tile, crate tiles, goal tiles,
/// the move counter and the cleared flag.
pub struct SokobanController {
    name: String,
    tile_map_object: String,
    tile_map_component: String,
    player_sprite: String,
    crate_sprite: String,
    goal_sprite: String,
    crate_tiles: Vec<TileIndex>,
    goal_tiles: Vec<TileIndex>,

    owner: Weak<RefCell<GameObject>>,
    grid: Option<WallGrid>,
    player: Option<ObjectHandle>,
    player_tile: TileIndex,
    crates: Vec<CrateEntity>,
    direction: Direction,
    moved_px: f32,
    pushing: Option<usize>,
    moves: u32,
    cleared: bool,
}

impl SokobanController {
    /// Build a template from config.
    pub fn from_config(config: &SokobanControllerConfig) -> Self {
        Self {
            name: config.name.clone(),
            tile_map_object: config.tile_map.clone(),
            tile_map_component: config.tile_map_component.clone(),
            player_sprite: config.player_sprite.clone(),
            crate_sprite: config.crate_sprite.clone(),
            goal_sprite: config.goal_sprite.clone(),
            crate_tiles: config
                .crates
                .iter()
                .map(|p| TileIndex::new(p.x, p.y))
                .collect(),
            goal_tiles: config
                .goals
                .iter()
                .map(|p| TileIndex::new(p.x, p.y))
                .collect(),
            owner: Weak::new(),
            grid: None,
            player: None,
            player_tile: TileIndex::default(),
            crates: Vec::new(),
            direction: Direction::None,
            moved_px: 0.0,
            pushing: None,
            moves: 0,
            cleared: false,
        }
    }

    /// A copy carrying the configuration but none of the spawned state.
    pub fn fresh(&self) -> Self {
        Self::from_config(&SokobanControllerConfig {
            name: self.name.clone(),
            tile_map: self.tile_map_object.clone(),
            tile_map_component: self.tile_map_component.clone(),
            player_sprite: self.player_sprite.clone(),
            crate_sprite: self.crate_sprite.clone(),
            goal_sprite: self.goal_sprite.clone(),
            crates: self
                .crate_tiles
                .iter()
                .map(|t| pushbox_config::schema::TilePlacement { x: t.x, y: t.y })
                .collect(),
            goals: self
                .goal_tiles
                .iter()
                .map(|t| pushbox_config::schema::TilePlacement { x: t.x, y: t.y })
                .collect(),
        })
    }

    /// The tile the player currently occupies.
    pub fn player_tile(&self) -> TileIndex {
        self.player_tile
    }

    /// Current crate tiles, in config order.
    pub fn crate_tiles(&self) -> Vec<TileIndex> {
        self.crates.iter().map(|c| c.tile).collect()
    }

    /// Accepted moves so far.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Whether every crate sits on a goal.
    pub fn cleared(&self) -> bool {
        self.cleared
    }

    /// Whether a slide animation is still in flight.
    pub fn sliding(&self) -> bool {
        self.direction != Direction::None
    }

    fn crate_at(&self, tile: TileIndex) -> Option<usize> {
        self.crates.iter().position(|c| c.tile == tile)
    }

    fn spawn_entity(
        &self,
        owner: &ObjectHandle,
        object_name: &str,
        sprite_template: &str,
        tile: TileIndex,
        templates: &ComponentSet,
        ctx: &GameContext,
    ) -> Result<ObjectHandle, CoreError> {
        let entity = GameObject::new(object_name);
        let sprite = clone_template(templates, sprite_template)?;
        object::add_component(&entity, sprite, ctx);
        object::initialize(&entity, templates, ctx)?;
        object::load(&entity, ctx)?;
        {
            let (x, y) = tile.to_pixels(ctx.tuning.tile_size);
            let mut obj = entity.borrow_mut();
            obj.x = x;
            obj.y = y;
        }
        if let Some(owner_container) = owner.borrow().container() {
            if let Some(entity_container) = entity.borrow().container() {
                ctx.stage
                    .borrow_mut()
                    .attach(owner_container, entity_container);
            }
        }
        object::add_child(owner, entity.clone());
        Ok(entity)
    }

    fn try_move(&mut self, direction: Direction, ctx: &GameContext) {
        if self.cleared || self.direction != Direction::None {
            return;
        }
        let Some(grid) = self.grid.clone() else {
            warn!(controller = %self.name, "move before the puzzle spawned");
            return;
        };
        let (dx, dy) = direction.delta();
        let target = self.player_tile.offset(dx, dy);
        if grid.wall_at(target) {
            return;
        }
        if let Some(index) = self.crate_at(target) {
            let two_out = target.offset(dx, dy);
            if grid.wall_at(two_out) || self.crate_at(two_out).is_some() {
                return;
            }
            let on_goal = self.goal_tiles.contains(&two_out);
            let pushed = &mut self.crates[index];
            pushed.tile = two_out;
            pushed.on_goal = on_goal;
            self.pushing = Some(index);
        }

        // Grid state commits now; the slide below only catches pixels up.
        self.player_tile = target;
        self.direction = direction;
        self.moved_px = 0.0;
        self.moves += 1;
        debug!(controller = %self.name, tile = %target, moves = self.moves, "move accepted");
        ctx.bus.post(
            &Message::with_context(topics::PLAYER_MOVED, &self.name, json!(self.moves)),
            ctx,
        );

        if !self.cleared && !self.crates.is_empty() && self.crates.iter().all(|c| c.on_goal) {
            self.cleared = true;
            info!(controller = %self.name, moves = self.moves, "level cleared");
            ctx.bus
                .post(&Message::new(topics::LEVEL_CLEARED, &self.name), ctx);
        }
    }

    fn advance_slide(&mut self, ctx: &GameContext) {
        if self.direction == Direction::None {
            return;
        }
        let tile_size = ctx.tuning.tile_size;
        let step = ctx.tuning.move_speed.min(tile_size - self.moved_px);
        self.moved_px += step;
        let (dx, dy) = self.direction.delta();

        if let Some(player) = &self.player {
            let mut obj = player.borrow_mut();
            obj.x += dx as f32 * step;
            obj.y += dy as f32 * step;
        }
        if let Some(index) = self.pushing {
            let pushed = &self.crates[index];
            let mut obj = pushed.object.borrow_mut();
            obj.x += dx as f32 * step;
            obj.y += dy as f32 * step;
        }

        if self.moved_px >= tile_size {
            // Snap to the committed tiles so float drift never accumulates.
            if let Some(player) = &self.player {
                let (x, y) = self.player_tile.to_pixels(tile_size);
                let mut obj = player.borrow_mut();
                obj.x = x;
                obj.y = y;
            }
            if let Some(index) = self.pushing.take() {
                let pushed = &self.crates[index];
                let (x, y) = pushed.tile.to_pixels(tile_size);
                let mut obj = pushed.object.borrow_mut();
                obj.x = x;
                obj.y = y;
            }
            self.direction = Direction::None;
        }
    }
}

impl MessageHandler for SokobanController {
    fn on_message(&mut self, message: &Message, ctx: &GameContext) {
        let direction = match message.name.as_str() {
            topics::PLAYER_MOVE_LEFT => Direction::Left,
            topics::PLAYER_MOVE_RIGHT => Direction::Right,
            topics::PLAYER_MOVE_UP => Direction::Up,
            topics::PLAYER_MOVE_DOWN => Direction::Down,
            _ => return,
        };
        self.try_move(direction, ctx);
    }
}

impl Component for SokobanController {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, _delta_ms: f32, ctx: &GameContext) {
        self.advance_slide(ctx);
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![
            topics::PLAYER_MOVE_LEFT.to_owned(),
            topics::PLAYER_MOVE_RIGHT.to_owned(),
            topics::PLAYER_MOVE_UP.to_owned(),
            topics::PLAYER_MOVE_DOWN.to_owned(),
        ]
    }

    fn set_owner(&mut self, owner: Weak<RefCell<GameObject>>) {
        self.owner = owner;
    }

    fn on_level_ready(
        &mut self,
        scene: &Scene,
        templates: &ComponentSet,
        ctx: &GameContext,
    ) -> Result<(), CoreError> {
        if self.crate_tiles.len() != self.goal_tiles.len() {
            return Err(CoreError::CrateGoalMismatch {
                crates: self.crate_tiles.len(),
                goals: self.goal_tiles.len(),
            });
        }
        let map_object =
            scene
                .object(&self.tile_map_object)
                .ok_or_else(|| CoreError::ObjectNotFound {
                    scene: scene.name.clone(),
                    object: self.tile_map_object.clone(),
                })?;
        let map_component = map_object
            .borrow()
            .get_component(&self.tile_map_component)
            .ok_or_else(|| CoreError::ComponentNotFound {
                name: self.tile_map_component.clone(),
            })?;
        let grid =
            with_concrete::<TileMapComponent, _>(&map_component, "tileMap", TileMapComponent::grid)?;

        let owner = self.owner.upgrade().ok_or_else(|| CoreError::ObjectNotFound {
            scene: scene.name.clone(),
            object: format!("<owner of {}>", self.name),
        })?;

        // Goals under crates under the player, in draw order.
        for (i, tile) in self.goal_tiles.clone().into_iter().enumerate() {
            self.spawn_entity(
                &owner,
                &format!("goal{i}"),
                &self.goal_sprite.clone(),
                tile,
                templates,
                ctx,
            )?;
        }
        let mut crates = Vec::new();
        for (i, tile) in self.crate_tiles.clone().into_iter().enumerate() {
            let entity = self.spawn_entity(
                &owner,
                &format!("crate{i}"),
                &self.crate_sprite.clone(),
                tile,
                templates,
                ctx,
            )?;
            crates.push(CrateEntity {
                object: entity,
                tile,
                on_goal: self.goal_tiles.contains(&tile),
            });
        }
        let player = self.spawn_entity(
            &owner,
            "player",
            &self.player_sprite.clone(),
            grid.spawn(),
            templates,
            ctx,
        )?;

        self.player_tile = grid.spawn();
        self.player = Some(player);
        self.crates = crates;
        self.grid = Some(grid);
        info!(
            controller = %self.name,
            crates = self.crates.len(),
            spawn = %self.player_tile,
            "puzzle spawned"
        );
        Ok(())
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
