//! Typed level configuration.
//!
//! The on-disk format is JSON with camelCase keys. Every section is parsed
//! eagerly into the structs here; nothing downstream ever touches untyped
//! JSON maps. Unrecognized top-level sections are ignored so that newer
//! configs keep loading on older engines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// A full level file: component declarations plus the object tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    /// Component declarations, one section per kind.
    #[serde(default)]
    pub components: ComponentSections,
    /// The scene's object tree.
    #[serde(default)]
    pub scene: SceneConfig,
}

/// One list of declarations per recognized component kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSections {
    #[serde(default)]
    pub sprite: Vec<SpriteConfig>,
    #[serde(default)]
    pub animated_sprite: Vec<AnimatedSpriteConfig>,
    #[serde(default, rename = "move")]
    pub movement: Vec<MoveConfig>,
    #[serde(default)]
    pub text: Vec<TextConfig>,
    #[serde(default)]
    pub spawn: Vec<SpawnConfig>,
    #[serde(default)]
    pub tile: Vec<TileConfig>,
    #[serde(default)]
    pub tile_set: Vec<TileSetConfig>,
    #[serde(default)]
    pub tile_map: Vec<TileMapConfig>,
    #[serde(default)]
    pub sokoban_controller: Vec<SokobanControllerConfig>,
}

impl ComponentSections {
    /// Every declared component name, across all sections, in section order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.sprite.iter().map(|c| c.name.as_str()));
        names.extend(self.animated_sprite.iter().map(|c| c.name.as_str()));
        names.extend(self.movement.iter().map(|c| c.name.as_str()));
        names.extend(self.text.iter().map(|c| c.name.as_str()));
        names.extend(self.spawn.iter().map(|c| c.name.as_str()));
        names.extend(self.tile.iter().map(|c| c.name.as_str()));
        names.extend(self.tile_set.iter().map(|c| c.name.as_str()));
        names.extend(self.tile_map.iter().map(|c| c.name.as_str()));
        names.extend(self.sokoban_controller.iter().map(|c| c.name.as_str()));
        names
    }
}

// ---------------------------------------------------------------------------
// Component sections
// ---------------------------------------------------------------------------

/// A static sprite showing one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    pub name: String,
    /// Asset path the texture comes from.
    pub asset: String,
}

/// A sheet-based sprite with named animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedSpriteConfig {
    pub name: String,
    pub asset: String,
    /// Frame width in pixels.
    pub frame_size_x: u32,
    /// Frame height in pixels.
    pub frame_size_y: u32,
    /// Total frames in the sheet.
    pub total_frames: u32,
    /// Start playing as soon as the sprite loads.
    #[serde(default)]
    pub auto_start_animation: bool,
    /// Frames per second when no animation overrides it.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    /// Name of the animation selected at load.
    #[serde(default)]
    pub default_animation: Option<String>,
    /// Named animations over subsets of the sheet.
    #[serde(default)]
    pub animations: HashMap<String, AnimationConfig>,
}

fn default_frame_rate() -> f32 {
    10.0
}

/// One named animation: an ordered frame list and an optional rate override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    pub name: String,
    /// Sheet frame indices, played in order.
    pub frame_indices: Vec<u32>,
    /// Frames per second; falls back to the sprite's rate when absent.
    #[serde(default)]
    pub frame_rate: Option<f32>,
}

/// Moves its owner by a fixed amount when a message arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveConfig {
    pub name: String,
    /// Message bindings; one object can react to several topics.
    pub messages: Vec<MoveBinding>,
}

/// One topic-to-displacement binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBinding {
    /// Topic that triggers the move.
    pub name: String,
    /// Which coordinate to displace.
    pub axis: Axis,
    /// Displacement in pixels, signed.
    pub amount: f32,
}

/// A pixel axis. Accepts either case on input; serializes lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "x", alias = "X")]
    X,
    #[serde(rename = "y", alias = "Y")]
    Y,
}

/// A text label, mutable at runtime via `SetText:<name>` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConfig {
    pub name: String,
    /// Initial content; empty when absent.
    #[serde(default)]
    pub text: Option<String>,
}

/// Spawns a configured object when a trigger message arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnConfig {
    pub name: String,
    /// Topic that triggers the spawn.
    pub trigger_message: String,
    /// Name given to the spawned object.
    pub object_name: String,
    pub spawn_position_x: f32,
    pub spawn_position_y: f32,
    /// Template names cloned onto the spawned object.
    pub components: Vec<String>,
}

/// What a tile means to collision and game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    Background,
    Wall,
    Movable,
    Enemy,
    Pickup,
    Goal,
}

/// A single tile: a kind plus the sprite that draws it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Name of the sprite component template to clone for this tile.
    pub sprite_component: String,
}

/// An ordered palette of tiles, indexed by tile map layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSetConfig {
    pub name: String,
    /// Tile component template names, in palette order.
    pub tiles: Vec<String>,
}

/// A grid of tile-set indices, possibly layered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMapConfig {
    pub name: String,
    /// The tile set template this map indexes into.
    pub tile_set: String,
    pub tiles_wide: u32,
    pub tiles_high: u32,
    /// Tile the player starts on.
    pub spawn_tile_x: i32,
    pub spawn_tile_y: i32,
    /// Bottom-to-top draw order.
    pub layers: Vec<TileMapLayerConfig>,
}

/// One layer: a row-major list of tile-set indices, `-1` for empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMapLayerConfig {
    #[serde(rename = "tileIDs")]
    pub tile_ids: Vec<i32>,
}

/// A crate or goal placement, in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub x: i32,
    pub y: i32,
}

/// The puzzle brain: player, crates, goals, win detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SokobanControllerConfig {
    pub name: String,
    /// Scene object carrying the tile map.
    pub tile_map: String,
    /// Name of the tile map component on that object.
    pub tile_map_component: String,
    /// Sprite template for the player.
    pub player_sprite: String,
    /// Sprite template cloned per crate.
    pub crate_sprite: String,
    /// Sprite template cloned per goal marker.
    pub goal_sprite: String,
    pub crates: Vec<TilePlacement>,
    pub goals: Vec<TilePlacement>,
}

// ---------------------------------------------------------------------------
// Scene section
// ---------------------------------------------------------------------------

/// The scene's object tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

/// One game object: placement, component references, children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectConfig {
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Component template names cloned onto this object.
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub children: Vec<ObjectConfig>,
}

fn default_visible() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
