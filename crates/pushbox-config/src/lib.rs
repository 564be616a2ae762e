//! Level configuration parsing and validation for the pushbox engine.
//!
//! Configs arrive as JSON text, are deserialized into the typed structs in
//! [`schema`], then validated as a whole: component names must be unique
//! across every section, and cross-references that can be checked without
//! the engine (a sprite's default animation) are checked here. Everything
//! that fails, fails before the engine sees the config.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

pub mod schema;

use schema::{AnimationConfig, LevelConfig};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while parsing or validating a level config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON text failed to deserialize, including missing required keys.
    #[error("level config failed to parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two component declarations, in any sections, share a name.
    #[error("duplicate component name '{name}'")]
    DuplicateComponentName {
        /// The colliding name.
        name: String,
    },

    /// An animated sprite's `defaultAnimation` names no declared animation.
    #[error("animated sprite '{sprite}' has no animation named '{animation}'")]
    UnknownDefaultAnimation {
        /// The sprite declaring the default.
        sprite: String,
        /// The missing animation name.
        animation: String,
    },
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse and validate a level config from JSON text.
pub fn parse_level(json: &str) -> Result<LevelConfig, ConfigError> {
    let mut config: LevelConfig = serde_json::from_str(json)?;
    validate(&mut config)?;
    debug!(
        components = config.components.names().len(),
        roots = config.scene.objects.len(),
        "level config parsed"
    );
    Ok(config)
}

/// Parse and validate a level config from an already-parsed JSON value.
pub fn parse_level_value(value: serde_json::Value) -> Result<LevelConfig, ConfigError> {
    let mut config: LevelConfig = serde_json::from_value(value)?;
    validate(&mut config)?;
    Ok(config)
}

fn validate(config: &mut LevelConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in config.components.names() {
        if !seen.insert(name.to_owned()) {
            return Err(ConfigError::DuplicateComponentName {
                name: name.to_owned(),
            });
        }
    }

    for sprite in &mut config.components.animated_sprite {
        // A sheet with no declared animations plays all frames in order.
        if sprite.animations.is_empty() {
            let all_frames = AnimationConfig {
                name: "default".to_owned(),
                frame_indices: (0..sprite.total_frames).collect(),
                frame_rate: None,
            };
            sprite.animations.insert("default".to_owned(), all_frames);
            if sprite.default_animation.is_none() {
                sprite.default_animation = Some("default".to_owned());
            }
        }
        if let Some(default) = &sprite.default_animation {
            if !sprite.animations.contains_key(default) {
                return Err(ConfigError::UnknownDefaultAnimation {
                    sprite: sprite.name.clone(),
                    animation: default.clone(),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_across_sections_are_fatal() {
        let json = r#"{
            "components": {
                "sprite": [ { "name": "foo", "asset": "a.png" } ],
                "text": [ { "name": "foo" } ]
            }
        }"#;
        let err = parse_level(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateComponentName { name } if name == "foo"
        ));
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let json = r#"{
            "components": {
                "sprite": [ { "name": "hero", "asset": "hero.png" } ],
                "particles": [ { "name": "smoke" } ]
            },
            "futureSection": true
        }"#;
        let config = parse_level(json).unwrap();
        assert_eq!(config.components.sprite.len(), 1);
    }

    #[test]
    fn default_animation_is_synthesized_for_plain_sheets() {
        let json = r#"{
            "components": {
                "animatedSprite": [ {
                    "name": "coin", "asset": "coin.png",
                    "frameSizeX": 16, "frameSizeY": 16, "totalFrames": 4
                } ]
            }
        }"#;
        let config = parse_level(json).unwrap();
        let sprite = &config.components.animated_sprite[0];
        assert_eq!(sprite.default_animation.as_deref(), Some("default"));
        assert_eq!(
            sprite.animations["default"].frame_indices,
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn dangling_default_animation_is_fatal() {
        let json = r#"{
            "components": {
                "animatedSprite": [ {
                    "name": "coin", "asset": "coin.png",
                    "frameSizeX": 16, "frameSizeY": 16, "totalFrames": 4,
                    "defaultAnimation": "spin",
                    "animations": {
                        "twirl": { "name": "twirl", "frameIndices": [0, 1] }
                    }
                } ]
            }
        }"#;
        let err = parse_level(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDefaultAnimation { sprite, animation }
                if sprite == "coin" && animation == "spin"
        ));
    }

    #[test]
    fn full_level_round_trips() {
        let json = r#"{
            "components": {
                "sprite": [
                    { "name": "playerSprite", "asset": "player.png" },
                    { "name": "crateSprite", "asset": "crate.png" },
                    { "name": "goalSprite", "asset": "goal.png" },
                    { "name": "wallSprite", "asset": "wall.png" },
                    { "name": "floorSprite", "asset": "floor.png" }
                ],
                "tile": [
                    { "name": "floor", "type": "background", "spriteComponent": "floorSprite" },
                    { "name": "wall", "type": "wall", "spriteComponent": "wallSprite" }
                ],
                "tileSet": [ { "name": "dungeon", "tiles": ["floor", "wall"] } ],
                "tileMap": [ {
                    "name": "map", "tileSet": "dungeon",
                    "tilesWide": 3, "tilesHigh": 2,
                    "spawnTileX": 1, "spawnTileY": 1,
                    "layers": [ { "tileIDs": [1, 1, 1, 1, 0, 1] } ]
                } ],
                "sokobanController": [ {
                    "name": "controller",
                    "tileMap": "mapObject", "tileMapComponent": "map",
                    "playerSprite": "playerSprite",
                    "crateSprite": "crateSprite", "goalSprite": "goalSprite",
                    "crates": [ { "x": 1, "y": 1 } ],
                    "goals": [ { "x": 2, "y": 1 } ]
                } ],
                "text": [ { "name": "moveCounter", "text": "Moves: 0" } ]
            },
            "scene": {
                "objects": [
                    { "name": "mapObject", "components": ["map"] },
                    { "name": "game", "components": ["controller"],
                      "children": [ { "name": "hud", "x": 8, "components": ["moveCounter"] } ] }
                ]
            }
        }"#;
        let config = parse_level(json).unwrap();
        let text = serde_json::to_string(&config).unwrap();
        let again = parse_level(&text).unwrap();

        assert_eq!(config.components.sprite, again.components.sprite);
        assert_eq!(config.components.tile, again.components.tile);
        assert_eq!(config.components.tile_map, again.components.tile_map);
        assert_eq!(
            config.components.sokoban_controller,
            again.components.sokoban_controller
        );
        assert_eq!(config.scene, again.scene);
    }
}
