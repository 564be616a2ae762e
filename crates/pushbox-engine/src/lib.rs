//! The pushbox game engine.
//!
//! Builds the Sokoban-specific layer on top of `pushbox-core`: the component
//! catalog (sprites, tiles, tile maps, the puzzle controller), the level
//! pipeline that turns a JSON config into a live scene, and the game loop
//! with its level-switch fade machinery.

use thiserror::Error;

use pushbox_core::CoreError;
use pushbox_config::ConfigError;

pub mod components;
pub mod factory;
pub mod game;
pub mod level;

// ---------------------------------------------------------------------------
// GameError
// ---------------------------------------------------------------------------

/// Errors surfaced by the engine layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// A core runtime error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A configuration parse or validation error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A level's config asset finished loading but produced no usable text.
    #[error("level '{level}' config asset '{asset}' is unreadable")]
    ConfigUnavailable {
        /// The level being loaded.
        level: String,
        /// The asset that failed.
        asset: String,
    },

    /// A lifecycle call arrived while the level was in the wrong state.
    #[error("level '{level}' cannot {operation} while {state}")]
    LevelOutOfOrder {
        /// The level in question.
        level: String,
        /// The attempted operation.
        operation: &'static str,
        /// The state it was in.
        state: &'static str,
    },

    /// A level switch named an index outside the configured level list.
    #[error("no level at index {index} (have {count})")]
    NoSuchLevel {
        /// The requested index.
        index: usize,
        /// How many levels are configured.
        count: usize,
    },
}

/// Commonly used engine types.
pub mod prelude {
    pub use crate::components::sokoban::SokobanController;
    pub use crate::components::tile_map::TileMapComponent;
    pub use crate::factory::build_templates;
    pub use crate::game::{Game, GameState, UiScreen};
    pub use crate::level::{Level, LevelSource, LevelState};
    pub use crate::GameError;
}
