//! Shared services handed to every lifecycle call.
//!
//! There are no globals in the engine. Everything a component might need
//! from the outside world rides in one [`GameContext`] value that the game
//! loop threads through every lifecycle and message call. The context is
//! single-threaded; the stage and asset cache sit behind `RefCell` so that
//! components can borrow them mutably for the duration of one call.

use std::cell::RefCell;
use std::path::PathBuf;

use crate::assets::AssetCache;
use crate::message::MessageBus;
use crate::stage::Stage;

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Engine-wide numeric knobs.
///
/// Injected rather than baked in so tests and alternative tile sets can use
/// their own geometry.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// Side length of one grid tile, in pixels.
    pub tile_size: f32,
    /// Pixels of slide animation per update tick.
    pub move_speed: f32,
    /// Alpha delta per tick of the screen fade ramp.
    pub fade_step: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            move_speed: 4.0,
            fade_step: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// GameContext
// ---------------------------------------------------------------------------

/// Bundle of shared services: bus, stage, assets, tuning.
pub struct GameContext {
    /// The message bus. Owns the subscription table directly; callers go
    /// through `ctx.bus.post(...)`.
    pub bus: MessageBus,
    /// The display tree.
    pub stage: RefCell<Stage>,
    /// The asset cache.
    pub assets: RefCell<AssetCache>,
    /// Numeric knobs.
    pub tuning: Tuning,
}

impl GameContext {
    /// A context whose assets come from files under `asset_base`.
    pub fn new(asset_base: impl Into<PathBuf>, tuning: Tuning) -> Self {
        Self {
            bus: MessageBus::new(),
            stage: RefCell::new(Stage::new()),
            assets: RefCell::new(AssetCache::disk(asset_base)),
            tuning,
        }
    }

    /// A context with a manual asset cache, for driving loads from tests.
    pub fn for_tests(tuning: Tuning) -> Self {
        Self {
            bus: MessageBus::new(),
            stage: RefCell::new(Stage::new()),
            assets: RefCell::new(AssetCache::manual()),
            tuning,
        }
    }
}
