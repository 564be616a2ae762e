//! Core runtime for the pushbox engine.
//!
//! This crate holds the pieces that know nothing about Sokoban: the message
//! bus, the display stage, the asset cache, the component model, and the
//! game object / scene tree. Everything here is single-threaded and
//! allocation-light; shared mutable state lives behind `Rc<RefCell<_>>` and
//! the whole runtime is driven by explicit lifecycle calls from above.
//!
//! Game-specific behavior (tile maps, the puzzle controller, level loading)
//! lives in `pushbox-engine`, built entirely on the traits and types here.

use thiserror::Error;

pub mod assets;
pub mod component;
pub mod context;
pub mod math;
pub mod message;
pub mod object;
pub mod scene;
pub mod stage;

// ---------------------------------------------------------------------------
// CoreError
// ---------------------------------------------------------------------------

/// Errors surfaced by the core runtime.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A component template was referenced by a name nobody registered.
    #[error("no component template named '{name}'")]
    ComponentNotFound {
        /// The missing template name.
        name: String,
    },

    /// A component was found but is not the kind the caller needed.
    #[error("component '{name}' is not a {expected}")]
    ComponentKindMismatch {
        /// The component that was found.
        name: String,
        /// The kind the caller expected.
        expected: &'static str,
    },

    /// Two root objects in one scene share a name.
    #[error("scene '{scene}' already has an object named '{name}'")]
    DuplicateObjectName {
        /// The scene being populated.
        scene: String,
        /// The colliding object name.
        name: String,
    },

    /// A named object was looked up in a scene that does not contain it.
    #[error("scene '{scene}' has no object named '{object}'")]
    ObjectNotFound {
        /// The scene that was searched.
        scene: String,
        /// The missing object name.
        object: String,
    },

    /// A puzzle was configured with unequal crate and goal counts.
    #[error("puzzle has {crates} crates but {goals} goals")]
    CrateGoalMismatch {
        /// Number of crates placed.
        crates: usize,
        /// Number of goal tiles placed.
        goals: usize,
    },
}

/// Commonly used core types.
pub mod prelude {
    pub use crate::assets::AssetCache;
    pub use crate::component::{clone_template, Component, ComponentSet, SharedComponent};
    pub use crate::context::{GameContext, Tuning};
    pub use crate::math::TileIndex;
    pub use crate::message::{topics, Message, MessageBus, MessageHandler, SharedHandler};
    pub use crate::object::{GameObject, ObjectHandle};
    pub use crate::scene::Scene;
    pub use crate::stage::{NodeId, NodeKind, Stage};
    pub use crate::CoreError;
}
