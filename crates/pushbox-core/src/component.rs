//! The component trait and template set.
//!
//! Game objects carry behavior as named components. Components are built in
//! two steps: *templates* are constructed from config once per level, then
//! each placement clones a fresh instance from its template. Cloning copies
//! configuration, never runtime state (nodes, counters, subscriptions).
//!
//! Every component is also a [`MessageHandler`]; the topics it names in
//! [`Component::subscriptions`] are wired to the bus while its owning
//! object is loaded and dropped again on unload.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::context::GameContext;
use crate::message::MessageHandler;
use crate::object::GameObject;
use crate::scene::Scene;
use crate::stage::NodeId;
use crate::CoreError;

/// A shared, interiorly-mutable component.
pub type SharedComponent = Rc<RefCell<dyn Component>>;

/// Component templates keyed by component name.
pub type ComponentSet = HashMap<String, SharedComponent>;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A unit of behavior attached to a game object.
///
/// Lifecycle order, driven by the owning object:
/// `initialize` -> `preloading` (polled) -> `load` -> `update` (per tick)
/// -> `unload` / `destroy`.
pub trait Component: MessageHandler {
    /// The component's unique name within its owning object.
    fn name(&self) -> &str;

    /// Resolve references to other templates and finish construction.
    ///
    /// `templates` holds every component template of the current level, so
    /// composite components can clone their parts from it.
    fn initialize(&mut self, _templates: &ComponentSet, _ctx: &GameContext) -> Result<(), CoreError> {
        Ok(())
    }

    /// Request assets; return `true` while still waiting on one.
    fn preloading(&mut self, _ctx: &GameContext) -> bool {
        false
    }

    /// Create display nodes and any other per-run resources.
    fn load(&mut self, _ctx: &GameContext) -> Result<(), CoreError> {
        Ok(())
    }

    /// Release what `load` created.
    fn unload(&mut self, _ctx: &GameContext) {}

    /// Advance by `delta_ms` milliseconds.
    fn update(&mut self, _delta_ms: f32, _ctx: &GameContext) {}

    /// Final teardown; the component will not be used again.
    fn destroy(&mut self, _ctx: &GameContext) {}

    /// Clone a fresh instance carrying this component's configuration but
    /// none of its runtime state.
    fn clone_component(&self) -> SharedComponent;

    /// The display node this component wants attached under its owner's
    /// container, if it renders anything.
    fn renderable(&self) -> Option<NodeId> {
        None
    }

    /// Topics this component wants delivered to it.
    fn subscriptions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Give the component a back-reference to the object it sits on.
    fn set_owner(&mut self, _owner: Weak<RefCell<GameObject>>) {}

    /// Hook run after the owning scene is fully loaded and activated, before
    /// `LEVEL_READY` is posted. This is where components that populate the
    /// scene (spawners, controllers) do their work.
    fn on_level_ready(
        &mut self,
        _scene: &Scene,
        _templates: &ComponentSet,
        _ctx: &GameContext,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .finish()
    }
}

/// Clone a fresh component from the template set by name.
pub fn clone_template(templates: &ComponentSet, name: &str) -> Result<SharedComponent, CoreError> {
    templates
        .get(name)
        .map(|t| t.borrow().clone_component())
        .ok_or_else(|| CoreError::ComponentNotFound {
            name: name.to_owned(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
