//! Game objects and their lifecycle.
//!
//! A game object is a named node in the scene tree: a display container, a
//! set of components, and child objects. Lifecycle calls run on components
//! first, then recurse into children, in insertion order.
//!
//! The lifecycle drivers are free functions over [`ObjectHandle`] rather
//! than methods. Components routinely reach back to their owning object
//! (movement mutates the owner's position, spawners attach children), so
//! each driver snapshots the component and child lists and releases the
//! object borrow before fanning out.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::component::{ComponentSet, SharedComponent};
use crate::context::GameContext;
use crate::message::MessageHandler;
use crate::stage::{NodeId, NodeKind};
use crate::CoreError;

/// A shared, interiorly-mutable game object.
pub type ObjectHandle = Rc<RefCell<GameObject>>;

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

/// A named node in the scene tree.
pub struct GameObject {
    /// Name, unique among scene roots; child names are uniqued per parent by
    /// convention, not enforcement.
    pub name: String,
    /// Position in the parent's coordinate space, in pixels.
    pub x: f32,
    pub y: f32,
    /// Whether this object's subtree is drawn.
    pub visible: bool,
    components: Vec<SharedComponent>,
    children: Vec<ObjectHandle>,
    container: Option<NodeId>,
}

impl GameObject {
    /// Create an empty, visible object at the origin.
    pub fn new(name: &str) -> ObjectHandle {
        Rc::new(RefCell::new(Self {
            name: name.to_owned(),
            x: 0.0,
            y: 0.0,
            visible: true,
            components: Vec::new(),
            children: Vec::new(),
            container: None,
        }))
    }

    /// The display container created by `load`, if loaded.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Find a component by name.
    pub fn get_component(&self, name: &str) -> Option<SharedComponent> {
        self.components
            .iter()
            .find(|c| c.borrow().name() == name)
            .cloned()
    }

    /// Find a direct child by name.
    pub fn get_child(&self, name: &str) -> Option<ObjectHandle> {
        self.children
            .iter()
            .find(|c| c.borrow().name == name)
            .cloned()
    }

    /// Direct children, in insertion order.
    pub fn children(&self) -> Vec<ObjectHandle> {
        self.children.clone()
    }

    /// Components, in insertion order.
    pub fn components(&self) -> Vec<SharedComponent> {
        self.components.clone()
    }

    fn snapshot(&self) -> (Vec<SharedComponent>, Vec<ObjectHandle>) {
        (self.components.clone(), self.children.clone())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle drivers
// ---------------------------------------------------------------------------

/// Attach a component and give it an owner back-reference. Subscriptions
/// are wired by `load`, so a component only hears the bus while loaded.
pub fn add_component(object: &ObjectHandle, component: SharedComponent, _ctx: &GameContext) {
    component.borrow_mut().set_owner(Rc::downgrade(object));
    object.borrow_mut().components.push(component);
}

/// Attach a child object.
pub fn add_child(object: &ObjectHandle, child: ObjectHandle) {
    object.borrow_mut().children.push(child);
}

/// Remove a direct child by name, returning it if present.
pub fn remove_child(object: &ObjectHandle, name: &str) -> Option<ObjectHandle> {
    let mut obj = object.borrow_mut();
    let pos = obj.children.iter().position(|c| c.borrow().name == name)?;
    Some(obj.children.remove(pos))
}

/// Initialize components, then children.
pub fn initialize(
    object: &ObjectHandle,
    templates: &ComponentSet,
    ctx: &GameContext,
) -> Result<(), CoreError> {
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        component.borrow_mut().initialize(templates, ctx)?;
    }
    for child in &children {
        initialize(child, templates, ctx)?;
    }
    Ok(())
}

/// Poll preloading across the subtree. Returns `true` while anything is
/// still waiting; stops at the first waiter.
pub fn preloading(object: &ObjectHandle, ctx: &GameContext) -> bool {
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        if component.borrow_mut().preloading(ctx) {
            return true;
        }
    }
    for child in &children {
        if preloading(child, ctx) {
            return true;
        }
    }
    false
}

/// Load the subtree: create this object's container, load components,
/// attach their renderables under it and wire their subscriptions, then
/// load and attach children.
pub fn load(object: &ObjectHandle, ctx: &GameContext) -> Result<(), CoreError> {
    let container = ctx.stage.borrow_mut().create(NodeKind::Container);
    {
        let mut obj = object.borrow_mut();
        obj.container = Some(container);
        trace!(name = %obj.name, "object loading");
    }
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        component.borrow_mut().load(ctx)?;
        if let Some(node) = component.borrow().renderable() {
            ctx.stage.borrow_mut().attach(container, node);
        }
        let topics = component.borrow().subscriptions();
        if !topics.is_empty() {
            let handler: Rc<RefCell<dyn MessageHandler>> = component.clone();
            for topic in &topics {
                ctx.bus.subscribe(topic, &handler);
            }
        }
    }
    for child in &children {
        load(child, ctx)?;
        if let Some(child_container) = child.borrow().container() {
            ctx.stage.borrow_mut().attach(container, child_container);
        }
    }
    sync_to_stage(object, ctx);
    Ok(())
}

/// Unload the subtree, dropping component subscriptions and destroying
/// this object's container. The reverse of `load`: an unloaded object can
/// be loaded again.
pub fn unload(object: &ObjectHandle, ctx: &GameContext) {
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        let topics = component.borrow().subscriptions();
        if !topics.is_empty() {
            let handler: Rc<RefCell<dyn MessageHandler>> = component.clone();
            for topic in &topics {
                ctx.bus.unsubscribe(topic, &handler);
            }
        }
        component.borrow_mut().unload(ctx);
    }
    for child in &children {
        unload(child, ctx);
    }
    let container = object.borrow_mut().container.take();
    if let Some(node) = container {
        ctx.stage.borrow_mut().destroy(node);
    }
}

/// Tick the subtree and push transform state to the stage.
pub fn update(object: &ObjectHandle, delta_ms: f32, ctx: &GameContext) {
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        component.borrow_mut().update(delta_ms, ctx);
    }
    for child in &children {
        update(child, delta_ms, ctx);
    }
    sync_to_stage(object, ctx);
}

/// Destroy the subtree: components first, then children, then drop both
/// lists so their `Rc`s (and bus registrations) die.
pub fn destroy(object: &ObjectHandle, ctx: &GameContext) {
    let (components, children) = object.borrow().snapshot();
    for component in &components {
        component.borrow_mut().destroy(ctx);
    }
    for child in &children {
        destroy(child, ctx);
    }
    let mut obj = object.borrow_mut();
    obj.components.clear();
    obj.children.clear();
}

fn sync_to_stage(object: &ObjectHandle, ctx: &GameContext) {
    let obj = object.borrow();
    if let Some(container) = obj.container {
        let mut stage = ctx.stage.borrow_mut();
        stage.set_position(container, obj.x, obj.y);
        stage.set_visible(container, obj.visible);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
