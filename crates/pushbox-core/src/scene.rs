//! Scenes: named collections of root game objects.
//!
//! A scene owns the root objects of one level plus a display container that
//! the objects' containers hang off. Activating a scene attaches that
//! container under the stage root; deactivating detaches it. Deactivated
//! scenes stay loaded and keep receiving update ticks, so off-screen levels
//! keep their state warm and re-activation is instant.

use std::collections::HashMap;

use tracing::debug;

use crate::component::ComponentSet;
use crate::context::GameContext;
use crate::object::{self, ObjectHandle};
use crate::stage::{NodeId, NodeKind};
use crate::CoreError;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A named set of root objects, ordered by insertion.
pub struct Scene {
    /// Scene name, used in error reporting.
    pub name: String,
    objects: Vec<ObjectHandle>,
    by_name: HashMap<String, usize>,
    container: Option<NodeId>,
    active: bool,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            objects: Vec::new(),
            by_name: HashMap::new(),
            container: None,
            active: false,
        }
    }

    /// Add a root object. Root names must be unique within the scene.
    pub fn add_object(&mut self, object: ObjectHandle) -> Result<(), CoreError> {
        let name = object.borrow().name.clone();
        if self.by_name.contains_key(&name) {
            return Err(CoreError::DuplicateObjectName {
                scene: self.name.clone(),
                name,
            });
        }
        self.by_name.insert(name, self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    /// Find a root object by name.
    pub fn object(&self, name: &str) -> Option<ObjectHandle> {
        self.by_name.get(name).map(|&i| self.objects[i].clone())
    }

    /// Root objects, in insertion order.
    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    /// Whether the scene's container is attached under the stage root.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The scene's display container, if loaded.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Initialize every root object.
    pub fn initialize(&self, templates: &ComponentSet, ctx: &GameContext) -> Result<(), CoreError> {
        for obj in &self.objects {
            object::initialize(obj, templates, ctx)?;
        }
        Ok(())
    }

    /// Poll preloading across every root object.
    pub fn preloading(&self, ctx: &GameContext) -> bool {
        self.objects.iter().any(|obj| object::preloading(obj, ctx))
    }

    /// Load every root object and gather their containers under the scene's.
    pub fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        let container = ctx.stage.borrow_mut().create(NodeKind::Container);
        self.container = Some(container);
        for obj in &self.objects {
            object::load(obj, ctx)?;
            if let Some(obj_container) = obj.borrow().container() {
                ctx.stage.borrow_mut().attach(container, obj_container);
            }
        }
        Ok(())
    }

    /// Unload every root object and destroy the scene container.
    pub fn unload(&mut self, ctx: &GameContext) {
        for obj in &self.objects {
            object::unload(obj, ctx);
        }
        if let Some(container) = self.container.take() {
            ctx.stage.borrow_mut().destroy(container);
        }
        self.active = false;
    }

    /// Attach the scene container under the stage root.
    pub fn activate(&mut self, ctx: &GameContext) {
        if let Some(container) = self.container {
            let mut stage = ctx.stage.borrow_mut();
            let root = stage.root();
            stage.attach(root, container);
            self.active = true;
            debug!(scene = %self.name, "scene activated");
        }
    }

    /// Detach the scene container from the stage root. Objects stay loaded.
    pub fn deactivate(&mut self, ctx: &GameContext) {
        if let Some(container) = self.container {
            ctx.stage.borrow_mut().detach(container);
        }
        self.active = false;
        debug!(scene = %self.name, "scene deactivated");
    }

    /// Tick every root object. Runs whether or not the scene is active.
    pub fn update(&self, delta_ms: f32, ctx: &GameContext) {
        for obj in &self.objects {
            object::update(obj, delta_ms, ctx);
        }
    }

    /// Destroy every root object.
    pub fn destroy(&mut self, ctx: &GameContext) {
        for obj in &self.objects {
            object::destroy(obj, ctx);
        }
        self.objects.clear();
        self.by_name.clear();
    }

    /// Run the post-activation hook on every component in the scene, in
    /// object then component order.
    pub fn notify_ready(&self, templates: &ComponentSet, ctx: &GameContext) -> Result<(), CoreError> {
        for obj in &self.objects {
            self.notify_object(obj, templates, ctx)?;
        }
        Ok(())
    }

    fn notify_object(
        &self,
        obj: &ObjectHandle,
        templates: &ComponentSet,
        ctx: &GameContext,
    ) -> Result<(), CoreError> {
        let components = obj.borrow().components();
        let children = obj.borrow().children();
        for component in &components {
            component.borrow_mut().on_level_ready(self, templates, ctx)?;
        }
        for child in &children {
            self.notify_object(child, templates, ctx)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
