//! Message-triggered object spawning.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use pushbox_config::schema::SpawnConfig;
use pushbox_core::component::{clone_template, Component, ComponentSet, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::{Message, MessageHandler};
use pushbox_core::object::{self, GameObject, ObjectHandle};
use pushbox_core::CoreError;

// ---------------------------------------------------------------------------
// SpawnComponent
// ---------------------------------------------------------------------------

/// Creates a configured object under its owner each time a trigger message
/// arrives.
///
/// Triggers are queued and applied on the next `update` tick rather than
/// inside message delivery, so a spawn can never mutate the object tree
/// while a lifecycle fan-out is mid-flight over it.
pub struct SpawnComponent {
    name: String,
    trigger: String,
    object_name: String,
    x: f32,
    y: f32,
    component_names: Vec<String>,
    templates: ComponentSet,
    owner: Weak<RefCell<GameObject>>,
    pending: u32,
    spawned: Vec<ObjectHandle>,
}

impl SpawnComponent {
    /// Build a template from config.
    pub fn from_config(config: &SpawnConfig) -> Self {
        Self {
            name: config.name.clone(),
            trigger: config.trigger_message.clone(),
            object_name: config.object_name.clone(),
            x: config.spawn_position_x,
            y: config.spawn_position_y,
            component_names: config.components.clone(),
            templates: ComponentSet::new(),
            owner: Weak::new(),
            pending: 0,
            spawned: Vec::new(),
        }
    }

    /// A copy carrying the configuration but no captured templates, queue or
    /// spawned objects.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            trigger: self.trigger.clone(),
            object_name: self.object_name.clone(),
            x: self.x,
            y: self.y,
            component_names: self.component_names.clone(),
            templates: ComponentSet::new(),
            owner: Weak::new(),
            pending: 0,
            spawned: Vec::new(),
        }
    }

    /// Objects spawned so far, oldest first.
    pub fn spawned(&self) -> &[ObjectHandle] {
        &self.spawned
    }

    fn spawn_one(&mut self, ctx: &GameContext) {
        let Some(owner) = self.owner.upgrade() else {
            warn!(spawner = %self.name, "spawn triggered with no owner");
            return;
        };
        let spawned = GameObject::new(&self.object_name);
        {
            let mut obj = spawned.borrow_mut();
            obj.x = self.x;
            obj.y = self.y;
        }
        for template_name in self.component_names.clone() {
            match clone_template(&self.templates, &template_name) {
                Ok(component) => object::add_component(&spawned, component, ctx),
                Err(err) => {
                    warn!(spawner = %self.name, %err, "spawn skipped a component");
                }
            }
        }
        if let Err(err) = object::initialize(&spawned, &self.templates, ctx) {
            warn!(spawner = %self.name, %err, "spawned object failed to initialize");
            return;
        }
        if let Err(err) = object::load(&spawned, ctx) {
            warn!(spawner = %self.name, %err, "spawned object failed to load");
            return;
        }
        if let Some(owner_container) = owner.borrow().container() {
            if let Some(child_container) = spawned.borrow().container() {
                ctx.stage
                    .borrow_mut()
                    .attach(owner_container, child_container);
            }
        }
        object::add_child(&owner, spawned.clone());
        debug!(spawner = %self.name, object = %self.object_name, "object spawned");
        self.spawned.push(spawned);
    }
}

impl MessageHandler for SpawnComponent {
    fn on_message(&mut self, message: &Message, _ctx: &GameContext) {
        if message.name == self.trigger {
            self.pending += 1;
        }
    }
}

impl Component for SpawnComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, templates: &ComponentSet, _ctx: &GameContext) -> Result<(), CoreError> {
        // Capture private clones of the referenced templates so spawning
        // never depends on the level's template map staying alive.
        for template_name in &self.component_names {
            let clone = clone_template(templates, template_name)?;
            self.templates.insert(template_name.clone(), clone);
        }
        Ok(())
    }

    fn update(&mut self, _delta_ms: f32, ctx: &GameContext) {
        while self.pending > 0 {
            self.pending -= 1;
            self.spawn_one(ctx);
        }
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![self.trigger.clone()]
    }

    fn set_owner(&mut self, owner: Weak<RefCell<GameObject>>) {
        self.owner = owner;
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
