//! Level loading pipeline.
//!
//! A level goes from raw config to a live scene in fixed stages:
//! config fetch (polled) -> `initialize` (templates + object tree) ->
//! asset preload (polled) -> `load` -> `activate`. Calling a stage out of
//! order is a programmer error and fails loudly.

use serde_json::Value;
use tracing::{debug, info};

use pushbox_config::schema::ObjectConfig;
use pushbox_config::{parse_level, parse_level_value, schema::LevelConfig};
use pushbox_core::component::{clone_template, ComponentSet};
use pushbox_core::context::GameContext;
use pushbox_core::message::{topics, Message};
use pushbox_core::object::{self, GameObject, ObjectHandle};
use pushbox_core::scene::Scene;

use crate::factory::build_templates;
use crate::GameError;

// ---------------------------------------------------------------------------
// LevelSource / LevelState
// ---------------------------------------------------------------------------

/// Where a level's config JSON comes from.
#[derive(Clone)]
pub enum LevelSource {
    /// Config embedded in code or already fetched.
    Inline(Value),
    /// Config fetched through the asset cache by path.
    Path(String),
}

/// The stages of the level pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    /// Waiting for the config JSON.
    ConfigPreloading,
    /// Config parsed; templates not yet built.
    Ready,
    /// Templates built and the object tree constructed.
    Initialized,
    /// Scene loaded; can be activated.
    Loaded,
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// One level: a config source, the scene built from it, and the template map
/// shared by everything in that scene.
pub struct Level {
    name: String,
    source: LevelSource,
    state: LevelState,
    config: Option<LevelConfig>,
    templates: ComponentSet,
    scene: Scene,
    requested: bool,
}

impl Level {
    /// Create a level that has not fetched its config yet.
    pub fn new(name: &str, source: LevelSource) -> Self {
        Self {
            name: name.to_owned(),
            source,
            state: LevelState::ConfigPreloading,
            config: None,
            templates: ComponentSet::new(),
            scene: Scene::new(name),
            requested: false,
        }
    }

    /// The level's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current pipeline stage.
    pub fn state(&self) -> LevelState {
        self.state
    }

    /// The level's scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            LevelState::ConfigPreloading => "fetching config",
            LevelState::Ready => "ready",
            LevelState::Initialized => "initialized",
            LevelState::Loaded => "loaded",
        }
    }

    /// Poll the config fetch. Returns `true` once the config is parsed;
    /// repeat calls after that are no-ops.
    pub fn poll_config(&mut self, ctx: &GameContext) -> Result<bool, GameError> {
        if self.state != LevelState::ConfigPreloading {
            return Ok(true);
        }
        let config = match &self.source {
            LevelSource::Inline(value) => parse_level_value(value.clone())?,
            LevelSource::Path(path) => {
                if !self.requested {
                    ctx.assets.borrow_mut().request(path);
                    self.requested = true;
                }
                let assets = ctx.assets.borrow();
                if !assets.is_ready(path) {
                    return Ok(false);
                }
                let text = assets.text(path).ok_or_else(|| GameError::ConfigUnavailable {
                    level: self.name.clone(),
                    asset: path.clone(),
                })?;
                parse_level(text)?
            }
        };
        debug!(level = %self.name, "level config ready");
        self.config = Some(config);
        self.state = LevelState::Ready;
        Ok(true)
    }

    /// Build templates and the object tree from the fetched config.
    pub fn initialize(&mut self, ctx: &GameContext) -> Result<(), GameError> {
        if self.state != LevelState::Ready {
            return Err(GameError::LevelOutOfOrder {
                level: self.name.clone(),
                operation: "initialize",
                state: self.state_name(),
            });
        }
        // poll_config only sets Ready together with the config.
        let config = self.config.take();
        let Some(config) = config else {
            return Err(GameError::LevelOutOfOrder {
                level: self.name.clone(),
                operation: "initialize",
                state: "ready without config",
            });
        };

        self.templates = build_templates(&config.components)?;
        for object_config in &config.scene.objects {
            let root = build_object(object_config, &self.templates, ctx)?;
            self.scene.add_object(root).map_err(GameError::from)?;
        }
        self.scene.initialize(&self.templates, ctx)?;
        self.config = Some(config);
        self.state = LevelState::Initialized;
        info!(level = %self.name, "level initialized");
        Ok(())
    }

    /// Poll asset preloading across the scene.
    pub fn preloading(&self, ctx: &GameContext) -> bool {
        self.scene.preloading(ctx)
    }

    /// Load the scene. Must follow `initialize`.
    pub fn load(&mut self, ctx: &GameContext) -> Result<(), GameError> {
        if self.state != LevelState::Initialized {
            return Err(GameError::LevelOutOfOrder {
                level: self.name.clone(),
                operation: "load",
                state: self.state_name(),
            });
        }
        self.scene.load(ctx)?;
        self.state = LevelState::Loaded;
        Ok(())
    }

    /// Activate the scene, run spawn hooks, and announce readiness.
    pub fn activate(&mut self, ctx: &GameContext) -> Result<(), GameError> {
        if self.state != LevelState::Loaded {
            return Err(GameError::LevelOutOfOrder {
                level: self.name.clone(),
                operation: "activate",
                state: self.state_name(),
            });
        }
        self.scene.activate(ctx);
        self.scene.notify_ready(&self.templates, ctx)?;
        ctx.bus.post(
            &Message::with_context(
                topics::LEVEL_READY,
                &self.name,
                Value::String(self.name.clone()),
            ),
            ctx,
        );
        info!(level = %self.name, "level active");
        Ok(())
    }

    /// Detach the scene from the stage without unloading it.
    pub fn deactivate(&mut self, ctx: &GameContext) {
        self.scene.deactivate(ctx);
    }

    /// Tick the scene.
    pub fn update(&self, delta_ms: f32, ctx: &GameContext) {
        self.scene.update(delta_ms, ctx);
    }

    /// Unload the scene, reversing `load`. Subscriptions and display nodes
    /// are released, but the object tree survives and the level can be
    /// loaded again.
    pub fn unload(&mut self, ctx: &GameContext) {
        if self.state != LevelState::Loaded {
            return;
        }
        self.scene.unload(ctx);
        self.state = LevelState::Initialized;
        debug!(level = %self.name, "level unloaded");
    }

    /// Terminal teardown: unload the scene and destroy its object tree.
    pub fn destroy(&mut self, ctx: &GameContext) {
        if self.state == LevelState::Loaded {
            self.scene.unload(ctx);
            self.state = LevelState::Initialized;
        }
        self.scene.destroy(ctx);
    }
}

fn build_object(
    config: &ObjectConfig,
    templates: &ComponentSet,
    ctx: &GameContext,
) -> Result<ObjectHandle, GameError> {
    let handle = GameObject::new(&config.name);
    {
        let mut obj = handle.borrow_mut();
        obj.x = config.x;
        obj.y = config.y;
        obj.visible = config.visible;
    }
    for template_name in &config.components {
        let component = clone_template(templates, template_name)?;
        object::add_component(&handle, component, ctx);
    }
    for child_config in &config.children {
        let child = build_object(child_config, templates, ctx)?;
        object::add_child(&handle, child);
    }
    Ok(handle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pushbox_core::context::Tuning;
    use pushbox_core::message::MessageHandler;
    use pushbox_core::CoreError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn simple_config() -> Value {
        json!({
            "components": {
                "sprite": [ { "name": "heroSprite", "asset": "hero.png" } ],
                "text": [ { "name": "hud", "text": "ready" } ]
            },
            "scene": {
                "objects": [
                    { "name": "hero", "x": 10.0, "components": ["heroSprite"],
                      "children": [ { "name": "label", "components": ["hud"] } ] }
                ]
            }
        })
    }

    fn ctx() -> GameContext {
        GameContext::for_tests(Tuning::default())
    }

    #[test]
    fn inline_config_is_ready_on_first_poll() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        assert_eq!(level.state(), LevelState::ConfigPreloading);
        assert!(level.poll_config(&ctx).unwrap());
        assert_eq!(level.state(), LevelState::Ready);
    }

    #[test]
    fn path_config_waits_for_the_asset() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Path("levels/1.json".into()));

        assert!(!level.poll_config(&ctx).unwrap());
        ctx.assets
            .borrow_mut()
            .complete_text("levels/1.json", &simple_config().to_string());
        assert!(level.poll_config(&ctx).unwrap());
        assert_eq!(level.state(), LevelState::Ready);
    }

    #[test]
    fn failed_config_asset_is_fatal() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Path("levels/1.json".into()));
        level.poll_config(&ctx).unwrap();
        ctx.assets.borrow_mut().fail("levels/1.json");

        let err = level.poll_config(&ctx).unwrap_err();
        assert!(matches!(err, GameError::ConfigUnavailable { .. }));
    }

    #[test]
    fn initialize_builds_the_object_tree() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();
        level.initialize(&ctx).unwrap();

        let hero = level.scene().object("hero").unwrap();
        assert_eq!(hero.borrow().x, 10.0);
        assert!(hero.borrow().get_component("heroSprite").is_some());
        // Children hang off their parent, not the scene.
        assert!(level.scene().object("label").is_none());
        assert!(hero.borrow().get_child("label").is_some());
    }

    #[test]
    fn unresolved_component_reference_is_fatal() {
        let ctx = ctx();
        let config = json!({
            "components": {},
            "scene": { "objects": [ { "name": "hero", "components": ["ghost"] } ] }
        });
        let mut level = Level::new("level1", LevelSource::Inline(config));
        level.poll_config(&ctx).unwrap();

        let err = level.initialize(&ctx).unwrap_err();
        assert!(matches!(
            err,
            GameError::Core(CoreError::ComponentNotFound { name }) if name == "ghost"
        ));
    }

    #[test]
    fn load_before_initialize_is_fatal() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();

        let err = level.load(&ctx).unwrap_err();
        assert!(matches!(
            err,
            GameError::LevelOutOfOrder { operation: "load", .. }
        ));
    }

    struct ReadyListener {
        payloads: Vec<Value>,
    }

    impl MessageHandler for ReadyListener {
        fn on_message(&mut self, message: &Message, _ctx: &GameContext) {
            self.payloads.push(message.context.clone());
        }
    }

    #[test]
    fn activation_announces_level_ready() {
        let ctx = ctx();
        let listener = Rc::new(RefCell::new(ReadyListener {
            payloads: Vec::new(),
        }));
        let handler: Rc<RefCell<dyn MessageHandler>> = listener.clone();
        ctx.bus.subscribe(topics::LEVEL_READY, &handler);

        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();
        level.initialize(&ctx).unwrap();
        assert!(level.preloading(&ctx));
        ctx.assets.borrow_mut().complete("hero.png", vec![0]);
        assert!(!level.preloading(&ctx));
        level.load(&ctx).unwrap();
        level.activate(&ctx).unwrap();

        assert!(level.scene().is_active());
        assert_eq!(
            listener.borrow().payloads,
            vec![Value::String("level1".into())]
        );
    }

    #[test]
    fn unload_then_reload_round_trips() {
        let ctx = ctx();
        ctx.assets.borrow_mut().complete("hero.png", vec![0]);
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();
        level.initialize(&ctx).unwrap();
        level.load(&ctx).unwrap();
        level.activate(&ctx).unwrap();

        level.unload(&ctx);
        assert_eq!(level.state(), LevelState::Initialized);
        assert!(!level.scene().is_active());
        // The object tree survives an unload.
        assert!(level.scene().object("hero").is_some());

        level.load(&ctx).unwrap();
        level.activate(&ctx).unwrap();
        assert_eq!(level.state(), LevelState::Loaded);
        assert!(level.scene().is_active());
    }

    #[test]
    fn destroy_clears_the_object_tree() {
        let ctx = ctx();
        ctx.assets.borrow_mut().complete("hero.png", vec![0]);
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();
        level.initialize(&ctx).unwrap();
        level.load(&ctx).unwrap();

        level.destroy(&ctx);
        assert!(level.scene().object("hero").is_none());
        assert!(level.scene().objects().is_empty());
    }

    #[test]
    fn preloading_gates_on_scene_assets() {
        let ctx = ctx();
        let mut level = Level::new("level1", LevelSource::Inline(simple_config()));
        level.poll_config(&ctx).unwrap();
        level.initialize(&ctx).unwrap();

        assert!(level.preloading(&ctx));
        ctx.assets.borrow_mut().complete("hero.png", vec![0]);
        assert!(!level.preloading(&ctx));
    }
}
