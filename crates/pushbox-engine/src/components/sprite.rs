//! Static sprites.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use pushbox_config::schema::SpriteConfig;
use pushbox_core::component::{Component, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::MessageHandler;
use pushbox_core::stage::{NodeId, NodeKind};
use pushbox_core::CoreError;

// ---------------------------------------------------------------------------
// SpriteBase
// ---------------------------------------------------------------------------

/// The shared asset-plus-node plumbing of every sprite-like component:
/// request the texture during preloading, hold the display node after load.
#[derive(Debug)]
pub(crate) struct SpriteBase {
    asset: String,
    node: Option<NodeId>,
    requested: bool,
}

impl SpriteBase {
    pub(crate) fn new(asset: &str) -> Self {
        Self {
            asset: asset.to_owned(),
            node: None,
            requested: false,
        }
    }

    /// A copy carrying the asset name but no runtime state.
    pub(crate) fn fresh(&self) -> Self {
        Self::new(&self.asset)
    }

    pub(crate) fn asset(&self) -> &str {
        &self.asset
    }

    pub(crate) fn preloading(&mut self, ctx: &GameContext) -> bool {
        if !self.requested {
            ctx.assets.borrow_mut().request(&self.asset);
            self.requested = true;
        }
        !ctx.assets.borrow().is_ready(&self.asset)
    }

    pub(crate) fn load(&mut self, ctx: &GameContext) -> NodeId {
        let node = ctx.stage.borrow_mut().create(NodeKind::Sprite {
            texture: self.asset.clone(),
            frame: 0,
        });
        self.node = Some(node);
        node
    }

    pub(crate) fn unload(&mut self, ctx: &GameContext) {
        if let Some(node) = self.node.take() {
            ctx.stage.borrow_mut().destroy(node);
        }
    }

    pub(crate) fn node(&self) -> Option<NodeId> {
        self.node
    }
}

// ---------------------------------------------------------------------------
// SpriteComponent
// ---------------------------------------------------------------------------

/// Draws one static texture at its owner's position.
#[derive(Debug)]
pub struct SpriteComponent {
    name: String,
    base: SpriteBase,
}

impl SpriteComponent {
    /// Build a template from config.
    pub fn from_config(config: &SpriteConfig) -> Self {
        Self {
            name: config.name.clone(),
            base: SpriteBase::new(&config.asset),
        }
    }

    /// A copy carrying the configuration but no runtime state.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            base: self.base.fresh(),
        }
    }

    /// The asset this sprite draws.
    pub fn asset(&self) -> &str {
        self.base.asset()
    }
}

impl MessageHandler for SpriteComponent {}

impl Component for SpriteComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn preloading(&mut self, ctx: &GameContext) -> bool {
        self.base.preloading(ctx)
    }

    fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        self.base.load(ctx);
        Ok(())
    }

    fn unload(&mut self, ctx: &GameContext) {
        self.base.unload(ctx);
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn renderable(&self) -> Option<NodeId> {
        self.base.node()
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

#[cfg(test)]
mod tests {
    use super::*;
    use pushbox_core::context::Tuning;

    fn config() -> SpriteConfig {
        SpriteConfig {
            name: "hero".into(),
            asset: "hero.png".into(),
        }
    }

    #[test]
    fn preloading_waits_for_the_texture() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut sprite = SpriteComponent::from_config(&config());

        assert!(sprite.preloading(&ctx));
        ctx.assets.borrow_mut().complete("hero.png", vec![0]);
        assert!(!sprite.preloading(&ctx));
    }

    #[test]
    fn load_creates_a_sprite_node() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut sprite = SpriteComponent::from_config(&config());
        sprite.load(&ctx).unwrap();

        let node = sprite.renderable().unwrap();
        assert_eq!(
            ctx.stage.borrow().kind(node),
            Some(NodeKind::Sprite {
                texture: "hero.png".into(),
                frame: 0
            })
        );

        sprite.unload(&ctx);
        assert!(sprite.renderable().is_none());
        assert!(!ctx.stage.borrow().exists(node));
    }

    #[test]
    fn clone_resets_runtime_state() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut sprite = SpriteComponent::from_config(&config());
        sprite.load(&ctx).unwrap();

        let clone = sprite.clone_component();
        let clone = clone.borrow();
        let clone = clone.as_any().downcast_ref::<SpriteComponent>().unwrap();
        assert_eq!(clone.asset(), "hero.png");
        assert!(clone.renderable().is_none());
    }
}
