//! Sheet-based animated sprites.
//!
//! An animated sprite owns a set of named animations over one sprite sheet.
//! Playback is driven from `update` by accumulating elapsed milliseconds and
//! stepping through the current animation's frame list. External code
//! controls playback over the bus with `<name>:SetAnimation`,
//! `<name>:PlayAnimation`, `<name>:PauseAnimation` and `<name>:StopAnimation`
//! messages.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use pushbox_config::schema::AnimatedSpriteConfig;
use pushbox_core::component::{Component, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::{Message, MessageHandler};
use pushbox_core::stage::NodeId;
use pushbox_core::CoreError;

use super::sprite::SpriteBase;

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Animation {
    frames: Vec<u32>,
    frame_time_ms: f32,
}

// ---------------------------------------------------------------------------
// AnimatedSpriteComponent
// ---------------------------------------------------------------------------

/// A sprite that cycles through frames of a sheet.
#[derive(Debug)]
pub struct AnimatedSpriteComponent {
    name: String,
    base: SpriteBase,
    animations: HashMap<String, Animation>,
    default_animation: Option<String>,
    auto_start: bool,

    current: Option<String>,
    cursor: usize,
    elapsed_ms: f32,
    playing: bool,
}

impl AnimatedSpriteComponent {
    /// Build a template from config. The config layer has already validated
    /// that `default_animation`, when set, names a real animation.
    pub fn from_config(config: &AnimatedSpriteConfig) -> Self {
        let animations = config
            .animations
            .iter()
            .map(|(key, anim)| {
                let rate = anim.frame_rate.unwrap_or(config.frame_rate);
                (
                    key.clone(),
                    Animation {
                        frames: anim.frame_indices.clone(),
                        frame_time_ms: 1000.0 / rate,
                    },
                )
            })
            .collect();
        Self {
            name: config.name.clone(),
            base: SpriteBase::new(&config.asset),
            animations,
            default_animation: config.default_animation.clone(),
            auto_start: config.auto_start_animation,
            current: None,
            cursor: 0,
            elapsed_ms: 0.0,
            playing: false,
        }
    }

    /// A copy carrying the configuration but no playback state.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            base: self.base.fresh(),
            animations: self.animations.clone(),
            default_animation: self.default_animation.clone(),
            auto_start: self.auto_start,
            current: None,
            cursor: 0,
            elapsed_ms: 0.0,
            playing: false,
        }
    }

    /// Select an animation and rewind it to its first frame.
    pub fn set_animation(&mut self, animation: &str, ctx: &GameContext) {
        if !self.animations.contains_key(animation) {
            warn!(sprite = %self.name, animation, "unknown animation");
            return;
        }
        self.current = Some(animation.to_owned());
        self.cursor = 0;
        self.elapsed_ms = 0.0;
        self.show_current_frame(ctx);
    }

    /// Resume playback of the current animation.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Freeze on the current frame.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Freeze and rewind to the first frame.
    pub fn stop(&mut self, ctx: &GameContext) {
        self.playing = false;
        self.cursor = 0;
        self.elapsed_ms = 0.0;
        self.show_current_frame(ctx);
    }

    /// The sheet frame currently displayed.
    pub fn current_frame(&self) -> u32 {
        self.current
            .as_ref()
            .and_then(|name| self.animations.get(name))
            .and_then(|anim| anim.frames.get(self.cursor))
            .copied()
            .unwrap_or(0)
    }

    fn show_current_frame(&self, ctx: &GameContext) {
        if let Some(node) = self.base.node() {
            ctx.stage.borrow_mut().set_frame(node, self.current_frame());
        }
    }
}

impl MessageHandler for AnimatedSpriteComponent {
    fn on_message(&mut self, message: &Message, ctx: &GameContext) {
        match message.name.strip_prefix(&format!("{}:", self.name)) {
            Some("SetAnimation") => {
                if let Value::String(animation) = &message.context {
                    self.set_animation(animation, ctx);
                } else {
                    warn!(sprite = %self.name, "SetAnimation without an animation name");
                }
            }
            Some("PlayAnimation") => self.play(),
            Some("PauseAnimation") => self.pause(),
            Some("StopAnimation") => self.stop(ctx),
            _ => {}
        }
    }
}

impl Component for AnimatedSpriteComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn preloading(&mut self, ctx: &GameContext) -> bool {
        self.base.preloading(ctx)
    }

    fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        self.base.load(ctx);
        if let Some(default) = self.default_animation.clone() {
            self.set_animation(&default, ctx);
        }
        if self.auto_start {
            self.play();
        }
        Ok(())
    }

    fn unload(&mut self, ctx: &GameContext) {
        self.base.unload(ctx);
        self.playing = false;
        self.current = None;
        self.cursor = 0;
        self.elapsed_ms = 0.0;
    }

    fn update(&mut self, delta_ms: f32, ctx: &GameContext) {
        if !self.playing {
            return;
        }
        let Some(anim) = self.current.as_ref().and_then(|n| self.animations.get(n)) else {
            return;
        };
        if anim.frames.is_empty() {
            return;
        }
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms >= anim.frame_time_ms {
            self.elapsed_ms -= anim.frame_time_ms;
            self.cursor = (self.cursor + 1) % anim.frames.len();
            self.show_current_frame(ctx);
        }
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn renderable(&self) -> Option<NodeId> {
        self.base.node()
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![
            format!("{}:SetAnimation", self.name),
            format!("{}:PlayAnimation", self.name),
            format!("{}:PauseAnimation", self.name),
            format!("{}:StopAnimation", self.name),
        ]
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
