//! Text labels.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use pushbox_config::schema::TextConfig;
use pushbox_core::component::{Component, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::{topics, Message, MessageHandler};
use pushbox_core::stage::{NodeId, NodeKind};
use pushbox_core::CoreError;

// ---------------------------------------------------------------------------
// TextComponent
// ---------------------------------------------------------------------------

/// A label whose content can be replaced over the bus with a
/// `SetText:<name>` message carrying the new string.
pub struct TextComponent {
    name: String,
    content: String,
    node: Option<NodeId>,
}

impl TextComponent {
    /// Build a template from config.
    pub fn from_config(config: &TextConfig) -> Self {
        Self {
            name: config.name.clone(),
            content: config.text.clone().unwrap_or_default(),
            node: None,
        }
    }

    /// A copy carrying the initial content but no node.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            content: self.content.clone(),
            node: None,
        }
    }

    /// The current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content, updating the display node when loaded.
    pub fn set_content(&mut self, content: &str, ctx: &GameContext) {
        self.content = content.to_owned();
        if let Some(node) = self.node {
            ctx.stage.borrow_mut().set_text(node, content);
        }
    }
}

impl MessageHandler for TextComponent {
    fn on_message(&mut self, message: &Message, ctx: &GameContext) {
        if message.name != topics::set_text(&self.name) {
            return;
        }
        match &message.context {
            Value::String(content) => {
                let content = content.clone();
                self.set_content(&content, ctx);
            }
            _ => warn!(text = %self.name, "SetText without a string payload"),
        }
    }
}

impl Component for TextComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        let node = ctx.stage.borrow_mut().create(NodeKind::Text {
            content: self.content.clone(),
        });
        self.node = Some(node);
        Ok(())
    }

    fn unload(&mut self, ctx: &GameContext) {
        if let Some(node) = self.node.take() {
            ctx.stage.borrow_mut().destroy(node);
        }
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn renderable(&self) -> Option<NodeId> {
        self.node
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![topics::set_text(&self.name)]
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
