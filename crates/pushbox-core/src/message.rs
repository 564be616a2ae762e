//! Synchronous publish/subscribe message bus.
//!
//! The bus is the wire between the core and its external collaborators (UI
//! screens, keyboard capture, the game loop). Delivery is synchronous and
//! happens on the calling frame: [`MessageBus::post`] invokes every handler
//! registered for the message name, in registration order, before returning.
//! There is no batching and no deferral.
//!
//! Handlers are held as weak references; a handler whose owner has been
//! dropped is pruned lazily on the next delivery to its topic. Subscribing
//! the same handler to the same topic twice produces duplicate delivery --
//! registrations are not deduplicated.
//!
//! Delivery snapshots the subscriber list before invoking anything, so a
//! handler may subscribe or post further messages mid-delivery. A handler
//! must *not* assume it can observe its own unsubscription mid-delivery;
//! the snapshot makes that a no-op for the in-flight message.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::warn;

use crate::context::GameContext;

// ---------------------------------------------------------------------------
// Well-known topics
// ---------------------------------------------------------------------------

/// Message names that form the contract surface between the core and its
/// UI/input collaborators. These strings must stay bit-exact.
pub mod topics {
    /// Posted once a level has been activated and its spawn hooks have run.
    /// Context: the level name.
    pub const LEVEL_READY: &str = "LEVEL_READY";
    /// Posted exactly once when every crate sits on a goal.
    pub const LEVEL_CLEARED: &str = "LEVEL_CLEARED";
    /// Posted after each accepted player move. Context: the move count.
    pub const PLAYER_MOVED: &str = "PLAYER_MOVED";
    /// Requests a switch to another level. Context: the level index.
    pub const CHANGE_LEVEL: &str = "CHANGE_LEVEL";
    /// Requests a reload of the current level.
    pub const RESTART_LEVEL: &str = "RESTART_LEVEL";
    /// Requests the first level (sent from the main menu).
    pub const START_GAME: &str = "START_GAME";
    /// Requests a return to the main menu.
    pub const GO_MAIN_MENU: &str = "GO_MAIN_MENU";
    /// Sent when the player dismisses the level summary.
    pub const SUMMARY_CONTINUE: &str = "SUMMARY_CONTINUE";
    /// Posted when the screen fade-in ramp starts.
    pub const FADE_IN: &str = "FADE_IN";
    /// Posted when the screen fade-out ramp starts.
    pub const FADE_OUT: &str = "FADE_OUT";
    /// Directional player input.
    pub const PLAYER_MOVE_LEFT: &str = "Player:moveLeft";
    /// Directional player input.
    pub const PLAYER_MOVE_RIGHT: &str = "Player:moveRight";
    /// Directional player input.
    pub const PLAYER_MOVE_UP: &str = "Player:moveUp";
    /// Directional player input.
    pub const PLAYER_MOVE_DOWN: &str = "Player:moveDown";

    /// Topic for a raw key event. Context: a key-down/up flag.
    pub fn key(key_name: &str) -> String {
        format!("Key:{key_name}")
    }

    /// Topic that replaces the text of a named text component.
    pub fn set_text(component_name: &str) -> String {
        format!("SetText:{component_name}")
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A named message with an opaque JSON payload.
///
/// Messages are immutable once constructed; they are created and consumed
/// synchronously and never retained by the bus.
#[derive(Debug, Clone)]
pub struct Message {
    /// The topic this message is posted to.
    pub name: String,
    /// A tag identifying the sender, for logging and debugging.
    pub sender: String,
    /// Opaque payload. `Value::Null` when the topic carries no data.
    pub context: Value,
}

impl Message {
    /// Create a message with no payload.
    pub fn new(name: &str, sender: &str) -> Self {
        Self {
            name: name.to_owned(),
            sender: sender.to_owned(),
            context: Value::Null,
        }
    }

    /// Create a message carrying a payload.
    pub fn with_context(name: &str, sender: &str, context: Value) -> Self {
        Self {
            name: name.to_owned(),
            sender: sender.to_owned(),
            context,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageHandler
// ---------------------------------------------------------------------------

/// Receives messages from the bus.
///
/// The default implementation ignores everything, so types that only
/// occasionally care about messages can leave the method out.
pub trait MessageHandler {
    /// Called synchronously for each message on a subscribed topic.
    fn on_message(&mut self, _message: &Message, _ctx: &GameContext) {}
}

/// A shared, interiorly-mutable handler registration.
pub type SharedHandler = Rc<RefCell<dyn MessageHandler>>;

// ---------------------------------------------------------------------------
// MessageBus
// ---------------------------------------------------------------------------

/// The process-wide subscription table.
///
/// Lives inside the [`GameContext`] for the whole process lifetime; there is
/// no teardown. Single-threaded by design -- the table uses interior
/// mutability so that components can subscribe during their own lifecycle
/// calls.
#[derive(Default)]
pub struct MessageBus {
    subscriptions: RefCell<HashMap<String, Vec<Weak<RefCell<dyn MessageHandler>>>>>,
}

impl MessageBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.
    ///
    /// Registrations are not deduplicated: subscribing twice means the
    /// handler is invoked twice per message.
    pub fn subscribe(&self, topic: &str, handler: &SharedHandler) {
        self.subscriptions
            .borrow_mut()
            .entry(topic.to_owned())
            .or_default()
            .push(Rc::downgrade(handler));
    }

    /// Remove the first registration of `handler` for `topic`.
    ///
    /// Unsubscribing a pair that is not registered is a soft warning, not an
    /// error.
    pub fn unsubscribe(&self, topic: &str, handler: &SharedHandler) {
        let mut table = self.subscriptions.borrow_mut();
        if let Some(list) = table.get_mut(topic) {
            let target = Rc::downgrade(handler);
            if let Some(pos) = list.iter().position(|w| w.ptr_eq(&target)) {
                list.remove(pos);
                return;
            }
        }
        warn!(topic, "unsubscribe: handler was not registered for topic");
    }

    /// Deliver `message` to every current subscriber of its topic, in
    /// registration order, on the calling frame.
    ///
    /// Posting to a topic with zero live subscribers logs a warning and
    /// returns normally.
    pub fn post(&self, message: &Message, ctx: &GameContext) {
        let handlers = self.snapshot(&message.name);
        if handlers.is_empty() {
            warn!(topic = %message.name, "nothing is subscribed to message");
            return;
        }
        Self::deliver(&handlers, message, ctx);
    }

    /// Deliver `message` to every handler of every topic, regardless of the
    /// message name. Used rarely, for system-wide resets.
    pub fn broadcast(&self, message: &Message, ctx: &GameContext) {
        let topics: Vec<String> = self.subscriptions.borrow().keys().cloned().collect();
        for topic in topics {
            let handlers = self.snapshot(&topic);
            Self::deliver(&handlers, message, ctx);
        }
    }

    /// The number of live registrations for a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .borrow()
            .get(topic)
            .map(|list| list.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Snapshot the live subscriber list for a topic, pruning dead weaks.
    fn snapshot(&self, topic: &str) -> Vec<SharedHandler> {
        let mut table = self.subscriptions.borrow_mut();
        match table.get_mut(topic) {
            Some(list) => {
                list.retain(|w| w.strong_count() > 0);
                list.iter().filter_map(Weak::upgrade).collect()
            }
            None => Vec::new(),
        }
    }

    fn deliver(handlers: &[SharedHandler], message: &Message, ctx: &GameContext) {
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut h) => h.on_message(message, ctx),
                // Reentrant self-delivery: the handler posted a message on a
                // topic it is itself subscribed to, while still borrowed.
                Err(_) => warn!(
                    topic = %message.name,
                    "skipping handler already borrowed during delivery"
                ),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
