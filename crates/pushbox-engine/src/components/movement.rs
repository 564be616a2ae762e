//! Message-driven displacement.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pushbox_config::schema::{Axis, MoveBinding, MoveConfig};
use pushbox_core::component::{Component, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::{Message, MessageHandler};
use pushbox_core::object::GameObject;

// ---------------------------------------------------------------------------
// MoveComponent
// ---------------------------------------------------------------------------

/// Nudges its owner by a fixed pixel amount whenever a bound topic fires.
/// Useful for menu cursors and other UI driven straight off key messages.
pub struct MoveComponent {
    name: String,
    bindings: Vec<MoveBinding>,
    owner: Weak<RefCell<GameObject>>,
}

impl MoveComponent {
    /// Build a template from config.
    pub fn from_config(config: &MoveConfig) -> Self {
        Self {
            name: config.name.clone(),
            bindings: config.messages.clone(),
            owner: Weak::new(),
        }
    }

    /// A copy carrying the bindings but no owner.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            bindings: self.bindings.clone(),
            owner: Weak::new(),
        }
    }
}

impl MessageHandler for MoveComponent {
    fn on_message(&mut self, message: &Message, _ctx: &GameContext) {
        let Some(owner) = self.owner.upgrade() else {
            return;
        };
        for binding in &self.bindings {
            if binding.name == message.name {
                let mut obj = owner.borrow_mut();
                match binding.axis {
                    Axis::X => obj.x += binding.amount,
                    Axis::Y => obj.y += binding.amount,
                }
            }
        }
    }
}

impl Component for MoveComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn subscriptions(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.name.clone()).collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use pushbox_core::context::Tuning;
    use pushbox_core::object;

    fn mover() -> MoveComponent {
        MoveComponent::from_config(&MoveConfig {
            name: "cursor".into(),
            messages: vec![
                MoveBinding {
                    name: "Key:ArrowDown".into(),
                    axis: Axis::Y,
                    amount: 16.0,
                },
                MoveBinding {
                    name: "Key:ArrowUp".into(),
                    axis: Axis::Y,
                    amount: -16.0,
                },
            ],
        })
    }

    #[test]
    fn bound_messages_displace_the_owner() {
        let ctx = GameContext::for_tests(Tuning::default());
        let owner = GameObject::new("cursor");
        let comp: SharedComponent = Rc::new(RefCell::new(mover()));
        object::add_component(&owner, comp, &ctx);
        object::load(&owner, &ctx).unwrap();

        ctx.bus.post(&Message::new("Key:ArrowDown", "test"), &ctx);
        ctx.bus.post(&Message::new("Key:ArrowDown", "test"), &ctx);
        ctx.bus.post(&Message::new("Key:ArrowUp", "test"), &ctx);

        assert_eq!(owner.borrow().y, 16.0);
        assert_eq!(owner.borrow().x, 0.0);
    }

    #[test]
    fn unbound_messages_are_ignored() {
        let ctx = GameContext::for_tests(Tuning::default());
        let owner = GameObject::new("cursor");
        let comp: SharedComponent = Rc::new(RefCell::new(mover()));
        object::add_component(&owner, comp.clone(), &ctx);

        comp.borrow_mut()
            .on_message(&Message::new("Key:Space", "test"), &ctx);
        assert_eq!(owner.borrow().y, 0.0);
    }

    #[test]
    fn subscriptions_list_every_binding() {
        let comp = mover();
        assert_eq!(
            comp.subscriptions(),
            vec!["Key:ArrowDown".to_owned(), "Key:ArrowUp".to_owned()]
        );
    }
}
