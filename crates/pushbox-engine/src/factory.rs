//! Component template construction.
//!
//! Turns the typed config sections into a map of named component templates.
//! One constructor per kind; every declared name lands in one flat map, so
//! a collision anywhere across sections is fatal before any template is
//! handed out.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use pushbox_config::schema::ComponentSections;
use pushbox_config::ConfigError;
use pushbox_core::component::{ComponentSet, SharedComponent};

use crate::components::animated_sprite::AnimatedSpriteComponent;
use crate::components::movement::MoveComponent;
use crate::components::sokoban::SokobanController;
use crate::components::spawn::SpawnComponent;
use crate::components::sprite::SpriteComponent;
use crate::components::text::TextComponent;
use crate::components::tile::{TileComponent, TileSetComponent};
use crate::components::tile_map::TileMapComponent;
use crate::GameError;

/// Build the template map for a level from its component sections.
pub fn build_templates(sections: &ComponentSections) -> Result<ComponentSet, GameError> {
    let mut templates = ComponentSet::new();

    for config in &sections.sprite {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(SpriteComponent::from_config(config))),
        )?;
    }
    for config in &sections.animated_sprite {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(AnimatedSpriteComponent::from_config(config))),
        )?;
    }
    for config in &sections.movement {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(MoveComponent::from_config(config))),
        )?;
    }
    for config in &sections.text {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(TextComponent::from_config(config))),
        )?;
    }
    for config in &sections.spawn {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(SpawnComponent::from_config(config))),
        )?;
    }
    for config in &sections.tile {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(TileComponent::from_config(config))),
        )?;
    }
    for config in &sections.tile_set {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(TileSetComponent::from_config(config))),
        )?;
    }
    for config in &sections.tile_map {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(TileMapComponent::from_config(config))),
        )?;
    }
    for config in &sections.sokoban_controller {
        insert(
            &mut templates,
            &config.name,
            Rc::new(RefCell::new(SokobanController::from_config(config))),
        )?;
    }

    debug!(templates = templates.len(), "component templates built");
    Ok(templates)
}

fn insert(
    templates: &mut ComponentSet,
    name: &str,
    component: SharedComponent,
) -> Result<(), GameError> {
    if templates.contains_key(name) {
        return Err(ConfigError::DuplicateComponentName {
            name: name.to_owned(),
        }
        .into());
    }
    templates.insert(name.to_owned(), component);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
