//! Tiles and tile palettes.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use pushbox_config::schema::{TileConfig, TileKind, TileSetConfig};
use pushbox_core::component::{Component, ComponentSet, SharedComponent};
use pushbox_core::context::GameContext;
use pushbox_core::message::MessageHandler;
use pushbox_core::stage::NodeId;
use pushbox_core::CoreError;

use super::sprite::SpriteComponent;
use super::with_concrete;

// ---------------------------------------------------------------------------
// TileComponent
// ---------------------------------------------------------------------------

/// One grid tile: a gameplay kind plus the concrete sprite that draws it.
///
/// The sprite reference in config is resolved to an owned [`SpriteComponent`]
/// at initialize time; tile maps then stamp copies of the initialized tile
/// per grid cell.
pub struct TileComponent {
    name: String,
    kind: TileKind,
    sprite_name: String,
    sprite: Option<SpriteComponent>,
}

impl TileComponent {
    /// Build a template from config.
    pub fn from_config(config: &TileConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind: config.kind,
            sprite_name: config.sprite_component.clone(),
            sprite: None,
        }
    }

    /// A copy keeping the resolved sprite's configuration but dropping all
    /// runtime state.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            sprite_name: self.sprite_name.clone(),
            sprite: self.sprite.as_ref().map(SpriteComponent::fresh),
        }
    }

    /// The gameplay kind of this tile.
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    /// Whether this tile blocks movement.
    pub fn is_wall(&self) -> bool {
        self.kind == TileKind::Wall
    }
}

impl MessageHandler for TileComponent {}

impl Component for TileComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, templates: &ComponentSet, _ctx: &GameContext) -> Result<(), CoreError> {
        let template =
            templates
                .get(&self.sprite_name)
                .ok_or_else(|| CoreError::ComponentNotFound {
                    name: self.sprite_name.clone(),
                })?;
        self.sprite = Some(with_concrete::<SpriteComponent, _>(
            template,
            "sprite",
            SpriteComponent::fresh,
        )?);
        Ok(())
    }

    fn preloading(&mut self, ctx: &GameContext) -> bool {
        self.sprite
            .as_mut()
            .map(|s| s.preloading(ctx))
            .unwrap_or(false)
    }

    fn load(&mut self, ctx: &GameContext) -> Result<(), CoreError> {
        if let Some(sprite) = &mut self.sprite {
            sprite.load(ctx)?;
        }
        Ok(())
    }

    fn unload(&mut self, ctx: &GameContext) {
        if let Some(sprite) = &mut self.sprite {
            sprite.unload(ctx);
        }
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
    }

    fn renderable(&self) -> Option<NodeId> {
        self.sprite.as_ref().and_then(|s| s.renderable())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// TileSetComponent
// ---------------------------------------------------------------------------

/// An ordered palette of tiles that tile map layers index into.
pub struct TileSetComponent {
    name: String,
    tile_names: Vec<String>,
    tiles: Vec<TileComponent>,
}

impl TileSetComponent {
    /// Build a template from config.
    pub fn from_config(config: &TileSetConfig) -> Self {
        Self {
            name: config.name.clone(),
            tile_names: config.tiles.clone(),
            tiles: Vec::new(),
        }
    }

    /// A copy keeping resolved tiles' configuration, dropping runtime state.
    pub fn fresh(&self) -> Self {
        Self {
            name: self.name.clone(),
            tile_names: self.tile_names.clone(),
            tiles: self.tiles.iter().map(TileComponent::fresh).collect(),
        }
    }

    /// The tile at a palette index.
    pub fn tile(&self, index: usize) -> Option<&TileComponent> {
        self.tiles.get(index)
    }

    /// Palette size.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl MessageHandler for TileSetComponent {}

impl Component for TileSetComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, templates: &ComponentSet, ctx: &GameContext) -> Result<(), CoreError> {
        self.tiles.clear();
        for tile_name in &self.tile_names {
            let template =
                templates
                    .get(tile_name)
                    .ok_or_else(|| CoreError::ComponentNotFound {
                        name: tile_name.clone(),
                    })?;
            let mut tile =
                with_concrete::<TileComponent, _>(template, "tile", TileComponent::fresh)?;
            tile.initialize(templates, ctx)?;
            self.tiles.push(tile);
        }
        Ok(())
    }

    fn clone_component(&self) -> SharedComponent {
        Rc::new(RefCell::new(self.fresh()))
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
    use pushbox_config::schema::SpriteConfig;
    use pushbox_core::context::Tuning;

    fn templates() -> ComponentSet {
        let mut set = ComponentSet::new();
        for (name, asset) in [("wallSprite", "wall.png"), ("floorSprite", "floor.png")] {
            set.insert(
                name.to_owned(),
                Rc::new(RefCell::new(SpriteComponent::from_config(&SpriteConfig {
                    name: name.into(),
                    asset: asset.into(),
                }))) as SharedComponent,
            );
        }
        for (name, kind, sprite) in [
            ("wall", TileKind::Wall, "wallSprite"),
            ("floor", TileKind::Background, "floorSprite"),
        ] {
            set.insert(
                name.to_owned(),
                Rc::new(RefCell::new(TileComponent::from_config(&TileConfig {
                    name: name.into(),
                    kind,
                    sprite_component: sprite.into(),
                }))) as SharedComponent,
            );
        }
        set
    }

    #[test]
    fn tile_resolves_its_sprite_at_initialize() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut tile = TileComponent::from_config(&TileConfig {
            name: "wall".into(),
            kind: TileKind::Wall,
            sprite_component: "wallSprite".into(),
        });
        tile.initialize(&templates(), &ctx).unwrap();
        tile.load(&ctx).unwrap();

        assert!(tile.is_wall());
        assert!(tile.renderable().is_some());
    }

    #[test]
    fn tile_with_unknown_sprite_fails() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut tile = TileComponent::from_config(&TileConfig {
            name: "wall".into(),
            kind: TileKind::Wall,
            sprite_component: "ghost".into(),
        });
        let err = tile.initialize(&ComponentSet::new(), &ctx).unwrap_err();
        assert!(matches!(err, CoreError::ComponentNotFound { name } if name == "ghost"));
    }

    #[test]
    fn tile_set_resolves_in_palette_order() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut set = TileSetComponent::from_config(&TileSetConfig {
            name: "dungeon".into(),
            tiles: vec!["floor".into(), "wall".into()],
        });
        set.initialize(&templates(), &ctx).unwrap();

        assert_eq!(set.len(), 2);
        assert!(!set.tile(0).unwrap().is_wall());
        assert!(set.tile(1).unwrap().is_wall());
        assert!(set.tile(2).is_none());
    }

    #[test]
    fn fresh_copies_keep_resolution_but_not_nodes() {
        let ctx = GameContext::for_tests(Tuning::default());
        let mut tile = TileComponent::from_config(&TileConfig {
            name: "wall".into(),
            kind: TileKind::Wall,
            sprite_component: "wallSprite".into(),
        });
        tile.initialize(&templates(), &ctx).unwrap();
        tile.load(&ctx).unwrap();

        let mut copy = tile.fresh();
        assert!(copy.renderable().is_none());
        // No re-initialize needed; the resolved sprite came along.
        copy.load(&ctx).unwrap();
        assert!(copy.renderable().is_some());
    }
}
