//! Full-stack puzzle test: JSON config through the game loop to a cleared
//! level.
//!
//! Drives a real level the way an embedding application would: build a
//! `Game` over inline configs, tick it to `Playing`, post `Player:move*`
//! messages on the bus, and watch the wire-contract messages come back.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use pushbox_core::prelude::*;
use pushbox_engine::components::sokoban::SokobanController;
use pushbox_engine::prelude::*;

// -- Fixture ----------------------------------------------------------------

/// A 5x4 room with a wall border. Player spawns at (1,1), one crate at
/// (2,1), one goal at (3,1): a single push to the right clears it.
fn level_json() -> Value {
    json!({
        "components": {
            "sprite": [
                { "name": "playerSprite", "asset": "player.png" },
                { "name": "crateSprite", "asset": "crate.png" },
                { "name": "goalSprite", "asset": "goal.png" },
                { "name": "wallSprite", "asset": "wall.png" },
                { "name": "floorSprite", "asset": "floor.png" }
            ],
            "tile": [
                { "name": "floor", "type": "background", "spriteComponent": "floorSprite" },
                { "name": "wall", "type": "wall", "spriteComponent": "wallSprite" }
            ],
            "tileSet": [ { "name": "dungeon", "tiles": ["floor", "wall"] } ],
            "tileMap": [ {
                "name": "map", "tileSet": "dungeon",
                "tilesWide": 5, "tilesHigh": 4,
                "spawnTileX": 1, "spawnTileY": 1,
                "layers": [ { "tileIDs": [
                    1, 1, 1, 1, 1,
                    1, 0, 0, 0, 1,
                    1, 0, 0, 0, 1,
                    1, 1, 1, 1, 1
                ] } ]
            } ],
            "sokobanController": [ {
                "name": "controller",
                "tileMap": "mapObject", "tileMapComponent": "map",
                "playerSprite": "playerSprite",
                "crateSprite": "crateSprite", "goalSprite": "goalSprite",
                "crates": [ { "x": 2, "y": 1 } ],
                "goals": [ { "x": 3, "y": 1 } ]
            } ]
        },
        "scene": {
            "objects": [
                { "name": "mapObject", "components": ["map"] },
                { "name": "game", "components": ["controller"] }
            ]
        }
    })
}

struct Recorder {
    seen: Vec<(String, Value)>,
}

impl MessageHandler for Recorder {
    fn on_message(&mut self, message: &Message, _ctx: &GameContext) {
        self.seen.push((message.name.clone(), message.context.clone()));
    }
}

fn recorded(recorder: &Rc<RefCell<Recorder>>, topic: &str) -> Vec<Value> {
    recorder
        .borrow()
        .seen
        .iter()
        .filter(|(name, _)| name == topic)
        .map(|(_, ctx)| ctx.clone())
        .collect()
}

fn playing_game() -> (Game, Rc<RefCell<Recorder>>) {
    let ctx = GameContext::for_tests(Tuning::default());
    for asset in ["player.png", "crate.png", "goal.png", "wall.png", "floor.png"] {
        ctx.assets.borrow_mut().complete(asset, vec![0]);
    }

    let recorder = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
    let handler: SharedHandler = recorder.clone();
    for topic in [topics::LEVEL_READY, topics::LEVEL_CLEARED, topics::PLAYER_MOVED] {
        ctx.bus.subscribe(topic, &handler);
    }

    let mut game = Game::new(
        ctx,
        vec![("level1".into(), LevelSource::Inline(level_json()))],
    );
    game.switch_level(0).unwrap();
    for _ in 0..4 {
        game.tick(16.0).unwrap();
    }
    assert_eq!(game.state(), GameState::Playing);
    (game, recorder)
}

fn with_controller<R>(game: &Game, f: impl FnOnce(&SokobanController) -> R) -> R {
    let holder = game.active_level().unwrap().scene().object("game").unwrap();
    let component = holder.borrow().get_component("controller").unwrap();
    let guard = component.borrow();
    f(guard.as_any().downcast_ref::<SokobanController>().unwrap())
}

fn post(game: &Game, topic: &str) {
    let msg = Message::new(topic, "test");
    game.context().bus.post(&msg, game.context());
}

// -- Tests ------------------------------------------------------------------

#[test]
fn activation_spawns_the_puzzle_and_announces_it() {
    let (game, recorder) = playing_game();

    assert_eq!(
        recorded(&recorder, topics::LEVEL_READY),
        vec![Value::String("level1".into())]
    );

    with_controller(&game, |c| {
        assert_eq!(c.player_tile(), TileIndex::new(1, 1));
        assert_eq!(c.crate_tiles(), vec![TileIndex::new(2, 1)]);
        assert_eq!(c.moves(), 0);
        assert!(!c.cleared());
    });

    // Spawned entities are children of the controller's owner, placed at
    // their tiles' pixel positions.
    let holder = game.active_level().unwrap().scene().object("game").unwrap();
    let player = holder.borrow().get_child("player").unwrap();
    assert_eq!(player.borrow().x, 32.0);
    assert_eq!(player.borrow().y, 32.0);
    assert!(holder.borrow().get_child("crate0").is_some());
    assert!(holder.borrow().get_child("goal0").is_some());
}

#[test]
fn walls_reject_and_pushes_clear() {
    let (game, recorder) = playing_game();

    // Up from (1,1) is the border wall.
    post(&game, topics::PLAYER_MOVE_UP);
    with_controller(&game, |c| assert_eq!(c.moves(), 0));
    assert!(recorded(&recorder, topics::PLAYER_MOVED).is_empty());

    // Right pushes the crate onto the goal.
    post(&game, topics::PLAYER_MOVE_RIGHT);
    with_controller(&game, |c| {
        assert_eq!(c.player_tile(), TileIndex::new(2, 1));
        assert_eq!(c.crate_tiles(), vec![TileIndex::new(3, 1)]);
        assert!(c.cleared());
    });
    assert_eq!(recorded(&recorder, topics::PLAYER_MOVED), vec![json!(1)]);
    assert_eq!(recorded(&recorder, topics::LEVEL_CLEARED).len(), 1);

    // Input after the clear is dead, and no second clear is announced.
    post(&game, topics::PLAYER_MOVE_LEFT);
    with_controller(&game, |c| assert_eq!(c.moves(), 1));
    assert_eq!(recorded(&recorder, topics::LEVEL_CLEARED).len(), 1);
}

#[test]
fn slide_animation_catches_up_with_the_grid() {
    let (mut game, _recorder) = playing_game();

    post(&game, topics::PLAYER_MOVE_RIGHT);
    with_controller(&game, |c| assert!(c.sliding()));

    // 32 px at 4 px per tick.
    for _ in 0..8 {
        game.tick(16.0).unwrap();
    }
    with_controller(&game, |c| assert!(!c.sliding()));

    let holder = game.active_level().unwrap().scene().object("game").unwrap();
    let player = holder.borrow().get_child("player").unwrap();
    assert_eq!(player.borrow().x, 64.0);
    let pushed = holder.borrow().get_child("crate0").unwrap();
    assert_eq!(pushed.borrow().x, 96.0);
}

#[test]
fn restart_rebuilds_the_puzzle_from_templates() {
    let (mut game, recorder) = playing_game();

    post(&game, topics::PLAYER_MOVE_RIGHT);
    with_controller(&game, |c| assert!(c.cleared()));

    post(&game, topics::RESTART_LEVEL);
    // Startup fade-in, fade-out, and the reload pipeline.
    for _ in 0..50 {
        game.tick(16.0).unwrap();
    }
    assert_eq!(game.state(), GameState::Playing);

    with_controller(&game, |c| {
        assert_eq!(c.moves(), 0);
        assert!(!c.cleared());
        assert_eq!(c.player_tile(), TileIndex::new(1, 1));
        assert_eq!(c.crate_tiles(), vec![TileIndex::new(2, 1)]);
    });
    assert_eq!(recorded(&recorder, topics::LEVEL_READY).len(), 2);
}
