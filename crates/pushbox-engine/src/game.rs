//! The game loop and level switching.
//!
//! The [`Game`] owns the context, the level list, and the currently active
//! level, and drives everything from one `tick` call per frame. Level
//! switches always run the same sequence: fade the screen out, unload the
//! old level, stand the new one up through its pipeline, fade back in. A
//! switch request that arrives mid-fade waits for the fade to finish; the
//! ramp is never interrupted.
//!
//! The fade ramps the stage root's alpha linearly by `tuning.fade_step` per
//! tick; the renderer draws the dimmed tree however it likes.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use pushbox_core::context::GameContext;
use pushbox_core::message::{topics, Message, MessageHandler};

use crate::level::{Level, LevelSource};
use crate::GameError;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// What the loop is doing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Waiting for the active level's config fetch.
    LevelPreloading,
    /// Waiting for scene assets and UI screens to preload.
    LevelLoading,
    /// The level is active and ticking.
    Playing,
    /// No level is ticking; menus and fades still run.
    Paused,
}

// ---------------------------------------------------------------------------
// UiScreen
// ---------------------------------------------------------------------------

/// An overlay owned by the embedding application (menus, HUDs, summaries).
///
/// The loop only cares about two things: screens preload alongside the
/// level, and they tick every frame regardless of game state.
pub trait UiScreen {
    /// Screen name, for logging.
    fn name(&self) -> &str;

    /// Request assets; return `true` while still waiting.
    fn preloading(&mut self, _ctx: &GameContext) -> bool {
        false
    }

    /// Per-frame tick.
    fn update(&mut self, _delta_ms: f32, _ctx: &GameContext) {}
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Change(usize),
    Restart,
    Start,
    MainMenu,
    SummaryContinue,
}

/// Inbox for control messages. Lives behind an `Rc` so the bus can hold it;
/// the loop drains it once per tick. The latest request wins.
struct Requests {
    pending: Option<Request>,
}

impl Requests {
    fn take(&mut self) -> Option<Request> {
        self.pending.take()
    }
}

impl MessageHandler for Requests {
    fn on_message(&mut self, message: &Message, _ctx: &GameContext) {
        let request = match message.name.as_str() {
            topics::CHANGE_LEVEL => match message.context.as_u64() {
                Some(index) => Request::Change(index as usize),
                None => {
                    warn!("CHANGE_LEVEL without a level index");
                    return;
                }
            },
            topics::RESTART_LEVEL => Request::Restart,
            topics::START_GAME => Request::Start,
            topics::GO_MAIN_MENU => Request::MainMenu,
            topics::SUMMARY_CONTINUE => Request::SummaryContinue,
            _ => return,
        };
        self.pending = Some(request);
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadePhase {
    Idle,
    Out { target: usize, remaining: u32 },
    In { remaining: u32 },
}

/// The top of the engine: owns the context, the level list and the loop.
pub struct Game {
    ctx: GameContext,
    sources: Vec<(String, LevelSource)>,
    active: Option<Level>,
    active_index: usize,
    state: GameState,
    requests: Rc<RefCell<Requests>>,
    screens: Vec<Box<dyn UiScreen>>,
    fade: FadePhase,
}

impl Game {
    /// Create a paused game over a list of named level sources. The game
    /// sits on its menu until `START_GAME` (or an explicit switch) arrives.
    pub fn new(ctx: GameContext, sources: Vec<(String, LevelSource)>) -> Self {
        let requests = Rc::new(RefCell::new(Requests { pending: None }));
        let handler: Rc<RefCell<dyn MessageHandler>> = requests.clone();
        for topic in [
            topics::CHANGE_LEVEL,
            topics::RESTART_LEVEL,
            topics::START_GAME,
            topics::GO_MAIN_MENU,
            topics::SUMMARY_CONTINUE,
        ] {
            ctx.bus.subscribe(topic, &handler);
        }
        Self {
            ctx,
            sources,
            active: None,
            active_index: 0,
            state: GameState::Paused,
            requests,
            screens: Vec::new(),
            fade: FadePhase::Idle,
        }
    }

    /// The shared context.
    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    /// The current loop state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// The active level, if any.
    pub fn active_level(&self) -> Option<&Level> {
        self.active.as_ref()
    }

    /// Whether a fade ramp is in flight.
    pub fn fading(&self) -> bool {
        self.fade != FadePhase::Idle
    }

    /// Register a UI screen. Its preloading gates level loading.
    pub fn add_screen(&mut self, screen: Box<dyn UiScreen>) {
        self.screens.push(screen);
    }

    /// Begin a switch to the level at `index`, fading if a level is already
    /// up and cutting straight to it otherwise.
    pub fn switch_level(&mut self, index: usize) -> Result<(), GameError> {
        if index >= self.sources.len() {
            return Err(GameError::NoSuchLevel {
                index,
                count: self.sources.len(),
            });
        }
        if self.active.is_none() {
            self.stand_up(index);
            self.begin_fade_in();
            return Ok(());
        }
        debug!(index, "level switch requested, fading out");
        self.fade = FadePhase::Out {
            target: index,
            remaining: self.fade_frames(),
        };
        self.ctx
            .bus
            .post(&Message::new(topics::FADE_OUT, "game"), &self.ctx);
        Ok(())
    }

    /// Advance one frame.
    pub fn tick(&mut self, delta_ms: f32) -> Result<(), GameError> {
        self.advance_fade();

        if self.fade == FadePhase::Idle {
            let request = self.requests.borrow_mut().take();
            if let Some(request) = request {
                self.handle_request(request)?;
            }
        }

        match self.state {
            GameState::LevelPreloading => {
                let ready = match self.active.as_mut() {
                    Some(level) => level.poll_config(&self.ctx)?,
                    None => false,
                };
                if ready {
                    if let Some(level) = self.active.as_mut() {
                        level.initialize(&self.ctx)?;
                    }
                    self.state = GameState::LevelLoading;
                }
            }
            GameState::LevelLoading => {
                let level_waiting = self
                    .active
                    .as_ref()
                    .map(|level| level.preloading(&self.ctx))
                    .unwrap_or(false);
                let ui_waiting = self.screens_preloading();
                if !level_waiting && !ui_waiting {
                    if let Some(level) = self.active.as_mut() {
                        level.load(&self.ctx)?;
                        level.activate(&self.ctx)?;
                    }
                    self.state = GameState::Playing;
                }
            }
            GameState::Playing => {
                if let Some(level) = &self.active {
                    level.update(delta_ms, &self.ctx);
                }
            }
            GameState::Paused => {}
        }

        for screen in &mut self.screens {
            screen.update(delta_ms, &self.ctx);
        }
        Ok(())
    }

    fn screens_preloading(&mut self) -> bool {
        let mut waiting = false;
        for screen in &mut self.screens {
            if screen.preloading(&self.ctx) {
                waiting = true;
            }
        }
        waiting
    }

    fn handle_request(&mut self, request: Request) -> Result<(), GameError> {
        match request {
            Request::Change(index) => self.switch_level(index),
            Request::Restart => self.switch_level(self.active_index),
            Request::Start => self.switch_level(0),
            Request::SummaryContinue => {
                let next = (self.active_index + 1) % self.sources.len().max(1);
                self.switch_level(next)
            }
            Request::MainMenu => {
                info!("returning to the main menu");
                self.state = GameState::Paused;
                Ok(())
            }
        }
    }

    /// Frames per fade ramp, from the configured per-frame alpha step.
    fn fade_frames(&self) -> u32 {
        (1.0 / self.ctx.tuning.fade_step).ceil().max(1.0) as u32
    }

    fn advance_fade(&mut self) {
        let total = self.fade_frames();
        match self.fade {
            FadePhase::Idle => {}
            FadePhase::Out { target, remaining } => {
                let remaining = remaining - 1;
                self.set_root_alpha(remaining as f32 / total as f32);
                if remaining == 0 {
                    // The switch itself waits for the ramp to bottom out.
                    self.stand_up(target);
                    self.begin_fade_in();
                } else {
                    self.fade = FadePhase::Out { target, remaining };
                }
            }
            FadePhase::In { remaining } => {
                let remaining = remaining - 1;
                self.set_root_alpha(1.0 - remaining as f32 / total as f32);
                if remaining == 0 {
                    self.fade = FadePhase::Idle;
                } else {
                    self.fade = FadePhase::In { remaining };
                }
            }
        }
    }

    fn begin_fade_in(&mut self) {
        self.fade = FadePhase::In {
            remaining: self.fade_frames(),
        };
        self.ctx
            .bus
            .post(&Message::new(topics::FADE_IN, "game"), &self.ctx);
    }

    fn stand_up(&mut self, index: usize) {
        if let Some(mut old) = self.active.take() {
            debug!(level = %old.name(), "tearing down level");
            old.destroy(&self.ctx);
        }
        let (name, source) = &self.sources[index];
        self.active = Some(Level::new(name, source.clone()));
        self.active_index = index;
        self.state = GameState::LevelPreloading;
    }

    fn set_root_alpha(&self, alpha: f32) {
        let mut stage = self.ctx.stage.borrow_mut();
        let root = stage.root();
        stage.set_alpha(root, alpha);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
