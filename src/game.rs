//! Game state: board, cascade, gesture, score and level.
//!
//! `Game` is the only thing that mutates the board. Input arrives as pointer
//! events in cell units, time arrives as `tick()`, and everything the player
//! sees is derived from the grid plus the cascade overlays.

use crate::GameConfig;
use crate::audio::{AudioCue, AudioSink};
use crate::cascade::{CascadeConfig, CascadeEvent, CascadeSequencer};
use crate::counters::{Counters, LevelAdvance, Scoreboard};
use crate::error::EngineError;
use crate::gesture::{DragState, GestureOutcome, GestureTracker};
use crate::grid::Grid;
use crate::matcher;
use crate::scene::{self, Sprite};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// How long a score popup stays up, in seconds.
const POPUP_SECS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    LevelComplete,
    GameOver,
    Victory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorePopup {
    pub x: usize,
    pub y: usize,
    pub amount: u32,
    pub chain: u32,
    pub age_ticks: u32,
}

pub struct Game {
    grid: Grid,
    cascade: CascadeSequencer,
    gesture: GestureTracker,
    rng: SmallRng,
    pub scoreboard: Scoreboard,
    audio: Box<dyn AudioSink>,
    status: Status,
    pub popups: Vec<ScorePopup>,
    popup_ticks: u32,
    /// Bumped whenever a fresh board is dealt, so the UI can replay its intro.
    pub board_generation: u32,
}

impl Game {
    pub fn new(config: &GameConfig, best: u32, audio: Box<dyn AudioSink>) -> Self {
        let mut rng = config
            .seed
            .map(SmallRng::seed_from_u64)
            .unwrap_or_else(SmallRng::from_os_rng);
        let grid = Grid::generate(config.width, config.height, config.colors, &mut rng);
        Self::with_grid(grid, rng, config, best, audio)
    }

    fn with_grid(grid: Grid, rng: SmallRng, config: &GameConfig, best: u32, audio: Box<dyn AudioSink>) -> Self {
        info!(
            "new game: {}x{} board, {} colours",
            grid.width(),
            grid.height(),
            grid.colors()
        );
        let scoreboard = Scoreboard::new(best, grid.colors());
        Self {
            grid,
            cascade: CascadeSequencer::new(CascadeConfig::for_tick_rate(config.tick_rate)),
            gesture: GestureTracker::new(),
            rng,
            scoreboard,
            audio,
            status: Status::Playing,
            popups: Vec::new(),
            popup_ticks: (config.tick_rate.max(1.0) * POPUP_SECS).round() as u32,
            board_generation: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn cascade(&self) -> &CascadeSequencer {
        &self.cascade
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.gesture.drag()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Gestures are only taken while playing on a still board.
    pub fn accepts_input(&self) -> bool {
        self.status == Status::Playing && self.cascade.is_idle()
    }

    pub fn sprites(&self) -> Vec<Sprite> {
        scene::compose(self)
    }

    /// Grab the chip under the pointer. Returns whether a gesture started.
    pub fn pointer_down(&mut self, x: usize, y: usize) -> bool {
        if !self.accepts_input() {
            debug!("pointer down at ({x}, {y}) ignored: board busy");
            return false;
        }
        match self.gesture.begin(&self.grid, x, y) {
            Ok(()) => true,
            Err(e) => {
                debug!("pointer down ignored: {e}");
                false
            }
        }
    }

    /// Total displacement from the pointer-down point, in cells.
    pub fn pointer_move(&mut self, dx: f32, dy: f32) {
        self.gesture.update(&self.grid, dx, dy);
    }

    pub fn pointer_up(&mut self) {
        let Some(outcome) = self.gesture.release() else {
            return;
        };
        let result = match outcome {
            GestureOutcome::Swap { from, to } => self.try_swap(from, to).map(|_| ()),
            GestureOutcome::Detonate { at: (x, y) } => self.detonate(x, y),
            GestureOutcome::Cancel => Ok(()),
        };
        if let Err(e) = result {
            debug!("{outcome:?} rejected: {e}");
        }
    }

    pub fn cancel_gesture(&mut self) {
        if self.gesture.is_active() {
            debug!("gesture cancelled");
            self.gesture.cancel();
        }
    }

    /// Swap two neighbours. A swap that moves a bomb detonates it where it
    /// lands; any other swap is kept only if it makes a match. Returns
    /// whether the board changed.
    pub fn try_swap(&mut self, from: (usize, usize), to: (usize, usize)) -> Result<bool, EngineError> {
        if !self.accepts_input() {
            return Err(EngineError::Busy);
        }
        if from.0.abs_diff(to.0) + from.1.abs_diff(to.1) != 1 {
            return Err(EngineError::InvalidSwapTarget);
        }
        self.grid.swap(from, to)?;

        let bomb_at = [to, from]
            .into_iter()
            .find(|&(x, y)| self.grid.get(x, y).is_some_and(|c| c.is_bomb()));
        if let Some((x, y)) = bomb_at {
            if let Err(e) = self.detonate(x, y) {
                self.grid.swap(from, to)?;
                return Err(e);
            }
            return Ok(true);
        }

        let result = matcher::detect(&self.grid);
        if result.is_empty() {
            debug!("swap {from:?} <-> {to:?} makes no match, reverted");
            self.grid.swap(from, to)?;
            return Ok(false);
        }
        self.scoreboard.move_spent();
        let events = self.cascade.begin(&mut self.grid, &result)?;
        self.dispatch(&events);
        Ok(true)
    }

    /// Detonate the bomb at (x, y). Spends a move.
    pub fn detonate(&mut self, x: usize, y: usize) -> Result<(), EngineError> {
        if self.status != Status::Playing {
            return Err(EngineError::Busy);
        }
        let events = self.cascade.detonate(&mut self.grid, x, y)?;
        self.scoreboard.move_spent();
        self.dispatch(&events);
        Ok(())
    }

    /// One logic tick.
    pub fn tick(&mut self) {
        let events = self.cascade.tick(&mut self.grid, &mut self.rng);
        self.dispatch(&events);

        let limit = self.popup_ticks;
        self.popups.retain_mut(|p| {
            p.age_ticks += 1;
            p.age_ticks < limit
        });

        if events.iter().any(|e| matches!(e, CascadeEvent::Settled { .. })) {
            self.check_level();
        }
    }

    fn check_level(&mut self) {
        if self.status != Status::Playing {
            return;
        }
        if self.scoreboard.level_complete() {
            info!("level {} complete", self.scoreboard.level);
            self.status = Status::LevelComplete;
        } else if self.scoreboard.game_over() {
            info!("out of moves on level {}", self.scoreboard.level);
            self.status = Status::GameOver;
        }
    }

    /// Leave the level-complete screen: next level on a fresh board, or
    /// victory after the last one.
    pub fn next_level(&mut self) {
        if self.status != Status::LevelComplete {
            return;
        }
        match self.scoreboard.next_level() {
            LevelAdvance::Next(level) => {
                info!("starting level {level}");
                self.deal();
                self.status = Status::Playing;
            }
            LevelAdvance::Victory => {
                info!("all levels cleared, final score {}", self.scoreboard.score);
                self.status = Status::Victory;
            }
        }
    }

    /// Back to level 1 with a fresh board.
    pub fn restart(&mut self) {
        self.scoreboard.restart();
        self.deal();
        self.status = Status::Playing;
    }

    fn deal(&mut self) {
        let (w, h, colors) = (self.grid.width(), self.grid.height(), self.grid.colors());
        self.grid = Grid::generate(w, h, colors, &mut self.rng);
        self.cascade = CascadeSequencer::new(*self.cascade.config());
        self.gesture.cancel();
        self.popups.clear();
        self.board_generation += 1;
    }

    fn dispatch(&mut self, events: &[CascadeEvent]) {
        for event in events {
            match *event {
                CascadeEvent::PowerUpFormed { x, y } => {
                    debug!("bomb formed at ({x}, {y})");
                    self.audio.cue(AudioCue::PowerUpFormed);
                }
                CascadeEvent::BombDetonated { x, y } => {
                    debug!("bomb detonated at ({x}, {y})");
                    self.audio.cue(AudioCue::BombDetonated);
                }
                CascadeEvent::ChipDestroyed(chip) => self.scoreboard.chip_destroyed(chip),
                CascadeEvent::ChipsRemoved { count, chain } => {
                    self.scoreboard.chips_removed(count, chain);
                    if count > 0 {
                        let (x, y) = self
                            .cascade
                            .vanishing()
                            .first()
                            .map(|v| v.position())
                            .unwrap_or((self.grid.width() / 2, self.grid.height() / 2));
                        self.popups.push(ScorePopup {
                            x,
                            y,
                            amount: self.scoreboard.last_award,
                            chain,
                            age_ticks: 0,
                        });
                    }
                }
                CascadeEvent::Settled { chain } => debug!("board settled after {chain} rounds"),
            }
        }
    }
}
