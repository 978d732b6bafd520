//! Score and level bookkeeping.

use crate::grid::Chip;

pub const POINTS_PER_CHIP: u32 = 10;
pub const MOVES_PER_LEVEL: u32 = 25;
pub const LEVEL_COUNT: u32 = 10;
/// Objective colour on a full six-colour board (blue).
pub const OBJECTIVE_COLOR: u8 = 5;
/// Objective chips to destroy on each level.
pub const LEVEL_TARGETS: [u32; LEVEL_COUNT as usize] = [10, 12, 13, 15, 16, 18, 20, 22, 24, 25];

/// What the coordinator reports as the board resolves.
pub trait Counters {
    /// `count` chips left the board in resolution round `chain` (1-based).
    fn chips_removed(&mut self, count: u32, chain: u32);
    fn chip_destroyed(&mut self, chip: Chip);
    fn move_spent(&mut self);
    fn level_complete(&self) -> bool;
    fn game_over(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAdvance {
    Next(u32),
    Victory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub best: u32,
    pub level: u32,
    pub moves_left: u32,
    /// Chips of this colour count toward the level objective.
    pub objective: u8,
    pub objective_destroyed: u32,
    /// Points from the most recent removal, for the popup.
    pub last_award: u32,
}

impl Scoreboard {
    /// Fresh scoreboard for a board with `colors` colours in play.
    pub fn new(best: u32, colors: u8) -> Self {
        Self {
            score: 0,
            best,
            level: 1,
            moves_left: MOVES_PER_LEVEL,
            objective: objective_color(colors),
            objective_destroyed: 0,
            last_award: 0,
        }
    }

    pub fn target(&self) -> u32 {
        target_for_level(self.level)
    }

    /// Move to the next level, or report victory after the last one.
    pub fn next_level(&mut self) -> LevelAdvance {
        if self.level >= LEVEL_COUNT {
            return LevelAdvance::Victory;
        }
        self.level += 1;
        self.reset_level();
        LevelAdvance::Next(self.level)
    }

    /// Fresh moves and objective for the current level; score is kept.
    pub fn reset_level(&mut self) {
        self.moves_left = MOVES_PER_LEVEL;
        self.objective_destroyed = 0;
        self.last_award = 0;
    }

    /// Back to level 1 with a zero score. Best survives.
    pub fn restart(&mut self) {
        self.score = 0;
        self.level = 1;
        self.reset_level();
    }
}

impl Counters for Scoreboard {
    fn chips_removed(&mut self, count: u32, chain: u32) {
        let award = count * POINTS_PER_CHIP * chain.max(1);
        self.score += award;
        self.last_award = award;
        self.best = self.best.max(self.score);
    }

    fn chip_destroyed(&mut self, chip: Chip) {
        if chip == Chip::Color(self.objective) {
            self.objective_destroyed += 1;
        }
    }

    fn move_spent(&mut self) {
        self.moves_left = self.moves_left.saturating_sub(1);
    }

    fn level_complete(&self) -> bool {
        self.objective_destroyed >= self.target()
    }

    fn game_over(&self) -> bool {
        self.moves_left == 0 && !self.level_complete()
    }
}

/// Blue when it is in play, else the last colour the board can hold.
pub fn objective_color(colors: u8) -> u8 {
    OBJECTIVE_COLOR.min(colors.saturating_sub(1))
}

pub fn target_for_level(level: u32) -> u32 {
    let i = level.clamp(1, LEVEL_COUNT) as usize - 1;
    LEVEL_TARGETS[i]
}
