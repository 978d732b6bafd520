//! Transient animation records owned by the cascade sequencer.
//!
//! Each visual phase has its own record type; `Vanishing` tags the three
//! disappearance phases so a chip can only be in one of them at a time.

use crate::grid::Chip;

/// Per-tick progress increments. Animations are time-sliced by ticks, not by
/// wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSteps {
    pub flash: f32,
    pub fade: f32,
    pub blast: f32,
    pub fall: f32,
}

impl Default for AnimationSteps {
    fn default() -> Self {
        Self {
            flash: 0.10,
            fade: 0.08,
            blast: 0.08,
            fall: 0.05,
        }
    }
}

/// Matched chip pulsing before it fades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashingChip {
    pub x: usize,
    pub y: usize,
    pub chip: Chip,
    /// Length of the run that matched this chip; runs of 4+ pulse bigger.
    pub run_len: usize,
    pub progress: f32,
}

/// Matched chip fading out after its flash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadingChip {
    pub x: usize,
    pub y: usize,
    pub chip: Chip,
    pub progress: f32,
}

/// Chip caught in a bomb blast (expanding radius instead of flash/fade).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BombBlastChip {
    pub x: usize,
    pub y: usize,
    pub chip: Chip,
    pub progress: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Vanishing {
    Flashing(FlashingChip),
    Fading(FadingChip),
    Blast(BombBlastChip),
}

impl Vanishing {
    pub fn flashing(x: usize, y: usize, chip: Chip, run_len: usize) -> Self {
        Self::Flashing(FlashingChip {
            x,
            y,
            chip,
            run_len,
            progress: 0.0,
        })
    }

    pub fn blast(x: usize, y: usize, chip: Chip) -> Self {
        Self::Blast(BombBlastChip {
            x,
            y,
            chip,
            progress: 0.0,
        })
    }

    pub fn position(&self) -> (usize, usize) {
        match self {
            Self::Flashing(c) => (c.x, c.y),
            Self::Fading(c) => (c.x, c.y),
            Self::Blast(c) => (c.x, c.y),
        }
    }

    pub fn chip(&self) -> Chip {
        match self {
            Self::Flashing(c) => c.chip,
            Self::Fading(c) => c.chip,
            Self::Blast(c) => c.chip,
        }
    }

    pub fn progress(&self) -> f32 {
        match self {
            Self::Flashing(c) => c.progress,
            Self::Fading(c) => c.progress,
            Self::Blast(c) => c.progress,
        }
    }

    /// One tick. Flashing turns into Fading (progress reset) once it completes;
    /// Fading and Blast return `None` once they complete.
    pub fn advance(self, steps: &AnimationSteps) -> Option<Self> {
        match self {
            Self::Flashing(mut c) => {
                c.progress += steps.flash;
                if c.progress >= 1.0 {
                    Some(Self::Fading(FadingChip {
                        x: c.x,
                        y: c.y,
                        chip: c.chip,
                        progress: 0.0,
                    }))
                } else {
                    Some(Self::Flashing(c))
                }
            }
            Self::Fading(mut c) => {
                c.progress += steps.fade;
                (c.progress < 1.0).then_some(Self::Fading(c))
            }
            Self::Blast(mut c) => {
                c.progress += steps.blast;
                (c.progress < 1.0).then_some(Self::Blast(c))
            }
        }
    }
}

/// Chip sliding down a column during the gravity phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingChip {
    pub column: usize,
    pub chip: Chip,
    /// Negative for chips spawned above the board.
    pub source_row: i32,
    pub target_row: usize,
    pub progress: f32,
}

impl FallingChip {
    pub fn new(column: usize, chip: Chip, source_row: i32, target_row: usize) -> Self {
        Self {
            column,
            chip,
            source_row,
            target_row,
            progress: 0.0,
        }
    }

    /// Current fractional row (interpolated between source and target).
    pub fn row(&self) -> f32 {
        let from = self.source_row as f32;
        let to = self.target_row as f32;
        from + (to - from) * self.progress
    }

    pub fn advance(&mut self, step: f32) {
        self.progress = (self.progress + step).min(1.0);
    }

    pub fn landed(&self) -> bool {
        self.progress >= 1.0
    }
}
