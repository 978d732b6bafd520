//! Drag tracking: pointer displacement → axis-locked offset → swap,
//! detonation or nothing.
//!
//! Displacements are in cell units and always measured from where the
//! gesture started, so the tracker does not care whether they come from a
//! mouse or from cursor keys.

use crate::error::EngineError;
use crate::grid::{Chip, Grid};

/// Fraction of a cell the chip must be pushed past for a swap to happen.
pub const SWAP_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub origin: (usize, usize),
    pub grabbed: Chip,
    /// Raw displacement since the gesture started.
    pub displacement: (f32, f32),
    /// Where the grabbed chip is drawn, relative to `origin`.
    pub offset: (f32, f32),
    pub axis: Axis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Swap { from: (usize, usize), to: (usize, usize) },
    Detonate { at: (usize, usize) },
    Cancel,
}

#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    drag: Option<DragState>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Grab the chip at (x, y). Replaces any gesture already in progress.
    pub fn begin(&mut self, grid: &Grid, x: usize, y: usize) -> Result<(), EngineError> {
        let chip = grid.get(x, y).ok_or(EngineError::OutOfBounds { x, y })?;
        if chip.is_empty() {
            return Err(EngineError::EmptyCell { x, y });
        }
        self.drag = Some(DragState {
            origin: (x, y),
            grabbed: chip,
            displacement: (0.0, 0.0),
            offset: (0.0, 0.0),
            axis: Axis::None,
        });
        Ok(())
    }

    /// Total displacement (dx, dy) since `begin`. The axis follows whichever
    /// component is larger on this move, vertical on ties.
    pub fn update(&mut self, grid: &Grid, dx: f32, dy: f32) -> Option<&DragState> {
        let drag = self.drag.as_mut()?;
        let (x, y) = drag.origin;
        drag.displacement = (dx, dy);
        drag.axis = if dx == 0.0 && dy == 0.0 {
            Axis::None
        } else if dx.abs() > dy.abs() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };
        drag.offset = match drag.axis {
            Axis::None => (0.0, 0.0),
            Axis::Horizontal => (clamp_toward(dx, x, grid.width()), 0.0),
            Axis::Vertical => (0.0, clamp_toward(dy, y, grid.height())),
        };
        Some(drag)
    }

    /// Finish the gesture. `None` if nothing was grabbed.
    pub fn release(&mut self) -> Option<GestureOutcome> {
        let drag = self.drag.take()?;
        let (x, y) = drag.origin;
        let (ox, oy) = drag.offset;
        let target = match drag.axis {
            Axis::Horizontal if ox > SWAP_THRESHOLD => Some((x + 1, y)),
            Axis::Horizontal if ox < -SWAP_THRESHOLD => Some((x - 1, y)),
            Axis::Vertical if oy > SWAP_THRESHOLD => Some((x, y + 1)),
            Axis::Vertical if oy < -SWAP_THRESHOLD => Some((x, y - 1)),
            _ => None,
        };
        Some(match target {
            Some(to) => GestureOutcome::Swap { from: (x, y), to },
            None if drag.grabbed.is_bomb() && drag.displacement == (0.0, 0.0) => {
                GestureOutcome::Detonate { at: (x, y) }
            }
            None => GestureOutcome::Cancel,
        })
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

/// Clamp to one cell, and to zero on a side with no neighbour.
fn clamp_toward(d: f32, pos: usize, len: usize) -> f32 {
    let d = d.clamp(-1.0, 1.0);
    if (d > 0.0 && pos + 1 >= len) || (d < 0.0 && pos == 0) {
        0.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn board() -> Grid {
        Grid::generate(8, 8, 6, &mut SmallRng::seed_from_u64(42))
    }

    #[test]
    fn seventy_percent_drag_right_swaps_with_neighbour() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 2, 2).unwrap();
        let drag = *t.update(&g, 0.7, 0.1).unwrap();
        assert_eq!(drag.axis, Axis::Horizontal);
        assert_eq!(drag.offset, (0.7, 0.0));
        assert_eq!(
            t.release(),
            Some(GestureOutcome::Swap { from: (2, 2), to: (3, 2) })
        );
        assert!(!t.is_active());
    }

    #[test]
    fn short_drag_cancels() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 2, 2).unwrap();
        t.update(&g, -0.5, 0.0);
        assert_eq!(t.release(), Some(GestureOutcome::Cancel));
    }

    #[test]
    fn axis_follows_latest_move() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 4, 4).unwrap();
        assert_eq!(t.update(&g, 0.5, 0.2).unwrap().axis, Axis::Horizontal);
        let drag = *t.update(&g, 0.5, -0.8).unwrap();
        assert_eq!(drag.axis, Axis::Vertical);
        assert_eq!(drag.offset, (0.0, -0.8));
        assert_eq!(
            t.release(),
            Some(GestureOutcome::Swap { from: (4, 4), to: (4, 3) })
        );
    }

    #[test]
    fn diagonal_tie_locks_vertical() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 4, 4).unwrap();
        assert_eq!(t.update(&g, 0.7, 0.7).unwrap().axis, Axis::Vertical);
    }

    #[test]
    fn offset_is_clamped_to_one_cell() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 4, 4).unwrap();
        assert_eq!(t.update(&g, 3.5, 0.0).unwrap().offset, (1.0, 0.0));
        assert_eq!(t.update(&g, 0.0, -2.0).unwrap().offset, (0.0, -1.0));
    }

    #[test]
    fn no_offset_toward_board_edge() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 0, 7).unwrap();
        assert_eq!(t.update(&g, -0.9, 0.0).unwrap().offset, (0.0, 0.0));
        assert_eq!(t.update(&g, 0.0, 0.9).unwrap().offset, (0.0, 0.0));
        assert_eq!(t.release(), Some(GestureOutcome::Cancel));
    }

    #[test]
    fn tapping_a_bomb_detonates_it() {
        let mut g = board();
        g.set(3, 3, Chip::Bomb).unwrap();
        let mut t = GestureTracker::new();
        t.begin(&g, 3, 3).unwrap();
        assert_eq!(t.release(), Some(GestureOutcome::Detonate { at: (3, 3) }));

        // Dragging away and back to the start still counts as a tap.
        t.begin(&g, 3, 3).unwrap();
        t.update(&g, 0.3, 0.0);
        t.update(&g, 0.0, 0.0);
        assert_eq!(t.release(), Some(GestureOutcome::Detonate { at: (3, 3) }));
    }

    #[test]
    fn nudged_bomb_cancels() {
        let mut g = board();
        g.set(3, 3, Chip::Bomb).unwrap();
        let mut t = GestureTracker::new();
        t.begin(&g, 3, 3).unwrap();
        t.update(&g, 0.2, 0.0);
        assert_eq!(t.release(), Some(GestureOutcome::Cancel));
    }

    #[test]
    fn bomb_can_be_swapped() {
        let mut g = board();
        g.set(3, 3, Chip::Bomb).unwrap();
        let mut t = GestureTracker::new();
        t.begin(&g, 3, 3).unwrap();
        t.update(&g, 0.0, 0.9);
        assert_eq!(
            t.release(),
            Some(GestureOutcome::Swap { from: (3, 3), to: (3, 4) })
        );
    }

    #[test]
    fn begin_rejects_empty_and_off_board_cells() {
        let mut g = board();
        g.clear_cells([(1, 1)]);
        let mut t = GestureTracker::new();
        assert_eq!(t.begin(&g, 1, 1), Err(EngineError::EmptyCell { x: 1, y: 1 }));
        assert_eq!(t.begin(&g, 8, 1), Err(EngineError::OutOfBounds { x: 8, y: 1 }));
        assert!(!t.is_active());
        assert!(t.update(&g, 1.0, 0.0).is_none());
        assert_eq!(t.release(), None);
    }

    #[test]
    fn cancel_drops_the_drag() {
        let g = board();
        let mut t = GestureTracker::new();
        t.begin(&g, 1, 1).unwrap();
        t.cancel();
        assert!(t.drag().is_none());
        assert_eq!(t.release(), None);
    }
}
