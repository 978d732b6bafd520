//! Flattens the board and its overlays into a draw list.
//!
//! Sprites are in cell coordinates (fractional while moving) and come out
//! back to front. A cell covered by an overlay is not also drawn from the
//! grid.

use crate::anim::Vanishing;
use crate::game::Game;
use crate::grid::Chip;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Look {
    Resting,
    /// Pulsing before fading; `big` for chips from runs of four or more.
    Flash { progress: f32, big: bool },
    Fade { progress: f32 },
    Blast { progress: f32 },
    Falling,
    Dragged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub chip: Chip,
    pub look: Look,
}

pub fn compose(game: &Game) -> Vec<Sprite> {
    let grid = game.grid();
    let cascade = game.cascade();
    let drag = game.drag();

    let mut covered: HashSet<(usize, usize)> = cascade
        .falling()
        .iter()
        .map(|f| (f.column, f.target_row))
        .collect();
    covered.extend(cascade.vanishing().iter().map(Vanishing::position));
    if let Some(d) = drag {
        covered.insert(d.origin);
    }

    let mut sprites = Vec::with_capacity(grid.width() * grid.height() + 1);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if covered.contains(&(x, y)) {
                continue;
            }
            match grid.get(x, y) {
                Some(chip) if !chip.is_empty() => sprites.push(Sprite {
                    x: x as f32,
                    y: y as f32,
                    chip,
                    look: Look::Resting,
                }),
                _ => {}
            }
        }
    }

    for v in cascade.vanishing() {
        let (x, y) = v.position();
        let look = match v {
            Vanishing::Flashing(f) => Look::Flash {
                progress: f.progress,
                big: f.run_len >= 4,
            },
            Vanishing::Fading(f) => Look::Fade { progress: f.progress },
            Vanishing::Blast(b) => Look::Blast { progress: b.progress },
        };
        sprites.push(Sprite {
            x: x as f32,
            y: y as f32,
            chip: v.chip(),
            look,
        });
    }

    sprites.extend(cascade.falling().iter().map(|f| Sprite {
        x: f.column as f32,
        y: f.row(),
        chip: f.chip,
        look: Look::Falling,
    }));

    if let Some(d) = drag {
        sprites.push(Sprite {
            x: d.origin.0 as f32 + d.offset.0,
            y: d.origin.1 as f32 + d.offset.1,
            chip: d.grabbed,
            look: Look::Dragged,
        });
    }
    sprites
}
