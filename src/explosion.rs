//! Bomb blast: clears the 3×3 neighbourhood around a bomb.

use crate::error::EngineError;
use crate::grid::{Chip, Grid};

/// Cells on each side of the bomb that the blast reaches.
pub const BLAST_RADIUS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedChip {
    pub x: usize,
    pub y: usize,
    pub chip: Chip,
}

/// Cells of the blast around (x, y), clipped to the board, in row-major order.
fn blast_area(grid: &Grid, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    let (w, h) = (grid.width(), grid.height());
    let xs = x.saturating_sub(BLAST_RADIUS)..(x + BLAST_RADIUS + 1).min(w);
    let ys = y.saturating_sub(BLAST_RADIUS)..(y + BLAST_RADIUS + 1).min(h);
    ys.flat_map(move |ny| xs.clone().map(move |nx| (nx, ny)))
}

/// Clears every non-empty cell of the blast, the bomb itself included.
/// Other bombs caught in it are cleared like any chip; they do not chain.
pub fn resolve(grid: &mut Grid, x: usize, y: usize) -> Result<Vec<ClearedChip>, EngineError> {
    if !grid.in_bounds(x, y) {
        return Err(EngineError::OutOfBounds { x, y });
    }
    let area: Vec<_> = blast_area(grid, x, y).collect();
    let cleared = area
        .into_iter()
        .filter_map(|(nx, ny)| {
            grid.take(nx, ny)
                .filter(|chip| !chip.is_empty())
                .map(|chip| ClearedChip { x: nx, y: ny, chip })
        })
        .collect();
    Ok(cleared)
}
