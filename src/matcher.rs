//! Run detection: rows and columns of three or more identical ordinary chips.
//!
//! A run of exactly four leaves a bomb behind at its lower-middle cell; runs
//! of three or five-plus are cleared outright.

use crate::grid::{Chip, Grid};

pub const MIN_RUN: usize = 3;
/// Only runs of exactly this length spawn a bomb.
pub const BOMB_RUN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Cleared with a flash/fade animation.
    Ordinary,
    /// Replaced by a bomb immediately.
    BombSpawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedCell {
    pub x: usize,
    pub y: usize,
    pub run_len: usize,
    pub kind: MatchKind,
}

/// Result of one detection pass, in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    cells: Vec<MatchedCell>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[MatchedCell] {
        &self.cells
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<&MatchedCell> {
        self.cells.iter().find(|c| c.x == x && c.y == y)
    }

    pub fn bomb_spawns(&self) -> impl Iterator<Item = &MatchedCell> {
        self.cells.iter().filter(|c| c.kind == MatchKind::BombSpawn)
    }

    pub fn ordinary_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.kind == MatchKind::Ordinary)
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
struct Tag {
    run_len: usize,
    kind: MatchKind,
}

/// Scan every row, then every column.
pub fn detect(grid: &Grid) -> MatchResult {
    let (w, h) = (grid.width(), grid.height());
    let mut tags: Vec<Option<Tag>> = vec![None; w * h];

    for y in 0..h {
        for_each_run(w, |x| grid.get(x, y), |start, end| {
            for (x, tag) in run_tags(start, end) {
                merge(&mut tags[y * w + x], tag);
            }
        });
    }
    for x in 0..w {
        for_each_run(h, |y| grid.get(x, y), |start, end| {
            for (y, tag) in run_tags(start, end) {
                merge(&mut tags[y * w + x], tag);
            }
        });
    }

    let cells = tags
        .iter()
        .enumerate()
        .filter_map(|(i, tag)| {
            tag.map(|t| MatchedCell {
                x: i % w,
                y: i / w,
                run_len: t.run_len,
                kind: t.kind,
            })
        })
        .collect();
    MatchResult { cells }
}

/// Single sweep with run-length counting. A run closes when the chip
/// changes, a non-ordinary cell is hit, or the line ends; `on_run(start, end)`
/// (end exclusive) fires for every closed run of MIN_RUN or more.
fn for_each_run(
    len: usize,
    at: impl Fn(usize) -> Option<Chip>,
    mut on_run: impl FnMut(usize, usize),
) {
    let mut start = 0;
    for i in 1..=len {
        let closes = i == len || {
            let cur = at(i);
            cur != at(i - 1) || !cur.is_some_and(Chip::is_ordinary)
        };
        if closes {
            if i - start >= MIN_RUN && at(start).is_some_and(Chip::is_ordinary) {
                on_run(start, i);
            }
            start = i;
        }
    }
}

fn run_tags(start: usize, end: usize) -> impl Iterator<Item = (usize, Tag)> {
    let run_len = end - start;
    let bomb_at = (run_len == BOMB_RUN).then_some((start + end - 1) / 2);
    (start..end).map(move |i| {
        let kind = if Some(i) == bomb_at {
            MatchKind::BombSpawn
        } else {
            MatchKind::Ordinary
        };
        (i, Tag { run_len, kind })
    })
}

/// Row tags land first. A later tag only fills an untagged cell, or upgrades
/// an ordinary cell to a bomb spawn; an existing bomb spawn is never replaced.
fn merge(slot: &mut Option<Tag>, tag: Tag) {
    match *slot {
        None => *slot = Some(tag),
        Some(prev) if prev.kind == MatchKind::Ordinary && tag.kind == MatchKind::BombSpawn => {
            *slot = Some(tag);
        }
        Some(_) => {}
    }
}
