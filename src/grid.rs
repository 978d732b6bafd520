//! Board: the chip grid, bounds-checked access and bulk mutations.

use crate::anim::FallingChip;
use crate::error::EngineError;
use rand::Rng;

/// Palette size supported by the theme.
pub const MAX_COLORS: u8 = 6;
/// Fewer colours than this cannot always avoid runs while generating.
pub const MIN_COLORS: u8 = 3;

/// Single cell: empty, a bomb, or an ordinary chip of a colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chip {
    Empty,
    Bomb,
    Color(u8),
}

impl Chip {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    #[inline]
    pub fn is_bomb(self) -> bool {
        self == Self::Bomb
    }

    /// Ordinary chips are the only ones that form runs.
    #[inline]
    pub fn is_ordinary(self) -> bool {
        matches!(self, Self::Color(_))
    }
}

/// Chip grid. y=0 is the top row; rows are stored [0..height].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    colors: u8,
    /// rows[y][x] = chip.
    rows: Vec<Vec<Chip>>,
}

impl Grid {
    /// All-empty grid. `colors` is clamped to MIN_COLORS..=MAX_COLORS.
    pub fn new(width: usize, height: usize, colors: u8) -> Self {
        Self {
            width,
            height,
            colors: colors.clamp(MIN_COLORS, MAX_COLORS),
            rows: vec![vec![Chip::Empty; width]; height],
        }
    }

    /// Settled random board: no empty cells and no run of three.
    /// Each cell avoids the colour that would complete a run with its two
    /// left or two upper neighbours.
    pub fn generate<R: Rng + ?Sized>(width: usize, height: usize, colors: u8, rng: &mut R) -> Self {
        let mut grid = Self::new(width, height, colors);
        let mut allowed = Vec::with_capacity(MAX_COLORS as usize);
        for y in 0..height {
            for x in 0..width {
                let left = (x >= 2)
                    .then(|| grid.pair_color(grid.rows[y][x - 1], grid.rows[y][x - 2]))
                    .flatten();
                let up = (y >= 2)
                    .then(|| grid.pair_color(grid.rows[y - 1][x], grid.rows[y - 2][x]))
                    .flatten();
                allowed.clear();
                allowed.extend((0..grid.colors).filter(|c| Some(*c) != left && Some(*c) != up));
                let pick = allowed[rng.random_range(0..allowed.len())];
                grid.rows[y][x] = Chip::Color(pick);
            }
        }
        grid
    }

    fn pair_color(&self, a: Chip, b: Chip) -> Option<u8> {
        match (a, b) {
            (Chip::Color(a), Chip::Color(b)) if a == b => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn colors(&self) -> u8 {
        self.colors
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// `None` when (x, y) is off the board.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Chip> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, chip: Chip) -> Result<(), EngineError> {
        let cell = self
            .rows
            .get_mut(y)
            .and_then(|row| row.get_mut(x))
            .ok_or(EngineError::OutOfBounds { x, y })?;
        *cell = chip;
        Ok(())
    }

    /// Empty the cell and return what it held.
    pub fn take(&mut self, x: usize, y: usize) -> Option<Chip> {
        self.rows
            .get_mut(y)
            .and_then(|row| row.get_mut(x))
            .map(|cell| std::mem::replace(cell, Chip::Empty))
    }

    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) -> Result<(), EngineError> {
        let chip_a = self.get(a.0, a.1).ok_or(EngineError::OutOfBounds { x: a.0, y: a.1 })?;
        let chip_b = self.get(b.0, b.1).ok_or(EngineError::OutOfBounds { x: b.0, y: b.1 })?;
        self.rows[a.1][a.0] = chip_b;
        self.rows[b.1][b.0] = chip_a;
        Ok(())
    }

    /// Empties every in-bounds cell in `coords`; returns how many held a chip.
    pub fn clear_cells<I>(&mut self, coords: I) -> usize
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        coords
            .into_iter()
            .filter_map(|(x, y)| self.take(x, y))
            .filter(|chip| !chip.is_empty())
            .count()
    }

    /// Writes `chip` into the rectangle [x0, x1) × [y0, y1), clipped to the board.
    #[cfg(test)]
    pub fn fill_region(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, chip: Chip) {
        for row in self.rows.iter_mut().take(y1.min(self.height)).skip(y0) {
            for cell in row.iter_mut().take(x1.min(self.width)).skip(x0) {
                *cell = chip;
            }
        }
    }

    /// Random ordinary chip; never a bomb.
    pub fn random_chip<R: Rng + ?Sized>(&self, rng: &mut R) -> Chip {
        Chip::Color(rng.random_range(0..self.colors))
    }

    /// Stable downward compaction of column `x`.
    ///
    /// Every chip that moves is recorded with its (source, target) rows. The
    /// `n` vacated top cells get fresh random chips, each recorded as falling
    /// from `target - n`, so a spawned stack starts just above the board.
    pub fn compact_column<R: Rng + ?Sized>(&mut self, x: usize, rng: &mut R) -> Vec<FallingChip> {
        let mut falls = Vec::new();
        if x >= self.width {
            return falls;
        }
        let mut write = self.height;
        for y in (0..self.height).rev() {
            let chip = self.rows[y][x];
            if chip.is_empty() {
                continue;
            }
            write -= 1;
            if write != y {
                self.rows[write][x] = chip;
                self.rows[y][x] = Chip::Empty;
                falls.push(FallingChip::new(x, chip, y as i32, write));
            }
        }
        let spawned = write;
        for target in (0..spawned).rev() {
            let chip = self.random_chip(rng);
            self.rows[target][x] = chip;
            falls.push(FallingChip::new(x, chip, target as i32 - spawned as i32, target));
        }
        falls
    }

    /// `compact_column` for every column, once.
    pub fn compact_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<FallingChip> {
        (0..self.width)
            .flat_map(|x| self.compact_column(x, rng))
            .collect()
    }

    #[cfg(test)]
    pub fn empty_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|chip| chip.is_empty())
            .count()
    }

    #[cfg(test)]
    pub fn column(&self, x: usize) -> Vec<Chip> {
        self.rows.iter().filter_map(|row| row.get(x).copied()).collect()
    }

    /// Text fixture: one string per row. `A`..`F` are colours 0..5, `*` is a
    /// bomb, `.` is empty.
    #[cfg(test)]
    pub(crate) fn from_text(lines: &[&str]) -> Self {
        let height = lines.len();
        let width = lines.first().map_or(0, |l| l.len());
        let mut grid = Self::new(width, height, MAX_COLORS);
        for (y, line) in lines.iter().enumerate() {
            assert_eq!(line.len(), width, "ragged fixture row {y}");
            for (x, ch) in line.chars().enumerate() {
                grid.rows[y][x] = match ch {
                    '.' => Chip::Empty,
                    '*' => Chip::Bomb,
                    c @ 'A'..='F' => Chip::Color(c as u8 - b'A'),
                    other => panic!("bad fixture char {other:?}"),
                };
            }
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::detect;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn out_of_range_get_is_none_and_set_fails() {
        let mut g = Grid::new(3, 2, 6);
        assert_eq!(g.get(3, 0), None);
        assert_eq!(g.get(0, 2), None);
        assert_eq!(g.get(usize::MAX, 0), None);
        assert_eq!(g.set(5, 5, Chip::Bomb), Err(EngineError::OutOfBounds { x: 5, y: 5 }));
        assert_eq!(g.set(2, 1, Chip::Bomb), Ok(()));
        assert_eq!(g.get(2, 1), Some(Chip::Bomb));
    }

    #[test]
    fn swap_and_clear_cells() {
        let mut g = Grid::from_text(&["AB", "C*"]);
        g.swap((0, 0), (1, 1)).unwrap();
        assert_eq!(g.get(0, 0), Some(Chip::Bomb));
        assert_eq!(g.get(1, 1), Some(Chip::Color(0)));
        assert!(g.swap((0, 0), (2, 0)).is_err());
        assert_eq!(g.clear_cells([(0, 0), (1, 0), (9, 9)]), 2);
        assert_eq!(g.empty_count(), 2);
        // Clearing twice counts nothing new.
        assert_eq!(g.clear_cells([(0, 0)]), 0);
    }

    #[test]
    fn fill_region_is_clipped() {
        let mut g = Grid::new(3, 3, 6);
        g.fill_region(1, 1, 10, 10, Chip::Color(2));
        assert_eq!(g.empty_count(), 5);
        assert_eq!(g.get(2, 2), Some(Chip::Color(2)));
        assert_eq!(g.get(0, 2), Some(Chip::Empty));
    }

    #[test]
    fn compact_column_keeps_order_and_spawns_above() {
        let mut g = Grid::from_text(&["A", ".", "B", ".", "C"]);
        let mut rng = SmallRng::seed_from_u64(7);
        let falls = g.compact_column(0, &mut rng);

        // A and B shift down, C stays put.
        assert_eq!(g.get(0, 2), Some(Chip::Color(0)));
        assert_eq!(g.get(0, 3), Some(Chip::Color(1)));
        assert_eq!(g.get(0, 4), Some(Chip::Color(2)));
        assert_eq!(g.empty_count(), 0);

        let moved: Vec<_> = falls.iter().filter(|f| f.source_row >= 0).collect();
        assert_eq!(moved.len(), 2);
        assert!(moved.iter().any(|f| f.source_row == 2 && f.target_row == 3));
        assert!(moved.iter().any(|f| f.source_row == 0 && f.target_row == 2));

        let mut spawned: Vec<_> = falls
            .iter()
            .filter(|f| f.source_row < 0)
            .map(|f| (f.source_row, f.target_row))
            .collect();
        spawned.sort();
        assert_eq!(spawned, vec![(-2, 0), (-1, 1)]);
        for f in &falls {
            assert!(!f.chip.is_bomb());
        }
    }

    #[test]
    fn compact_full_column_records_nothing() {
        let mut g = Grid::from_text(&["A", "B", "*"]);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(g.compact_column(0, &mut rng).is_empty());
        assert_eq!(g.column(0), vec![Chip::Color(0), Chip::Color(1), Chip::Bomb]);
    }

    #[test]
    fn compact_out_of_range_column_is_noop() {
        let mut g = Grid::new(2, 2, 6);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(g.compact_column(2, &mut rng).is_empty());
        assert_eq!(g.empty_count(), 4);
    }

    proptest! {
        #[test]
        fn generated_boards_are_settled(
            seed in any::<u64>(),
            width in 1usize..12,
            height in 1usize..12,
            colors in 3u8..=6,
        ) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let g = Grid::generate(width, height, colors, &mut rng);
            prop_assert_eq!(g.empty_count(), 0);
            prop_assert!(detect(&g).is_empty());
        }

        #[test]
        fn compaction_conserves_existing_chips(
            seed in any::<u64>(),
            cells in proptest::collection::vec(proptest::option::of(0u8..6), 1..16),
        ) {
            let height = cells.len();
            let mut g = Grid::new(1, height, 6);
            for (y, c) in cells.iter().enumerate() {
                g.set(0, y, c.map_or(Chip::Empty, Chip::Color)).unwrap();
            }
            let before: Vec<Chip> = g.column(0).into_iter().filter(|c| !c.is_empty()).collect();
            let spawned = height - before.len();

            let mut rng = SmallRng::seed_from_u64(seed);
            let falls = g.compact_column(0, &mut rng);

            let after = g.column(0);
            prop_assert_eq!(after.len(), height);
            prop_assert_eq!(&after[spawned..], &before[..]);
            prop_assert!(after.iter().all(|c| c.is_ordinary()));
            prop_assert_eq!(falls.iter().filter(|f| f.source_row < 0).count(), spawned);
        }
    }
}
