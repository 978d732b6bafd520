//! Cascade sequencer: the phase machine that drives
//! flash → fade → gravity → re-check, and bomb blasts.
//!
//! The machine owns no thread and does no scheduling; the caller advances it
//! once per logic tick. Grid writes happen at phase entry, so the grid always
//! holds the *next* settled state while the overlays describe what to draw.

use crate::anim::{AnimationSteps, FallingChip, Vanishing};
use crate::error::EngineError;
use crate::explosion;
use crate::grid::{Chip, Grid};
use crate::matcher::{self, MatchKind, MatchResult};
use log::debug;
use rand::Rng;

/// Pause between a blast and its animation, and between landing and re-check.
pub const BEAT_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig {
    pub steps: AnimationSteps,
    /// Length of a beat in ticks.
    pub beat_ticks: u32,
}

impl CascadeConfig {
    /// Beat length for a logic tick rate (ticks per second).
    pub fn for_tick_rate(tick_rate: f64) -> Self {
        let beat_ticks = (tick_rate.max(0.0) * BEAT_MS as f64 / 1000.0).round() as u32;
        Self {
            steps: AnimationSteps::default(),
            beat_ticks,
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self::for_tick_rate(60.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Blast already cleared; waiting a beat before its animation plays.
    BlastBeat { ticks_left: u32 },
    Disappearing,
    Falling,
    /// Everything landed; waiting a beat before the next match check.
    RecheckBeat { ticks_left: u32 },
}

/// Notifications for counters and audio; the sequencer never calls out itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeEvent {
    PowerUpFormed { x: usize, y: usize },
    BombDetonated { x: usize, y: usize },
    ChipDestroyed(Chip),
    ChipsRemoved { count: u32, chain: u32 },
    /// Back to Idle after `chain` rounds.
    Settled { chain: u32 },
}

#[derive(Debug, Clone)]
pub struct CascadeSequencer {
    config: CascadeConfig,
    phase: Phase,
    vanishing: Vec<Vanishing>,
    falling: Vec<FallingChip>,
    detonating: bool,
    /// Resolution rounds since the triggering action (1-based while active).
    chain: u32,
}

impl CascadeSequencer {
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            vanishing: Vec::new(),
            falling: Vec::new(),
            detonating: false,
            chain: 0,
        }
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn is_detonating(&self) -> bool {
        self.detonating
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn vanishing(&self) -> &[Vanishing] {
        &self.vanishing
    }

    pub fn falling(&self) -> &[FallingChip] {
        &self.falling
    }

    /// Start a cascade from a player swap. An empty result is a no-op.
    pub fn begin(&mut self, grid: &mut Grid, result: &MatchResult) -> Result<Vec<CascadeEvent>, EngineError> {
        if !self.is_idle() {
            return Err(EngineError::Busy);
        }
        if result.is_empty() {
            return Ok(Vec::new());
        }
        self.chain = 1;
        Ok(self.resolve(grid, result))
    }

    /// Blow up the bomb at (x, y): clear its blast now, animate after a beat.
    pub fn detonate(&mut self, grid: &mut Grid, x: usize, y: usize) -> Result<Vec<CascadeEvent>, EngineError> {
        if self.is_detonating() {
            return Err(EngineError::DetonationInFlight);
        }
        if !self.is_idle() {
            return Err(EngineError::Busy);
        }
        let cleared = explosion::resolve(grid, x, y)?;
        debug!("detonation at ({x}, {y}) cleared {} chips", cleared.len());

        self.detonating = true;
        self.chain = 1;
        let mut events = Vec::with_capacity(cleared.len() + 2);
        events.push(CascadeEvent::BombDetonated { x, y });
        events.extend(cleared.iter().map(|c| CascadeEvent::ChipDestroyed(c.chip)));
        // Bombs caught in the blast, the detonated one included, score nothing.
        events.push(CascadeEvent::ChipsRemoved {
            count: cleared.iter().filter(|c| c.chip.is_ordinary()).count() as u32,
            chain: self.chain,
        });
        self.vanishing = cleared
            .into_iter()
            .map(|c| Vanishing::blast(c.x, c.y, c.chip))
            .collect();
        self.phase = Phase::BlastBeat {
            ticks_left: self.config.beat_ticks,
        };
        Ok(events)
    }

    /// Apply a match result: ordinary cells are emptied and start flashing,
    /// bomb-spawn cells become bombs at once.
    fn resolve(&mut self, grid: &mut Grid, result: &MatchResult) -> Vec<CascadeEvent> {
        let mut events = Vec::with_capacity(result.ordinary_count() + 1);
        let mut flashing = Vec::with_capacity(result.ordinary_count());
        for cell in result.cells() {
            match cell.kind {
                MatchKind::Ordinary => {
                    if let Some(chip) = grid.get(cell.x, cell.y).filter(|c| !c.is_empty()) {
                        flashing.push(Vanishing::flashing(cell.x, cell.y, chip, cell.run_len));
                        events.push(CascadeEvent::ChipDestroyed(chip));
                    }
                }
                MatchKind::BombSpawn => {
                    if grid.set(cell.x, cell.y, Chip::Bomb).is_ok() {
                        events.push(CascadeEvent::PowerUpFormed {
                            x: cell.x,
                            y: cell.y,
                        });
                    }
                }
            }
        }
        let removed = grid.clear_cells(flashing.iter().map(Vanishing::position)) as u32;
        self.vanishing.extend(flashing);
        events.push(CascadeEvent::ChipsRemoved {
            count: removed,
            chain: self.chain,
        });
        debug!(
            "round {}: {removed} chips removed, {} bombs formed",
            self.chain,
            result.bomb_spawns().count()
        );
        self.phase = Phase::Disappearing;
        events
    }

    /// Advance one tick.
    pub fn tick<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> Vec<CascadeEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Idle => {}
            Phase::BlastBeat { ticks_left } => {
                let left = ticks_left.saturating_sub(1);
                self.phase = if left == 0 {
                    Phase::Disappearing
                } else {
                    Phase::BlastBeat { ticks_left: left }
                };
            }
            Phase::Disappearing => {
                if !self.vanishing.is_empty() {
                    let steps = self.config.steps;
                    self.vanishing = std::mem::take(&mut self.vanishing)
                        .into_iter()
                        .filter_map(|chip| chip.advance(&steps))
                        .collect();
                }
                if self.vanishing.is_empty() {
                    self.detonating = false;
                    self.falling = grid.compact_all(rng);
                    debug!("gravity: {} chips falling", self.falling.len());
                    self.phase = Phase::Falling;
                }
            }
            Phase::Falling => {
                let step = self.config.steps.fall;
                for chip in &mut self.falling {
                    chip.advance(step);
                }
                if self.falling.iter().all(FallingChip::landed) {
                    self.falling.clear();
                    self.phase = Phase::RecheckBeat {
                        ticks_left: self.config.beat_ticks,
                    };
                }
            }
            Phase::RecheckBeat { ticks_left } => {
                let left = ticks_left.saturating_sub(1);
                if left == 0 {
                    self.recheck(grid, &mut events);
                } else {
                    self.phase = Phase::RecheckBeat { ticks_left: left };
                }
            }
        }
        events
    }

    fn recheck(&mut self, grid: &mut Grid, events: &mut Vec<CascadeEvent>) {
        let result = matcher::detect(grid);
        if result.is_empty() {
            debug!("settled after {} rounds", self.chain);
            events.push(CascadeEvent::Settled { chain: self.chain });
            self.chain = 0;
            self.phase = Phase::Idle;
        } else {
            self.chain += 1;
            events.extend(self.resolve(grid, &result));
        }
    }
}

impl Default for CascadeSequencer {
    fn default() -> Self {
        Self::new(CascadeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::detect;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const TICK_LIMIT: usize = 100_000;

    fn run_to_idle(seq: &mut CascadeSequencer, grid: &mut Grid, rng: &mut SmallRng) -> Vec<CascadeEvent> {
        let mut events = Vec::new();
        for _ in 0..TICK_LIMIT {
            if seq.is_idle() {
                return events;
            }
            events.extend(seq.tick(grid, rng));
        }
        panic!("cascade did not settle");
    }

    fn quad_board() -> Grid {
        // Column 2 rows 1..5 is a quad: bomb at (2, 2).
        Grid::from_text(&[
            "ABCD", //
            "BCAE", //
            "CDAB", //
            "DEAC", //
            "EFAD", //
            "FABE", //
        ])
    }

    #[test]
    fn resolving_clears_ordinary_cells_and_places_bomb_instantly() {
        let mut g = quad_board();
        let mut seq = CascadeSequencer::default();
        let result = detect(&g);
        let events = seq.begin(&mut g, &result).unwrap();

        assert_eq!(seq.phase(), Phase::Disappearing);
        assert_eq!(g.get(2, 2), Some(Chip::Bomb));
        for y in [1, 3, 4] {
            assert_eq!(g.get(2, y), Some(Chip::Empty));
        }
        assert_eq!(seq.vanishing().len(), 3);
        assert!(seq.vanishing().iter().all(|v| matches!(v, Vanishing::Flashing(f) if f.run_len == 4)));
        assert!(events.contains(&CascadeEvent::PowerUpFormed { x: 2, y: 2 }));
        assert!(events.contains(&CascadeEvent::ChipsRemoved { count: 3, chain: 1 }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, CascadeEvent::ChipDestroyed(Chip::Color(0))))
                .count(),
            3
        );
    }

    #[test]
    fn phases_follow_legal_transitions_and_settle() {
        let mut g = quad_board();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seq = CascadeSequencer::default();
        let result = detect(&g);
        seq.begin(&mut g, &result).unwrap();

        let coarse = |p: Phase| match p {
            Phase::RecheckBeat { .. } => Phase::RecheckBeat { ticks_left: 0 },
            Phase::BlastBeat { .. } => Phase::BlastBeat { ticks_left: 0 },
            other => other,
        };
        let mut seen = vec![coarse(seq.phase())];
        let mut settled = 0;
        for _ in 0..TICK_LIMIT {
            let events = seq.tick(&mut g, &mut rng);
            settled += events
                .iter()
                .filter(|e| matches!(e, CascadeEvent::Settled { .. }))
                .count();
            let phase = coarse(seq.phase());
            if seen.last() != Some(&phase) {
                seen.push(phase);
            }
            if seq.is_idle() {
                break;
            }
        }

        let recheck = Phase::RecheckBeat { ticks_left: 0 };
        assert_eq!(&seen[..3], &[Phase::Disappearing, Phase::Falling, recheck]);
        assert_eq!(seen.last(), Some(&Phase::Idle));
        for pair in seen.windows(2) {
            let legal = matches!(
                (pair[0], pair[1]),
                (Phase::Disappearing, Phase::Falling)
                    | (Phase::Falling, Phase::RecheckBeat { .. })
                    | (Phase::RecheckBeat { .. }, Phase::Disappearing)
                    | (Phase::RecheckBeat { .. }, Phase::Idle)
            );
            assert!(legal, "illegal transition {:?} -> {:?}", pair[0], pair[1]);
        }
        assert_eq!(settled, 1);
        assert_eq!(seq.chain(), 0);
        assert_eq!(g.empty_count(), 0);
        assert!(detect(&g).is_empty());
    }

    #[test]
    fn grid_is_full_while_chips_fall() {
        let mut g = quad_board();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut seq = CascadeSequencer::default();
        let result = detect(&g);
        seq.begin(&mut g, &result).unwrap();
        while seq.phase() == Phase::Disappearing {
            seq.tick(&mut g, &mut rng);
        }
        assert_eq!(seq.phase(), Phase::Falling);
        assert_eq!(g.empty_count(), 0);
        // Column 2 lost three chips: the new bomb drops to row 4, the top
        // chip to row 3, and three fresh chips come in from above the board.
        let falling = seq.falling();
        assert!(falling.iter().all(|f| f.column == 2));
        assert_eq!(falling.iter().filter(|f| f.source_row < 0).count(), 3);
        assert!(falling.iter().any(|f| f.chip == Chip::Bomb && (f.source_row, f.target_row) == (2, 4)));
        assert!(falling.iter().any(|f| (f.source_row, f.target_row) == (0, 3)));
        assert_eq!(g.get(2, 4), Some(Chip::Bomb));
        assert_eq!(g.get(2, 5), Some(Chip::Color(1)));
    }

    #[test]
    fn empty_disappearing_set_moves_straight_to_falling() {
        let mut g = quad_board();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut seq = CascadeSequencer::default();
        seq.phase = Phase::Disappearing;
        seq.tick(&mut g, &mut rng);
        assert_eq!(seq.phase(), Phase::Falling);
        assert!(seq.falling().is_empty());
        seq.tick(&mut g, &mut rng);
        assert!(matches!(seq.phase(), Phase::RecheckBeat { .. }));
    }

    #[test]
    fn empty_result_leaves_machine_idle() {
        let mut g = quad_board();
        let before = g.clone();
        let mut seq = CascadeSequencer::default();
        let events = seq.begin(&mut g, &MatchResult::default()).unwrap();
        assert!(events.is_empty());
        assert!(seq.is_idle());
        assert_eq!(g, before);
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut g = quad_board();
        let before = g.clone();
        let mut rng = SmallRng::seed_from_u64(0);
        let mut seq = CascadeSequencer::default();
        assert!(seq.tick(&mut g, &mut rng).is_empty());
        assert_eq!(g, before);
    }

    #[test]
    fn begin_while_busy_is_rejected() {
        let mut g = quad_board();
        let mut seq = CascadeSequencer::default();
        let result = detect(&g);
        seq.begin(&mut g, &result).unwrap();
        assert_eq!(seq.begin(&mut g, &result), Err(EngineError::Busy));
    }

    fn bomb_board() -> Grid {
        Grid::from_text(&[
            "ABCDEFAB", //
            "BCDEFABC", //
            "CDEFABCD", //
            "DEFABCDE", //
            "EFAB*DEF", //
            "FABCDEFA", //
            "ABCDEFAB", //
            "BCDEFABC", //
        ])
    }

    #[test]
    fn detonation_clears_blast_then_waits_a_beat() {
        let mut g = bomb_board();
        let mut rng = SmallRng::seed_from_u64(9);
        let config = CascadeConfig::for_tick_rate(60.0);
        assert_eq!(config.beat_ticks, 6);
        let mut seq = CascadeSequencer::new(config);

        let events = seq.detonate(&mut g, 4, 4).unwrap();
        assert_eq!(events[0], CascadeEvent::BombDetonated { x: 4, y: 4 });
        assert!(events.contains(&CascadeEvent::ChipsRemoved { count: 8, chain: 1 }));
        assert_eq!(g.empty_count(), 9);
        assert_eq!(seq.vanishing().len(), 9);
        assert!(seq.vanishing().iter().all(|v| matches!(v, Vanishing::Blast(_))));
        assert!(seq.is_detonating());

        for _ in 0..5 {
            seq.tick(&mut g, &mut rng);
            assert!(matches!(seq.phase(), Phase::BlastBeat { .. }));
            assert!(seq.vanishing().iter().all(|v| v.progress() == 0.0));
        }
        seq.tick(&mut g, &mut rng);
        assert_eq!(seq.phase(), Phase::Disappearing);
    }

    #[test]
    fn landing_waits_a_beat_before_the_next_check() {
        let mut g = bomb_board();
        let mut rng = SmallRng::seed_from_u64(4);
        let config = CascadeConfig::for_tick_rate(60.0);
        let mut seq = CascadeSequencer::new(config);
        seq.detonate(&mut g, 4, 4).unwrap();

        for _ in 0..TICK_LIMIT {
            if matches!(seq.phase(), Phase::RecheckBeat { .. }) {
                break;
            }
            seq.tick(&mut g, &mut rng);
        }
        assert_eq!(seq.phase(), Phase::RecheckBeat { ticks_left: config.beat_ticks });

        let landed = g.clone();
        for _ in 1..config.beat_ticks {
            assert!(seq.tick(&mut g, &mut rng).is_empty());
            assert!(matches!(seq.phase(), Phase::RecheckBeat { .. }));
            assert_eq!(g, landed);
        }
        seq.tick(&mut g, &mut rng);
        assert!(matches!(seq.phase(), Phase::Idle | Phase::Disappearing));
    }

    #[test]
    fn second_detonation_is_rejected_while_first_in_flight() {
        let mut g = bomb_board();
        g.set(0, 0, Chip::Bomb).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut seq = CascadeSequencer::default();
        seq.detonate(&mut g, 4, 4).unwrap();
        assert_eq!(seq.detonate(&mut g, 0, 0), Err(EngineError::DetonationInFlight));
        assert_eq!(g.get(0, 0), Some(Chip::Bomb));

        run_to_idle(&mut seq, &mut g, &mut rng);
        assert!(!seq.is_detonating());
        assert_eq!(g.empty_count(), 0);
        assert!(detect(&g).is_empty());
    }

    #[test]
    fn detonation_off_board_is_rejected_without_side_effects() {
        let mut g = bomb_board();
        let mut seq = CascadeSequencer::default();
        assert_eq!(seq.detonate(&mut g, 8, 8), Err(EngineError::OutOfBounds { x: 8, y: 8 }));
        assert!(seq.is_idle());
        assert!(!seq.is_detonating());
    }

    #[test]
    fn zero_beat_still_takes_one_tick() {
        let mut g = bomb_board();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut seq = CascadeSequencer::new(CascadeConfig {
            steps: AnimationSteps::default(),
            beat_ticks: 0,
        });
        seq.detonate(&mut g, 4, 4).unwrap();
        seq.tick(&mut g, &mut rng);
        assert_eq!(seq.phase(), Phase::Disappearing);
    }

    /// First adjacent swap on `grid` that produces a match, applied.
    fn apply_matching_swap(grid: &mut Grid) -> Option<MatchResult> {
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                    if !grid.in_bounds(nx, ny) {
                        continue;
                    }
                    grid.swap((x, y), (nx, ny)).unwrap();
                    let result = detect(grid);
                    if !result.is_empty() {
                        return Some(result);
                    }
                    grid.swap((x, y), (nx, ny)).unwrap();
                }
            }
        }
        None
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_cascade_settles_legally(seed in any::<u64>(), size in 4usize..10) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut g = Grid::generate(size, size, 5, &mut rng);
            if let Some(result) = apply_matching_swap(&mut g) {
                let mut seq = CascadeSequencer::default();
                seq.begin(&mut g, &result).unwrap();
                let events = run_to_idle(&mut seq, &mut g, &mut rng);
                prop_assert_eq!(g.empty_count(), 0);
                prop_assert!(detect(&g).is_empty());
                let settled: Vec<_> = events
                    .iter()
                    .filter_map(|e| match e {
                        CascadeEvent::Settled { chain } => Some(*chain),
                        _ => None,
                    })
                    .collect();
                prop_assert_eq!(settled.len(), 1);
                prop_assert!(settled[0] >= 1);
            }
        }
    }
}
