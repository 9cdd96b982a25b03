use std::sync::Arc;

use bevy::math::UVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::simulation::config::{LifeConfig, MAX_TICKS_PER_GENERATION};
use crate::simulation::error::GeometryError;
use crate::simulation::grid::{Grid, Topology};
use crate::simulation::pattern::Pattern;
use crate::simulation::rule::{ALIVE, DEAD, Rule, RuleCheck, check_b3s23};

/// Live cells older than this many generations are drawn as "old".
pub const OLD_AGE: u64 = 50;

/// Render classification of a cell for evolution traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeClass {
    Alive,
    Old,
    Age1,
    Age2,
    Age3,
    Age4,
    /// Dead and never changed since the last reset.
    Untouched,
}

/// Double-buffered Game-of-Life simulation on a fixed grid.
///
/// `buffers[active]` is the current generation. A generation reads only
/// the active buffer and writes only the other one, so rows can be
/// evaluated in parallel; the swap happens after every row is done.
#[derive(Clone, Debug)]
pub struct Simulation {
    buffers: [Grid; 2],
    active: usize,
    rule: Rule,
    generation: u64,
    // Generation at which each cell last changed state.
    age_history: Vec<u64>,
    ticks_per_generation: u32,
    ticks_elapsed: u32,
    run_one_step: bool,
    paused: bool,
    parallel: bool,
}

impl Simulation {
    /// Builds the simulation from a resolved config, seeding the random
    /// fill from `config.seed` when set.
    pub fn new(config: &LifeConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_rng(config, &mut StdRng::seed_from_u64(seed)),
            None => Self::with_rng(config, &mut rand::rng()),
        }
    }

    pub fn with_rng<R: Rng>(config: &LifeConfig, rng: &mut R) -> Self {
        let (buffers, age_history) = Self::fresh_buffers(config, rng);
        Self {
            buffers,
            active: 0,
            rule: config.rule.clone(),
            generation: 0,
            age_history,
            ticks_per_generation: config.ticks_per_generation.max(1),
            ticks_elapsed: 0,
            run_one_step: false,
            paused: config.paused,
            parallel: config.parallel,
        }
    }

    /// Wraps an existing grid. Evaluates every tick and in parallel.
    pub fn from_grid(grid: Grid, rule: Rule) -> Self {
        let next = Grid::with_topology(grid.topology().clone(), grid.density(), true);
        let age_history = vec![0; grid.cells().len()];
        Self {
            buffers: [grid, next],
            active: 0,
            rule,
            generation: 0,
            age_history,
            ticks_per_generation: 1,
            ticks_elapsed: 0,
            run_one_step: false,
            paused: false,
            parallel: true,
        }
    }

    fn fresh_buffers<R: Rng>(config: &LifeConfig, rng: &mut R) -> ([Grid; 2], Vec<u64>) {
        let topology = Arc::new(Topology::new(config.width, config.height, config.wrap));
        let mut current = Grid::with_topology(topology.clone(), config.density, config.empty);
        let next = Grid::with_topology(topology, config.density, true);

        current.fill_random(rng);
        if let Some(pattern) = &config.pattern {
            current.load_pattern(pattern);
        }
        if let Some(state) = &config.state {
            for (y, row) in state.rows().enumerate() {
                for (x, &cell) in row.iter().enumerate() {
                    current.set(x, y, cell != 0);
                }
            }
        }

        let age_history = vec![0; current.cells().len()];
        ([current, next], age_history)
    }

    /// Throws away all state and rebuilds the grids from `config`.
    pub fn reset<R: Rng>(&mut self, config: &LifeConfig, rng: &mut R) {
        let (buffers, age_history) = Self::fresh_buffers(config, rng);
        self.buffers = buffers;
        self.age_history = age_history;
        self.active = 0;
        self.rule = config.rule.clone();
        self.generation = 0;
        self.ticks_elapsed = 0;
        self.run_one_step = false;
    }

    /// One host tick. Runs a generation every `ticks_per_generation`
    /// calls unless paused; a requested single step runs even when
    /// paused. Returns whether a generation was computed.
    pub fn tick(&mut self) -> bool {
        if self.paused && !self.run_one_step {
            return false;
        }

        self.ticks_elapsed += 1;
        if self.ticks_elapsed < self.ticks_per_generation {
            return false;
        }

        self.step();
        true
    }

    /// Computes exactly one generation, ignoring pause and throttle.
    pub fn step(&mut self) {
        match self.rule.check_mode() {
            RuleCheck::Standard => self.evolve(check_b3s23),
            RuleCheck::Generic => {
                let (birth, survival) = self.rule.masks();
                self.evolve(move |state, neighbors| {
                    Rule::check_masks(birth, survival, state, neighbors)
                });
            }
        }

        self.active ^= 1;
        self.generation += 1;
        self.ticks_elapsed = 0;
        self.run_one_step = false;
    }

    fn evolve<F>(&mut self, check: F)
    where
        F: Fn(u8, u8) -> u8 + Sync,
    {
        let generation = self.generation;
        let (first, second) = self.buffers.split_at_mut(1);
        let (current, next) = if self.active == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        let width = current.width();
        if width == 0 {
            return;
        }

        if self.parallel {
            next.cells_mut()
                .par_chunks_mut(width)
                .zip(self.age_history.par_chunks_mut(width))
                .enumerate()
                .for_each(|(y, (out, ages))| {
                    evolve_row(current, &check, generation, y * width, out, ages)
                });
        } else {
            next.cells_mut()
                .chunks_mut(width)
                .zip(self.age_history.chunks_mut(width))
                .enumerate()
                .for_each(|(y, (out, ages))| {
                    evolve_row(current, &check, generation, y * width, out, ages)
                });
        }
    }

    /// Sets a cell on the current generation. Out of range is ignored, and
    /// a cell already in the requested state keeps its history.
    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool) {
        let state = if alive { ALIVE } else { DEAD };
        let generation = self.generation;
        let grid = &mut self.buffers[self.active];
        match grid.get(x, y) {
            Some(current) if current != state => {
                grid.set(x, y, alive);
                self.age_history[y * grid.width() + x] = generation;
            }
            _ => {}
        }
    }

    /// Flips a cell on the current generation. Out of range is ignored.
    pub fn toggle_cell(&mut self, x: usize, y: usize) {
        let generation = self.generation;
        let grid = &mut self.buffers[self.active];
        if grid.toggle(x, y).is_some() {
            self.age_history[y * grid.width() + x] = generation;
        }
    }

    /// Copies the rectangle spanned by two corners of a drag selection.
    ///
    /// Either corner may come first. The far corner is exclusive, so
    /// corners sharing a row or column describe no area and fail.
    pub fn extract_rect(&self, a: UVec2, b: UVec2) -> Result<Pattern, GeometryError> {
        if a.x == b.x || a.y == b.y {
            return Err(GeometryError::Degenerate);
        }
        let min = a.min(b);
        let size = a.max(b) - min;
        let pattern = self.grid().extract(
            min.x as usize,
            min.y as usize,
            size.x as usize,
            size.y as usize,
        )?;
        Ok(pattern.with_rule(self.rule.definition()))
    }

    /// The current generation's grid.
    pub fn grid(&self) -> &Grid {
        &self.buffers[self.active]
    }

    pub fn width(&self) -> usize {
        self.grid().width()
    }

    pub fn height(&self) -> usize {
        self.grid().height()
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.grid().population()
    }

    pub fn age_history(&self) -> &[u64] {
        &self.age_history
    }

    /// Generation at which `(x, y)` last changed.
    pub fn changed_at(&self, x: usize, y: usize) -> Option<u64> {
        let idx = self.grid().topology().index(x, y)?;
        Some(self.age_history[idx])
    }

    /// Generations since `(x, y)` last changed.
    pub fn age(&self, x: usize, y: usize) -> Option<u64> {
        self.changed_at(x, y).map(|at| self.generation - at)
    }

    pub fn age_class(&self, x: usize, y: usize) -> Option<AgeClass> {
        let idx = self.grid().topology().index(x, y)?;
        Some(classify(
            self.grid().cells()[idx],
            self.generation,
            self.age_history[idx],
        ))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    /// Asks for exactly one more generation, typically while paused.
    pub fn request_step(&mut self) {
        self.run_one_step = true;
    }

    pub fn step_requested(&self) -> bool {
        self.run_one_step
    }

    pub fn ticks_per_generation(&self) -> u32 {
        self.ticks_per_generation
    }

    pub fn set_ticks_per_generation(&mut self, ticks: u32) {
        self.ticks_per_generation = ticks.clamp(1, MAX_TICKS_PER_GENERATION);
    }

    pub fn faster(&mut self) {
        self.set_ticks_per_generation(self.ticks_per_generation.saturating_sub(1));
    }

    pub fn slower(&mut self) {
        self.set_ticks_per_generation(self.ticks_per_generation + 1);
    }
}

#[inline(always)]
fn evolve_row<F>(current: &Grid, check: &F, generation: u64, base: usize, out: &mut [u8], ages: &mut [u64])
where
    F: Fn(u8, u8) -> u8,
{
    let cells = current.cells();
    for (x, (cell, age)) in out.iter_mut().zip(ages.iter_mut()).enumerate() {
        let idx = base + x;
        let state = cells[idx];
        let next = check(state, current.count_neighbors_at(idx));
        *cell = next;
        if next != state {
            *age = generation;
        }
    }
}

/// Trace bands: dead cells fade through four colors by age, live cells
/// turn "old" after [`OLD_AGE`] generations unchanged.
pub fn classify(state: u8, generation: u64, changed_at: u64) -> AgeClass {
    let age = generation - changed_at;
    if state != 0 {
        return if age > OLD_AGE {
            AgeClass::Old
        } else {
            AgeClass::Alive
        };
    }
    if changed_at == 0 {
        return AgeClass::Untouched;
    }
    match age {
        0..10 => AgeClass::Age1,
        10..20 => AgeClass::Age2,
        20..30 => AgeClass::Age3,
        _ => AgeClass::Age4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation(width: usize, height: usize, wrap: bool, live: &[(usize, usize)]) -> Simulation {
        let mut grid = Grid::new(width, height, 1, wrap, true);
        for &(x, y) in live {
            grid.set(x, y, true);
        }
        Simulation::from_grid(grid, Rule::conway())
    }

    #[test]
    fn throttle_waits_for_ticks() {
        let config = LifeConfig::default()
            .size(8, 8)
            .empty(true)
            .ticks_per_generation(3);
        let mut sim = Simulation::new(&config);
        assert!(!sim.tick());
        assert!(!sim.tick());
        assert!(sim.tick());
        assert_eq!(sim.generation(), 1);
        assert!(!sim.tick());
    }

    #[test]
    fn paused_simulation_only_runs_requested_steps() {
        let config = LifeConfig::default().size(8, 8).empty(true).paused(true);
        let mut sim = Simulation::new(&config);
        sim.set_ticks_per_generation(1);
        assert!(!sim.tick());
        sim.request_step();
        assert!(sim.tick());
        assert!(!sim.step_requested());
        assert!(!sim.tick());
        assert_eq!(sim.generation(), 1);
    }

    #[test]
    fn history_stamps_generation_of_change() {
        let mut sim = simulation(5, 5, false, &[(1, 2), (2, 2), (3, 2)]);
        sim.step();
        // (1,2) died and (2,1) was born while computing generation 0 -> 1
        assert_eq!(sim.changed_at(1, 2), Some(0));
        assert_eq!(sim.changed_at(2, 1), Some(0));
        assert_eq!(sim.age(2, 1), Some(1));
        sim.step();
        assert_eq!(sim.changed_at(2, 1), Some(1));
        assert_eq!(sim.age(2, 1), Some(1));
        // the center never changed
        assert_eq!(sim.age(2, 2), Some(2));
    }

    #[test]
    fn manual_edits_stamp_current_generation() {
        let mut sim = simulation(4, 4, false, &[]);
        sim.step();
        sim.step();
        sim.toggle_cell(1, 1);
        assert!(sim.grid().is_alive(1, 1));
        assert_eq!(sim.changed_at(1, 1), Some(2));
        assert_eq!(sim.age(1, 1), Some(0));

        sim.set_cell(1, 1, true);
        sim.set_cell(9, 9, true);
        sim.toggle_cell(4, 0);
        assert_eq!(sim.population(), 1);
    }

    #[test]
    fn repainting_a_cell_keeps_its_history() {
        let block = [(1, 1), (2, 1), (1, 2), (2, 2)];
        let mut sim = simulation(5, 5, false, &block);
        for _ in 0..60 {
            sim.step();
        }
        assert_eq!(sim.age_class(1, 1), Some(AgeClass::Old));

        sim.set_cell(1, 1, true);
        sim.set_cell(0, 0, false);
        assert_eq!(sim.changed_at(1, 1), Some(0));
        assert_eq!(sim.age(1, 1), Some(60));
        assert_eq!(sim.age_class(1, 1), Some(AgeClass::Old));
        assert_eq!(sim.changed_at(0, 0), Some(0));
        assert_eq!(sim.age_class(0, 0), Some(AgeClass::Untouched));

        sim.set_cell(2, 2, false);
        assert_eq!(sim.changed_at(2, 2), Some(60));
        assert_eq!(sim.age_class(2, 2), Some(AgeClass::Age1));
        assert_eq!(sim.age_class(9, 9), None);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let config = LifeConfig::default().size(40, 30).density(3).wrap(true).seed(42);
        let mut parallel = Simulation::new(&config);
        let mut sequential = Simulation::new(&config.clone().parallel(false));
        assert_eq!(parallel.grid().cells(), sequential.grid().cells());
        for _ in 0..20 {
            parallel.step();
            sequential.step();
        }
        assert_eq!(parallel.grid().cells(), sequential.grid().cells());
        assert_eq!(parallel.age_history(), sequential.age_history());
    }

    #[test]
    fn generic_rule_matches_fast_path_for_conway() {
        let config = LifeConfig::default().size(32, 32).density(4).seed(9);
        let mut fast = Simulation::new(&config);
        let mut generic = Simulation::from_grid(fast.grid().clone(), Rule::parse("B3/S23").unwrap());
        for _ in 0..10 {
            fast.step();
            generic.evolve_generic_for_test();
        }
        assert_eq!(fast.grid().cells(), generic.grid().cells());
    }

    impl Simulation {
        fn evolve_generic_for_test(&mut self) {
            let rule = self.rule.clone();
            self.evolve(move |s, n| rule.check_generic(s, n));
            self.active ^= 1;
            self.generation += 1;
        }
    }

    #[test]
    fn degenerate_rectangle_fails() {
        let sim = simulation(5, 5, false, &[]);
        assert_eq!(
            sim.extract_rect(UVec2::new(2, 1), UVec2::new(2, 4)),
            Err(GeometryError::Degenerate)
        );
        assert_eq!(
            sim.extract_rect(UVec2::new(1, 3), UVec2::new(4, 3)),
            Err(GeometryError::Degenerate)
        );
    }

    #[test]
    fn rectangle_corners_are_normalized() {
        let sim = simulation(6, 6, false, &[(1, 1), (2, 2), (3, 1)]);
        let forward = sim.extract_rect(UVec2::new(1, 1), UVec2::new(4, 3)).unwrap();
        let backward = sim.extract_rect(UVec2::new(4, 3), UVec2::new(1, 1)).unwrap();
        assert_eq!(forward, backward);
        assert_eq!((forward.width(), forward.height()), (3, 2));
        assert_eq!(forward.cells(), &[1, 0, 1, 0, 1, 0]);
        assert_eq!(forward.rule(), Some("B3/S23"));
    }

    #[test]
    fn rectangle_outside_grid_fails() {
        let sim = simulation(4, 4, false, &[]);
        assert!(matches!(
            sim.extract_rect(UVec2::new(2, 2), UVec2::new(6, 3)),
            Err(GeometryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn speed_is_clamped() {
        let mut sim = simulation(2, 2, false, &[]);
        sim.faster();
        assert_eq!(sim.ticks_per_generation(), 1);
        sim.set_ticks_per_generation(MAX_TICKS_PER_GENERATION);
        sim.slower();
        assert_eq!(sim.ticks_per_generation(), MAX_TICKS_PER_GENERATION);
    }

    #[test]
    fn reset_clears_history() {
        let config = LifeConfig::default().size(10, 10).density(2).seed(1);
        let mut sim = Simulation::new(&config);
        sim.step();
        sim.step();
        sim.reset(&config.clone().empty(true), &mut rand::rng());
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.population(), 0);
        assert!(sim.age_history().iter().all(|&a| a == 0));
    }

    #[test]
    fn classifies_trace_bands() {
        assert_eq!(classify(1, 100, 90), AgeClass::Alive);
        assert_eq!(classify(1, 100, 10), AgeClass::Old);
        assert_eq!(classify(0, 100, 0), AgeClass::Untouched);
        assert_eq!(classify(0, 100, 95), AgeClass::Age1);
        assert_eq!(classify(0, 100, 85), AgeClass::Age2);
        assert_eq!(classify(0, 100, 75), AgeClass::Age3);
        assert_eq!(classify(0, 100, 5), AgeClass::Age4);
    }
}
