use std::path::PathBuf;

use bevy::log::info;

use crate::simulation::error::LifeError;
use crate::simulation::grid::Grid;
use crate::simulation::pattern::{self, Pattern};
use crate::simulation::rule::Rule;

pub const DEFAULT_GRID_WIDTH: usize = 600;
pub const DEFAULT_GRID_HEIGHT: usize = 400;
pub const DEFAULT_CELL_SIZE: u32 = 8;
pub const DEFAULT_DENSITY: u32 = 10;
pub const DEFAULT_TICKS_PER_GENERATION: u32 = 10;
pub const MAX_TICKS_PER_GENERATION: u32 = 120;

/// Everything the simulation needs at construction time.
///
/// Built with chained setters, then [`LifeConfig::resolve`] loads the
/// optional pattern or state file and adjusts the grid size to fit it.
#[derive(Clone, Debug)]
pub struct LifeConfig {
    pub width: usize,
    pub height: usize,
    pub cell_size: u32,
    pub density: u32,
    pub ticks_per_generation: u32,
    pub rule: Rule,
    pub wrap: bool,
    pub empty: bool,
    pub paused: bool,
    pub show_evolution: bool,
    pub parallel: bool,
    pub seed: Option<u64>,
    pub pattern_file: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    /// Set by `resolve` from `pattern_file`; centered on the grid.
    pub pattern: Option<Pattern>,
    /// Set by `resolve` from `state_file`; replaces the grid outright.
    pub state: Option<Pattern>,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            density: DEFAULT_DENSITY,
            ticks_per_generation: DEFAULT_TICKS_PER_GENERATION,
            rule: Rule::conway(),
            wrap: false,
            empty: false,
            paused: false,
            show_evolution: false,
            parallel: true,
            seed: None,
            pattern_file: None,
            state_file: None,
            pattern: None,
            state: None,
        }
    }
}

impl LifeConfig {
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size.max(1);
        self
    }

    pub fn density(mut self, density: u32) -> Self {
        self.density = density.max(1);
        self
    }

    pub fn ticks_per_generation(mut self, ticks: u32) -> Self {
        self.ticks_per_generation = ticks.clamp(1, MAX_TICKS_PER_GENERATION);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn show_evolution(mut self, show: bool) -> Self {
        self.show_evolution = show;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn pattern_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pattern_file = Some(path.into());
        self
    }

    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Loads the configured pattern and state files.
    pub fn resolve(mut self) -> Result<Self, LifeError> {
        if let Some(path) = self.pattern_file.clone() {
            let pattern = pattern::load_pattern(&path)?;
            self.apply_pattern(pattern)?;
        }
        if let Some(path) = self.state_file.clone() {
            let (grid, rule) = Grid::load_state(&path, self.wrap)?;
            if let Some(rule) = rule {
                self.rule = Rule::parse(&rule)?;
            }
            self.apply_state(grid.to_pattern());
        }
        Ok(self)
    }

    /// Seeds from `pattern`: the grid starts empty, adopts the pattern's
    /// rule and grows to twice the pattern extents if it does not fit.
    pub fn apply_pattern(&mut self, pattern: Pattern) -> Result<(), LifeError> {
        if let Some(rule) = pattern.rule() {
            self.rule = Rule::parse(rule)?;
        }
        if pattern.width() > self.width || pattern.height() > self.height {
            self.width = pattern.width() * 2;
            self.height = pattern.height() * 2;
            info!(
                "grid enlarged to {}x{} to fit the pattern",
                self.width, self.height
            );
        }
        self.empty = true;
        self.pattern = Some(pattern);
        Ok(())
    }

    /// Resumes from a snapshot: the grid takes exactly its size.
    pub fn apply_state(&mut self, state: Pattern) {
        self.width = state.width();
        self.height = state.height();
        self.empty = true;
        info!("grid resized to {}x{} from state file", self.width, self.height);
        self.state = Some(state);
    }
}
