use std::fs;
use std::path::Path;
use std::sync::Arc;

use bevy::log::{debug, info};
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::simulation::error::{GeometryError, LifeError};
use crate::simulation::pattern::{Pattern, lif};
use crate::simulation::rule::{ALIVE, DEAD};

/// A draw in `0..density` equal to this makes a cell alive.
const FILL_SENTINEL: u32 = 0;

/// Neighbor indices of one cell. At most 8, fewer at bounded edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    len: u8,
    cells: [u32; 8],
}

impl Neighborhood {
    #[inline(always)]
    pub fn as_slice(&self) -> &[u32] {
        &self.cells[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, idx: u32) {
        self.cells[self.len as usize] = idx;
        self.len += 1;
    }
}

/// Grid extents plus the precomputed adjacency of every cell.
///
/// Built once per grid size and wrap mode and shared by both buffers of a
/// simulation. Changing the size or the wrap mode means building a new one.
#[derive(Debug, PartialEq, Eq)]
pub struct Topology {
    width: usize,
    height: usize,
    wrap: bool,
    neighbors: Vec<Neighborhood>,
}

impl Topology {
    pub fn new(width: usize, height: usize, wrap: bool) -> Self {
        let mut neighbors = vec![Neighborhood::default(); width * height];

        for y in 0..height {
            for x in 0..width {
                let hood = &mut neighbors[y * width + x];
                for dy in -1..=1isize {
                    for dx in -1..=1isize {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let Some((col, row)) = Self::resolve(width, height, wrap, x, y, dx, dy)
                        else {
                            continue;
                        };
                        // On 1-wide or 1-high tori an offset wraps back onto the cell.
                        if col == x && row == y {
                            continue;
                        }
                        hood.push((row * width + col) as u32);
                    }
                }
            }
        }

        Self {
            width,
            height,
            wrap,
            neighbors,
        }
    }

    fn resolve(
        width: usize,
        height: usize,
        wrap: bool,
        x: usize,
        y: usize,
        dx: isize,
        dy: isize,
    ) -> Option<(usize, usize)> {
        let (w, h) = (width as isize, height as isize);
        let col = x as isize + dx;
        let row = y as isize + dy;
        if wrap {
            Some((col.rem_euclid(w) as usize, row.rem_euclid(h) as usize))
        } else if col < 0 || col >= w || row < 0 || row >= h {
            None
        } else {
            Some((col as usize, row as usize))
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn neighbors_at(&self, idx: usize) -> &Neighborhood {
        &self.neighbors[idx]
    }

    pub fn neighbors(&self, x: usize, y: usize) -> Option<&Neighborhood> {
        self.index(x, y).map(|idx| &self.neighbors[idx])
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

/// One cell buffer. Row-major, one byte per cell, 0 dead and 1 alive.
#[derive(Clone, Debug)]
pub struct Grid {
    topology: Arc<Topology>,
    cells: Vec<u8>,
    density: u32,
    empty: bool,
}

impl Grid {
    pub fn new(width: usize, height: usize, density: u32, wrap: bool, empty: bool) -> Self {
        Self::with_topology(Arc::new(Topology::new(width, height, wrap)), density, empty)
    }

    /// A dead grid reusing an existing topology.
    pub fn with_topology(topology: Arc<Topology>, density: u32, empty: bool) -> Self {
        let cells = vec![DEAD; topology.len()];
        Self {
            topology,
            cells,
            density: density.max(1),
            empty,
        }
    }

    /// A grid sized exactly to `pattern`, holding its cells at the origin.
    pub fn from_pattern(pattern: &Pattern, wrap: bool) -> Self {
        let mut grid = Self::new(pattern.width(), pattern.height(), 1, wrap, true);
        grid.cells.copy_from_slice(pattern.cells());
        grid
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn width(&self) -> usize {
        self.topology.width
    }

    pub fn height(&self) -> usize {
        self.topology.height
    }

    pub fn wrap(&self) -> bool {
        self.topology.wrap
    }

    pub fn density(&self) -> u32 {
        self.density
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Cell state at `(x, y)`, `None` when out of range.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.topology.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(ALIVE)
    }

    /// Returns `false` if the coordinate is out of range and nothing changed.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) -> bool {
        match self.topology.index(x, y) {
            Some(idx) => {
                self.cells[idx] = if alive { ALIVE } else { DEAD };
                true
            }
            None => false,
        }
    }

    /// Flips a cell and returns its new state.
    pub fn toggle(&mut self, x: usize, y: usize) -> Option<u8> {
        let idx = self.topology.index(x, y)?;
        self.cells[idx] ^= 1;
        Some(self.cells[idx])
    }

    #[inline(always)]
    pub fn count_neighbors_at(&self, idx: usize) -> u8 {
        self.topology
            .neighbors_at(idx)
            .as_slice()
            .iter()
            .map(|&n| self.cells[n as usize])
            .sum()
    }

    /// Live neighbors of `(x, y)`. Out of range coordinates have none.
    pub fn count_neighbors(&self, x: usize, y: usize) -> u8 {
        self.topology
            .index(x, y)
            .map_or(0, |idx| self.count_neighbors_at(idx))
    }

    /// Seeds live cells with an expected density of `1 / density`. Does
    /// nothing on grids created as empty.
    pub fn fill_random<R: Rng>(&mut self, rng: &mut R) {
        if self.empty {
            return;
        }
        for cell in &mut self.cells {
            if rng.random_range(0..self.density) == FILL_SENTINEL {
                *cell = ALIVE;
            }
        }
    }

    /// Sets the live cells of `pattern`, centered in the grid. Cells that
    /// land outside the grid are dropped.
    pub fn load_pattern(&mut self, pattern: &Pattern) {
        let start_x = (self.width() / 2) as isize - (pattern.width() / 2) as isize;
        let start_y = (self.height() / 2) as isize - (pattern.height() / 2) as isize;
        let mut dropped = 0usize;

        for (row, line) in pattern.rows().enumerate() {
            for (col, &cell) in line.iter().enumerate() {
                if cell != ALIVE {
                    continue;
                }
                let x = start_x + col as isize;
                let y = start_y + row as isize;
                if x < 0 || y < 0 || !self.set(x as usize, y as usize, true) {
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            debug!("pattern does not fit the grid, dropped {dropped} live cells");
        }
    }

    /// Copies the `width × height` block at `(x, y)` into a pattern.
    pub fn extract(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<Pattern, GeometryError> {
        if x + width > self.width() || y + height > self.height() {
            return Err(GeometryError::OutOfBounds {
                x: x as u32,
                y: y as u32,
                width: width as u32,
                height: height as u32,
            });
        }

        let mut pattern = Pattern::new(width, height);
        for row in 0..height {
            let start = (y + row) * self.width() + x;
            for (col, &cell) in self.cells[start..start + width].iter().enumerate() {
                pattern.set(col, row, cell == ALIVE);
            }
        }
        Ok(pattern)
    }

    /// The whole grid as a pattern.
    pub fn to_pattern(&self) -> Pattern {
        let mut pattern = Pattern::new(self.width(), self.height());
        for (idx, &cell) in self.cells.iter().enumerate() {
            if cell == ALIVE {
                pattern.set(idx % self.width(), idx / self.width(), true);
            }
        }
        pattern
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    pub fn live_cells(&self) -> FxHashSet<(usize, usize)> {
        let width = self.width();
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == ALIVE)
            .map(|(idx, _)| (idx % width, idx / width))
            .collect()
    }

    /// Writes the grid as a Life 1.05 state file annotated with `rule`.
    pub fn save_state(&self, path: &Path, rule: &str) -> Result<(), LifeError> {
        fs::write(path, lif::write_state(&self.to_pattern(), rule))?;
        Ok(())
    }

    /// Reads a state file (Life 1.05 or legacy `0`/`1`) into a grid of
    /// exactly the file's size. The `#R` rule, if any, is returned too.
    pub fn load_state(path: &Path, wrap: bool) -> Result<(Grid, Option<String>), LifeError> {
        let content = fs::read_to_string(path)?;
        let pattern = lif::parse_state(&content)?;
        info!(
            "loaded state {} ({}x{})",
            path.display(),
            pattern.width(),
            pattern.height()
        );
        let rule = pattern.rule().map(str::to_string);
        Ok((Grid::from_pattern(&pattern, wrap), rule))
    }
}
