//! Rectangular cell patterns and the textual formats they travel in.
//!
//! A [`Pattern`] is a plain `height × width` block of 0/1 cells with an
//! optional rule string. It is produced by parsing a file or by cutting a
//! rectangle out of a live grid, and consumed once to seed a grid or to be
//! written out.
//!
//! Two formats are understood:
//! - [`rle`]: the run-length encoded `x = W, y = H, rule = R` format.
//! - [`lif`]: Life 1.05 style dense rows (`.`/`o`/`*`) and the legacy
//!   `0`/`1` dense state dump.

pub mod lif;
pub mod rle;

use std::fs;
use std::path::Path;

use bevy::log::info;
use rustc_hash::FxHashSet;

use crate::simulation::error::{LifeError, PatternError};
use crate::simulation::rule::{ALIVE, DEAD};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    width: usize,
    height: usize,
    rule: Option<String>,
    // Row-major, `height * width` entries.
    cells: Vec<u8>,
}

impl Pattern {
    /// An all-dead pattern.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rule: None,
            cells: vec![DEAD; width * height],
        }
    }

    /// Builds a pattern from rows of 0/1 cells. Every row must have the
    /// length of the first one.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, PatternError> {
        let width = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);

        for row in rows {
            if row.len() != width {
                return Err(PatternError::InconsistentRows {
                    found: row.len(),
                    expected: width,
                });
            }
            cells.extend(row.into_iter().map(|c| (c != DEAD) as u8));
        }

        Ok(Self {
            width,
            height,
            rule: None,
            cells,
        })
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        let rule = rule.into();
        self.rule = if rule.is_empty() { None } else { Some(rule) };
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Cell state at `(x, y)`, dead when out of range.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return DEAD;
        }
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = if alive { ALIVE } else { DEAD };
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| &self.cells[y * self.width..(y + 1) * self.width])
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    pub fn live_cells(&self) -> FxHashSet<(usize, usize)> {
        let mut live = FxHashSet::default();
        for (y, row) in self.rows().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                if cell == ALIVE {
                    live.insert((x, y));
                }
            }
        }
        live
    }
}

/// Which codec a pattern file is read with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternFormat {
    Rle,
    Lif,
}

impl PatternFormat {
    /// `.lif` files are Life 1.05, everything else is treated as RLE.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("lif") => PatternFormat::Lif,
            _ => PatternFormat::Rle,
        }
    }
}

/// Reads a pattern file, choosing the codec by extension.
pub fn load_pattern(path: &Path) -> Result<Pattern, LifeError> {
    let content = fs::read_to_string(path)?;
    let pattern = match PatternFormat::from_path(path) {
        PatternFormat::Rle => rle::parse(&content)?,
        PatternFormat::Lif => lif::parse_lif(&content)?,
    };

    info!(
        "loaded pattern {} ({}x{}, rule {})",
        path.display(),
        pattern.width(),
        pattern.height(),
        pattern.rule().unwrap_or("-")
    );
    Ok(pattern)
}
