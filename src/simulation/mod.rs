//! The cellular automaton engine: rules, grids, the double-buffered
//! simulation and the pattern file formats.

pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod grid;
pub mod pattern;
pub mod rule;

pub use config::LifeConfig;
pub use engine::{AgeClass, Simulation};
pub use error::{GeometryError, LifeError, PatternError, RuleError};
pub use grid::{Grid, Topology};
pub use pattern::Pattern;
pub use rule::Rule;
