//! Error types for rule parsing, pattern codecs and grid geometry.

use thiserror::Error;

/// Errors raised while parsing a `B<digits>/S<digits>` rule string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid game rule <{0}>: expected B<digits>/S<digits>")]
    MissingClause(String),

    #[error("failed to parse game rule part <{part}>: '{found}' is not a digit")]
    InvalidDigit { part: String, found: char },

    #[error("neighbor count {0} in game rule is out of range 0..=8")]
    CountOutOfRange(u32),
}

/// Errors raised while decoding RLE, LIF or dense state content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("invalid input: header is missing")]
    MissingHeader,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid RLE character '{0}'")]
    InvalidCharacter(char),

    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("pattern has {found} rows, expected {expected}")]
    RowCount { found: usize, expected: usize },

    #[error("all rows must be in the same length, got: {found}, expected: {expected}")]
    InconsistentRows { found: usize, expected: usize },

    #[error("cells must be . or o, got '{0}'")]
    InvalidLifCell(char),

    #[error("cells must be 0 or 1, got '{0}'")]
    InvalidStateCell(char),
}

/// Errors raised for rectangle selections that cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("can't save non-rectangle: corners share a row or column")]
    Degenerate,

    #[error("selection {width}x{height} at ({x},{y}) exceeds the grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Umbrella error for everything that touches the filesystem.
#[derive(Debug, Error)]
pub enum LifeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
