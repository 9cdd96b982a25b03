//! Run-length encoded patterns.
//!
//! ```text
//! #N glider
//! x = 3, y = 3, rule = B3/S23
//! bob$2bo$3o!
//! ```
//!
//! `b` is a dead cell, `o` a live one, `$` ends a row and `!` ends the
//! pattern. A leading count repeats the tag. Newlines inside the body are
//! only there for readability.
//!
//! Every row has to decode to exactly `x` cells and the body has to hold
//! exactly `y` rows. Short rows are not padded.

use crate::simulation::error::PatternError;
use crate::simulation::pattern::Pattern;
use crate::simulation::rule::{ALIVE, DEAD};

/// Body lines are wrapped at this column when writing.
pub const LINE_WIDTH: usize = 70;

// Cells are appended run by run, so the header only sizes the first chunk.
const INITIAL_CAPACITY: usize = 1 << 16;

pub fn parse(input: &str) -> Result<Pattern, PatternError> {
    let mut lines = input.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = loop {
        match lines.next() {
            Some(line) if line.starts_with('#') => continue,
            Some(line) => break line,
            None => return Err(PatternError::MissingHeader),
        }
    };
    let (width, height, rule) = parse_header(header)?;

    let mut decoder = Decoder::new(width, height);
    'body: for line in lines {
        if line.starts_with('#') {
            continue;
        }
        for c in line.chars() {
            if !decoder.feed(c)? {
                break 'body;
            }
        }
    }
    let cells = decoder.finish()?;

    let pattern = Pattern {
        width,
        height,
        rule: None,
        cells,
    };
    Ok(match rule {
        Some(rule) => pattern.with_rule(rule),
        None => pattern,
    })
}

fn parse_header(line: &str) -> Result<(usize, usize, Option<String>), PatternError> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.starts_with("x=") {
        return Err(PatternError::MissingHeader);
    }

    let mut width = None;
    let mut height = None;
    let mut rule = None;

    for item in compact.split(',') {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| PatternError::InvalidHeader(format!("missing '=' in \"{item}\"")))?;
        let number = || {
            value
                .parse::<usize>()
                .map_err(|_| PatternError::InvalidHeader(format!("{key} is not a number: {value}")))
        };
        match key {
            "x" => width = Some(number()?),
            "y" => height = Some(number()?),
            "rule" => rule = Some(value.to_string()),
            other => {
                return Err(PatternError::InvalidHeader(format!(
                    "unknown key \"{other}\""
                )));
            }
        }
    }

    let width = width.ok_or_else(|| PatternError::InvalidHeader("missing \"x\"".into()))?;
    let height = height.ok_or_else(|| PatternError::InvalidHeader("missing \"y\"".into()))?;
    if width.checked_mul(height).is_none() {
        return Err(PatternError::InvalidHeader(format!(
            "{width}x{height} cells do not fit in memory"
        )));
    }
    Ok((width, height, rule.filter(|r| !r.is_empty())))
}

struct Decoder {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    rows: usize,
    column: usize,
    count: Option<usize>,
}

impl Decoder {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: Vec::with_capacity((width * height).min(INITIAL_CAPACITY)),
            rows: 0,
            column: 0,
            count: None,
        }
    }

    /// Returns `false` once the terminating `!` has been consumed.
    fn feed(&mut self, c: char) -> Result<bool, PatternError> {
        match c {
            '0'..='9' => {
                let digit = c as usize - '0' as usize;
                self.count = Some(
                    self.count
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit),
                );
            }
            'b' => self.run(DEAD)?,
            'o' => self.run(ALIVE)?,
            '$' => {
                let count = self.count.take().unwrap_or(1);
                for _ in 0..count {
                    self.end_row()?;
                }
            }
            '!' => {
                self.finish_open_row()?;
                return Ok(false);
            }
            c if c.is_whitespace() => {}
            other => return Err(PatternError::InvalidCharacter(other)),
        }
        Ok(true)
    }

    fn run(&mut self, state: u8) -> Result<(), PatternError> {
        let count = self.count.take().unwrap_or(1);
        let found = self.column.saturating_add(count);
        if found > self.width {
            return Err(PatternError::RowWidth {
                row: self.rows,
                found,
                expected: self.width,
            });
        }
        self.cells.extend(std::iter::repeat_n(state, count));
        self.column = found;
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), PatternError> {
        if self.column != self.width {
            return Err(PatternError::RowWidth {
                row: self.rows,
                found: self.column,
                expected: self.width,
            });
        }
        self.rows += 1;
        self.column = 0;
        if self.rows > self.height {
            return Err(PatternError::RowCount {
                found: self.rows,
                expected: self.height,
            });
        }
        Ok(())
    }

    // The last row is closed by `!` (or end of input) instead of `$`.
    fn finish_open_row(&mut self) -> Result<(), PatternError> {
        self.count = None;
        if self.column > 0 || self.rows < self.height {
            self.end_row()?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, PatternError> {
        if self.rows < self.height || self.column > 0 {
            self.finish_open_row()?;
        }
        if self.rows != self.height {
            return Err(PatternError::RowCount {
                found: self.rows,
                expected: self.height,
            });
        }
        Ok(self.cells)
    }
}

/// Encodes one row as runs, e.g. `bboboooob` becomes `2bob4ob`.
pub fn encode_row(row: &[u8]) -> String {
    let mut out = String::new();
    let mut iter = row.iter().peekable();
    while let Some(&state) = iter.next() {
        let mut run = 1;
        while iter.next_if(|&&next| next == state).is_some() {
            run += 1;
        }
        if run > 1 {
            out.push_str(&run.to_string());
        }
        out.push(if state == ALIVE { 'o' } else { 'b' });
    }
    out
}

/// Writes a pattern as RLE text. `name` becomes a leading `#N` line.
pub fn write(pattern: &Pattern, name: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(name) = name {
        out.push_str(&format!("#N {name}\n"));
    }
    out.push_str(&format!("x = {}, y = {}", pattern.width(), pattern.height()));
    if let Some(rule) = pattern.rule() {
        out.push_str(&format!(", rule = {rule}"));
    }
    out.push('\n');

    let mut tokens = Vec::new();
    for (y, row) in pattern.rows().enumerate() {
        if y > 0 {
            tokens.push("$".to_string());
        }
        tokens.extend(split_runs(&encode_row(row)));
    }
    tokens.push("!".to_string());

    let mut line_length = 0;
    for token in tokens {
        if line_length + token.len() > LINE_WIDTH {
            out.push('\n');
            line_length = 0;
        }
        line_length += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}

// "2bob4ob" -> ["2b", "o", "b", "4o", "b"], so wrapping never splits a run.
fn split_runs(encoded: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in encoded.chars() {
        current.push(c);
        if !c.is_ascii_digit() {
            runs.push(std::mem::take(&mut current));
        }
    }
    runs
}
