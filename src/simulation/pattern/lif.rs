//! Dense row formats used for patterns and full state snapshots.
//!
//! Life 1.05 style:
//! ```text
//! #Life 1.05
//! #R B3/S23
//! #D gridlife state file
//! #P -1 -1
//! .o.
//! ..o
//! ooo
//! ```
//! Legacy state dump: one line per row of `0`/`1`, no header.

use crate::simulation::error::PatternError;
use crate::simulation::pattern::Pattern;
use crate::simulation::rule::{ALIVE, DEAD};

pub const LIFE_MARKER: &str = "#Life 1.05";

/// Parses Life 1.05 style content. Only the first cell block is read.
pub fn parse_lif(input: &str) -> Result<Pattern, PatternError> {
    let mut rule = None;
    let mut rows = Vec::new();

    for line in input.lines().map(str::trim_end) {
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if !rows.is_empty() {
                break;
            }
            if let Some(r) = comment
                .strip_prefix('R')
                .or_else(|| comment.strip_prefix('r'))
                .filter(|r| r.starts_with(' '))
            {
                rule = Some(r.trim().to_string());
            }
            continue;
        }

        let row = line
            .chars()
            .map(|c| match c {
                '.' => Ok(DEAD),
                'o' | '*' => Ok(ALIVE),
                other => Err(PatternError::InvalidLifCell(other)),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        rows.push(row);
    }

    let pattern = Pattern::from_rows(rows)?;
    Ok(match rule {
        Some(rule) => pattern.with_rule(rule),
        None => pattern,
    })
}

/// Parses the legacy `0`/`1` dense dump.
pub fn parse_dense(input: &str) -> Result<Pattern, PatternError> {
    let rows = input
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(|line| {
            line.chars()
                .map(|c| match c {
                    '0' => Ok(DEAD),
                    '1' => Ok(ALIVE),
                    other => Err(PatternError::InvalidStateCell(other)),
                })
                .collect::<Result<Vec<u8>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Pattern::from_rows(rows)
}

/// Parses a state snapshot in either accepted format. Content whose first
/// non-empty line is a `#` comment is read as Life 1.05.
pub fn parse_state(input: &str) -> Result<Pattern, PatternError> {
    let first = input.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        Some(line) if line.starts_with('#') => parse_lif(input),
        _ => parse_dense(input),
    }
}

/// Writes a full state snapshot in Life 1.05 style.
pub fn write_state(pattern: &Pattern, rule: &str) -> String {
    let mut out = String::with_capacity((pattern.width() + 1) * pattern.height() + 64);
    out.push_str(LIFE_MARKER);
    out.push('\n');
    out.push_str(&format!("#R {rule}\n#D gridlife state file\n#P -1 -1\n"));
    for row in pattern.rows() {
        out.extend(row.iter().map(|&c| if c == ALIVE { 'o' } else { '.' }));
        out.push('\n');
    }
    out
}
