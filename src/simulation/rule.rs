use std::fmt::{self, Display};
use std::str::FromStr;

use crate::simulation::error::RuleError;

pub const ALIVE: u8 = 1;
pub const DEAD: u8 = 0;

/// Bit `n` set means "n live neighbors" is in the set.
pub type NeighborMask = u16;

const CONWAY_BIRTH: NeighborMask = 1 << 3;
const CONWAY_SURVIVAL: NeighborMask = 1 << 2 | 1 << 3;

/// How the hot loop evaluates a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCheck {
    /// Closed-form B3/S23: `9 * state + neighbors` in {3, 11, 12}.
    Standard,
    /// Set membership against the birth/survival masks.
    Generic,
}

/// A birth/survival rule in B/S notation, e.g. `B3/S23`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    definition: String,
    birth: NeighborMask,
    survival: NeighborMask,
    check: RuleCheck,
}

impl Rule {
    /// Conway's Game of Life.
    pub fn conway() -> Self {
        Self {
            definition: "B3/S23".to_string(),
            birth: CONWAY_BIRTH,
            survival: CONWAY_SURVIVAL,
            check: RuleCheck::Standard,
        }
    }

    pub fn parse(definition: &str) -> Result<Self, RuleError> {
        let parts: Vec<&str> = definition.trim().split('/').collect();
        if parts.len() < 2 {
            return Err(RuleError::MissingClause(definition.to_string()));
        }

        let mut birth = None;
        let mut survival = None;

        for part in parts {
            let mut chars = part.chars();
            let slot = match chars.next() {
                Some('B' | 'b') => &mut birth,
                Some('S' | 's') => &mut survival,
                _ => return Err(RuleError::MissingClause(definition.to_string())),
            };
            if slot.is_some() {
                // a second clause of the same kind
                return Err(RuleError::MissingClause(definition.to_string()));
            }
            *slot = Some(parse_counts(part, chars.as_str())?);
        }

        let (Some(birth), Some(survival)) = (birth, survival) else {
            return Err(RuleError::MissingClause(definition.to_string()));
        };

        let check = if birth == CONWAY_BIRTH && survival == CONWAY_SURVIVAL {
            RuleCheck::Standard
        } else {
            RuleCheck::Generic
        };

        Ok(Self {
            definition: definition.trim().to_string(),
            birth,
            survival,
            check,
        })
    }

    /// The rule string exactly as it was given.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// `B<digits>/S<digits>` with ascending digits, regardless of input order.
    pub fn canonical(&self) -> String {
        format!("B{}/S{}", mask_digits(self.birth), mask_digits(self.survival))
    }

    pub fn birth(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=8u8).filter(|n| self.birth & (1 << n) != 0)
    }

    pub fn survival(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=8u8).filter(|n| self.survival & (1 << n) != 0)
    }

    pub fn check_mode(&self) -> RuleCheck {
        self.check
    }

    /// Next state of a cell given its current state and live neighbor count.
    #[inline(always)]
    pub fn check(&self, state: u8, neighbors: u8) -> u8 {
        match self.check {
            RuleCheck::Standard => check_b3s23(state, neighbors),
            RuleCheck::Generic => self.check_generic(state, neighbors),
        }
    }

    #[inline(always)]
    pub fn check_generic(&self, state: u8, neighbors: u8) -> u8 {
        Self::check_masks(self.birth, self.survival, state, neighbors)
    }

    /// `(birth, survival)` masks, for callers that need a `Copy` checker.
    pub fn masks(&self) -> (NeighborMask, NeighborMask) {
        (self.birth, self.survival)
    }

    #[inline(always)]
    pub fn check_masks(birth: NeighborMask, survival: NeighborMask, state: u8, neighbors: u8) -> u8 {
        let mask = if state == ALIVE { survival } else { birth };
        ((mask >> neighbors) & 1) as u8
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::conway()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.definition)
    }
}

impl FromStr for Rule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A dead cell with 3 neighbors scores 3; a live one scores 11 or 12 with
/// 2 or 3 neighbors.
#[inline(always)]
pub fn check_b3s23(state: u8, neighbors: u8) -> u8 {
    match 9 * state + neighbors {
        3 | 11 | 12 => ALIVE,
        _ => DEAD,
    }
}

fn parse_counts(part: &str, digits: &str) -> Result<NeighborMask, RuleError> {
    let mut mask = 0;
    for c in digits.chars() {
        let n = c.to_digit(10).ok_or_else(|| RuleError::InvalidDigit {
            part: part.to_string(),
            found: c,
        })?;
        if n > 8 {
            return Err(RuleError::CountOutOfRange(n));
        }
        mask |= 1 << n;
    }
    Ok(mask)
}

fn mask_digits(mask: NeighborMask) -> String {
    (0..=8u8)
        .filter(|n| mask & (1 << n) != 0)
        .map(|n| char::from(b'0' + n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conway() {
        let rule = Rule::parse("B3/S23").unwrap();
        assert_eq!(rule.birth().collect::<Vec<_>>(), vec![3]);
        assert_eq!(rule.survival().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(rule.check_mode(), RuleCheck::Standard);
        assert_eq!(rule.to_string(), "B3/S23");
    }

    #[test]
    fn clause_order_is_free() {
        let rule = Rule::parse("S23/B36").unwrap();
        assert_eq!(rule.birth().collect::<Vec<_>>(), vec![3, 6]);
        assert_eq!(rule.survival().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(rule.definition(), "S23/B36");
        assert_eq!(rule.canonical(), "B36/S23");
        assert_eq!(rule.check_mode(), RuleCheck::Generic);
    }

    #[test]
    fn empty_clauses_are_allowed() {
        let rule = Rule::parse("B2/S").unwrap();
        assert_eq!(rule.survival().count(), 0);
        assert_eq!(rule.check(ALIVE, 2), DEAD);
        assert_eq!(rule.check(DEAD, 2), ALIVE);
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(matches!(
            Rule::parse("B3S23"),
            Err(RuleError::MissingClause(_))
        ));
        assert!(matches!(
            Rule::parse("B3/X23"),
            Err(RuleError::MissingClause(_))
        ));
        assert!(matches!(
            Rule::parse("B3/B23"),
            Err(RuleError::MissingClause(_))
        ));
        assert!(matches!(
            Rule::parse("B3a/S23"),
            Err(RuleError::InvalidDigit { found: 'a', .. })
        ));
        assert_eq!(
            Rule::parse("B9/S23"),
            Err(RuleError::CountOutOfRange(9))
        );
    }

    #[test]
    fn fast_path_matches_generic_check() {
        let rule = Rule::conway();
        for state in [DEAD, ALIVE] {
            for neighbors in 0..=8 {
                assert_eq!(
                    check_b3s23(state, neighbors),
                    rule.check_generic(state, neighbors),
                    "state {state} neighbors {neighbors}"
                );
            }
        }
    }

    #[test]
    fn highlife_births_on_six() {
        let rule = Rule::parse("B36/S23").unwrap();
        assert_eq!(rule.check(DEAD, 6), ALIVE);
        assert_eq!(rule.check(DEAD, 3), ALIVE);
        assert_eq!(rule.check(ALIVE, 6), DEAD);
        assert_eq!(rule.check(ALIVE, 2), ALIVE);
    }
}
