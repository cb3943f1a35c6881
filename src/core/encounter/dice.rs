//! Dice notation parsing and seeded resolution.
//!
//! Canonical notation is `<count>d<sides>[+<modifier>]` with a bare
//! `d<sides>` reading as one die. Counts, sides and modifiers are
//! non-negative integers. A roll is the sum of `count` uniform draws
//! over `[1, sides]` plus the modifier, drawn from the caller's RNG
//! stream in order.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on dice per expression; guards the roll loop against
/// runaway content.
const MAX_DICE_COUNT: u32 = 100;

/// Upper bounds on sides per die and on the flat modifier; together with
/// the count bound they keep the worst-case sum far inside `u32`.
const MAX_DICE_SIDES: u32 = 1_000;
const MAX_MODIFIER: u32 = 1_000;

static DICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d*)d(\d+)(?:\+(\d+))?$").expect("dice regex is valid"));

/// A die expression could not be parsed or is out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid dice expression {expr:?}: {reason}")]
pub struct InvalidDiceExpressionError {
    /// The expression as supplied.
    pub expr: String,
    /// Deterministic human-readable reason.
    pub reason: &'static str,
}

impl InvalidDiceExpressionError {
    fn new(expr: &str, reason: &'static str) -> Self {
        Self {
            expr: expr.to_string(),
            reason,
        }
    }
}

/// A parsed die expression (e.g. `2d6+3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    /// Number of dice to roll (e.g. 2 in `2d6`).
    pub count: u32,
    /// Sides per die (e.g. 6 in `2d6`).
    pub sides: u32,
    /// Flat modifier added to the sum.
    pub modifier: u32,
}

impl DiceExpression {
    /// Parse canonical dice notation.
    ///
    /// # Errors
    ///
    /// [`InvalidDiceExpressionError`] on malformed notation, zero sides,
    /// or a count above the per-expression bound.
    pub fn parse(expr: &str) -> Result<Self, InvalidDiceExpressionError> {
        let trimmed = expr.trim();
        let caps = DICE_RE
            .captures(trimmed)
            .ok_or_else(|| InvalidDiceExpressionError::new(expr, "expected <count>d<sides>[+<modifier>]"))?;

        let count: u32 = match caps.get(1).map_or("", |m| m.as_str()) {
            "" => 1,
            digits => digits
                .parse()
                .map_err(|_| InvalidDiceExpressionError::new(expr, "count out of range"))?,
        };
        let sides: u32 = caps[2]
            .parse()
            .map_err(|_| InvalidDiceExpressionError::new(expr, "sides out of range"))?;
        let modifier: u32 = match caps.get(3) {
            Some(digits) => digits
                .as_str()
                .parse()
                .map_err(|_| InvalidDiceExpressionError::new(expr, "modifier out of range"))?,
            None => 0,
        };

        if sides == 0 {
            return Err(InvalidDiceExpressionError::new(expr, "sides must be at least 1"));
        }
        if sides > MAX_DICE_SIDES {
            return Err(InvalidDiceExpressionError::new(expr, "too many sides"));
        }
        if count > MAX_DICE_COUNT {
            return Err(InvalidDiceExpressionError::new(expr, "too many dice"));
        }
        if modifier > MAX_MODIFIER {
            return Err(InvalidDiceExpressionError::new(expr, "modifier too large"));
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Resolve the expression against an RNG stream: `count` uniform
    /// draws over `[1, sides]`, in order, plus the modifier.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> u32 {
        let mut total = self.modifier;
        for _ in 0..self.count {
            total += rng.gen_range(1..=self.sides);
        }
        total
    }

    /// Minimum possible result.
    pub fn min_roll(&self) -> u32 {
        self.count + self.modifier
    }

    /// Maximum possible result.
    pub fn max_roll(&self) -> u32 {
        self.count * self.sides + self.modifier
    }

    /// Canonical notation (e.g. `2d6+3`, `1d8`).
    pub fn to_canonical(&self) -> String {
        if self.modifier == 0 {
            format!("{}d{}", self.count, self.sides)
        } else {
            format!("{}d{}+{}", self.count, self.sides, self.modifier)
        }
    }
}

impl std::fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl std::str::FromStr for DiceExpression {
    type Err = InvalidDiceExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
