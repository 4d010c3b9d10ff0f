//! Dice rolling system
//!
//! Parses and rolls dice notation like "2d6+3", "d20", "4d6-2" or a bare
//! constant such as "5". Randomness comes from a [`DiceSource`], so tests and
//! replays can substitute a deterministic one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing dice notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("could not evaluate dice expression: {0}")]
    InvalidExpression(String),
}

/// Source of die faces.
///
/// Implementations return a uniformly distributed value in `1..=sides`.
pub trait DiceSource: std::fmt::Debug {
    /// Roll a single die with the given number of sides.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<D: DiceSource + ?Sized> DiceSource for Box<D> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// Dice backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngDice<R>(R);

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngDice<StdRng> {
    /// Seed from the operating system
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Reproducible dice for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + std::fmt::Debug> DiceSource for RngDice<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.random_range(1..=sides.max(1))
    }
}

/// Every die shows the same face (clamped to the die size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDice(pub u32);

impl DiceSource for FixedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.clamp(1, sides.max(1))
    }
}

/// Replays a script of faces in order.
///
/// Once the script runs out the last face repeats. An empty script rolls 1s.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: Vec<u32>,
    next: usize,
}

impl ScriptedDice {
    pub fn new(faces: impl Into<Vec<u32>>) -> Self {
        Self {
            faces: faces.into(),
            next: 0,
        }
    }

    /// Number of faces handed out so far
    pub fn rolled(&self) -> usize {
        self.next
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = match self.faces.get(self.next) {
            Some(face) => *face,
            None => self.faces.last().copied().unwrap_or(1),
        };
        self.next += 1;
        face.clamp(1, sides.max(1))
    }
}

/// Most dice a single expression may roll
pub const MAX_DICE: u32 = 1000;

/// Largest die a single expression may name
pub const MAX_SIDES: u32 = 1000;

/// Clamp a wide intermediate total into `i32`
pub(crate) fn saturate(total: i64) -> i32 {
    total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// A parsed dice expression
///
/// A bare constant parses to `count == 0` with the value in `modifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i32,
}

impl DiceRoll {
    /// Create a new dice roll
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// A roll with no dice, only a constant
    pub fn constant(value: i32) -> Self {
        Self::new(0, 0, value)
    }

    /// Roll the dice and return the total, saturating at the `i32` bounds
    pub fn roll_with<D: DiceSource + ?Sized>(&self, dice: &mut D) -> i32 {
        let mut total = i64::from(self.modifier);
        for _ in 0..self.count {
            total = total.saturating_add(i64::from(dice.roll_die(self.sides)));
        }
        saturate(total)
    }

    /// Get the minimum possible result
    pub fn min(&self) -> i32 {
        saturate(i64::from(self.count) + i64::from(self.modifier))
    }

    /// Get the maximum possible result
    pub fn max(&self) -> i32 {
        saturate(i64::from(self.count) * i64::from(self.sides) + i64::from(self.modifier))
    }
}

impl FromStr for DiceRoll {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "{}", self.modifier)
        } else if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse_dice(notation: &str) -> Result<DiceRoll, DiceError> {
    let invalid = || DiceError::InvalidExpression(notation.to_string());
    let normalized = notation.trim().to_lowercase();

    if !normalized.contains('d') {
        let value: i32 = normalized.parse().map_err(|_| invalid())?;
        return Ok(DiceRoll::constant(value));
    }

    let has_plus = normalized.contains('+');
    let has_minus = normalized.contains('-');
    let (dice_part, modifier) = match (has_plus, has_minus) {
        (true, true) => return Err(invalid()),
        (false, false) => (normalized.as_str(), 0),
        (true, false) => split_modifier(&normalized, '+').ok_or_else(invalid)?,
        (false, true) => split_modifier(&normalized, '-').ok_or_else(invalid)?,
    };

    let (count_str, sides_str) = dice_part.split_once('d').ok_or_else(invalid)?;
    if sides_str.contains('d') {
        return Err(invalid());
    }

    // "d6" means "1d6"
    let count: u32 = if count_str.is_empty() {
        1
    } else {
        count_str.parse().map_err(|_| invalid())?
    };
    let sides: u32 = sides_str.parse().map_err(|_| invalid())?;

    if sides == 0 || sides > MAX_SIDES || count > MAX_DICE {
        return Err(invalid());
    }

    Ok(DiceRoll {
        count,
        sides,
        modifier,
    })
}

/// Split "XdY<sign>C" on its single sign. An empty constant counts as 0.
fn split_modifier(notation: &str, sign: char) -> Option<(&str, i32)> {
    let (dice_part, constant) = notation.split_once(sign)?;
    if constant.contains(sign) {
        return None;
    }
    let magnitude: i32 = if constant.is_empty() {
        0
    } else {
        constant.parse().ok()?
    };
    let modifier = if sign == '-' { -magnitude } else { magnitude };
    Some((dice_part, modifier))
}

/// Parse and roll a dice expression in one step
pub fn roll<D: DiceSource + ?Sized>(expression: &str, dice: &mut D) -> Result<i32, DiceError> {
    Ok(parse_dice(expression)?.roll_with(dice))
}

/// Check if a d20 roll is a natural 20 (critical hit)
pub fn is_critical(roll: u32) -> bool {
    roll == 20
}

/// Check if a d20 roll is a natural 1 (critical fail)
pub fn is_fumble(roll: u32) -> bool {
    roll == 1
}
