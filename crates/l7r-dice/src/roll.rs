//! Rolling individual dice and whole pools with full per-die detail.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::source::DiceSource;

/// The outcome of a single (possibly exploded) die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    /// Total shown by the die, including any explosion chain.
    pub face: u32,
    /// Whether the die counted toward the pool total.
    pub kept: bool,
    /// Whether the die rolled at least one 10 and re-rolled.
    pub exploded: bool,
}

/// The outcome of a whole pool roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Dice actually rolled, after normalization.
    pub rolled: i32,
    /// Dice kept, after normalization.
    pub kept: i32,
    /// Whether 10s exploded.
    pub explode: bool,
    /// Every die, sorted ascending by face.
    pub dice: Vec<DieResult>,
    /// Flat bonus from kept-dice overflow.
    pub overflow_bonus: i32,
    /// Sum of kept dice plus the overflow bonus.
    pub total: i32,
}

impl DiceRoll {
    /// Faces of the kept dice, ascending.
    pub fn kept_faces(&self) -> Vec<u32> {
        self.dice.iter().filter(|d| d.kept).map(|d| d.face).collect()
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}k{} [", self.rolled, self.kept)?;
        for (i, die) in self.dice.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if die.kept {
                write!(f, "*")?;
            }
            write!(f, "{}", die.face)?;
            if die.exploded {
                write!(f, "!")?;
            }
        }
        write!(f, "]")?;
        if self.overflow_bonus > 0 {
            write!(f, " +{}", self.overflow_bonus)?;
        }
        write!(f, " = {}", self.total)
    }
}

/// Roll one d10. With `explode`, each 10 rolls again and adds, indefinitely.
pub fn roll_die(source: &mut dyn DiceSource, explode: bool) -> DieResult {
    let mut face = source.face();
    let mut total = face;
    let mut exploded = false;
    while explode && face == 10 {
        exploded = true;
        face = source.face();
        total += face;
    }
    DieResult {
        face: total,
        kept: false,
        exploded,
    }
}

/// Roll a pool: normalize, roll, keep the highest dice, add the flat bonus.
pub fn roll_pool(source: &mut dyn DiceSource, pool: Pool, explode: bool) -> DiceRoll {
    let (normal, bonus) = pool.normalized();
    let mut dice = roll_sorted(source, normal.rolled, explode);
    let keep = normal.kept.clamp(0, normal.rolled.max(0)) as usize;
    let start = dice.len() - keep;
    for die in &mut dice[start..] {
        die.kept = true;
    }
    finish(normal, explode, dice, bonus)
}

/// Roll a pool without exploding and keep the lowest dice.
///
/// Used for action dice, where lower faces act sooner. Action dice are never
/// totalled, so the pool is not normalized: 11k9 rolls eleven dice and keeps
/// the lowest nine.
pub fn roll_keep_lowest(source: &mut dyn DiceSource, pool: Pool) -> DiceRoll {
    let mut dice = roll_sorted(source, pool.rolled, false);
    let keep = pool.kept.clamp(0, pool.rolled.max(0)) as usize;
    for die in &mut dice[..keep] {
        die.kept = true;
    }
    finish(pool, false, dice, 0)
}

fn roll_sorted(source: &mut dyn DiceSource, rolled: i32, explode: bool) -> Vec<DieResult> {
    let mut dice: Vec<DieResult> = (0..rolled.max(0))
        .map(|_| roll_die(source, explode))
        .collect();
    dice.sort_by_key(|d| d.face);
    dice
}

fn finish(pool: Pool, explode: bool, dice: Vec<DieResult>, bonus: i32) -> DiceRoll {
    let kept_sum: u32 = dice.iter().filter(|d| d.kept).map(|d| d.face).sum();
    DiceRoll {
        rolled: pool.rolled.max(0),
        kept: pool.kept.clamp(0, pool.rolled.max(0)),
        explode,
        dice,
        overflow_bonus: bonus,
        total: kept_sum as i32 + bonus,
    }
}
