//! `XkY` pool values and overflow normalization.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DiceError, DiceResult};

/// Most dice a pool may roll or keep after normalization.
pub const MAX_DICE: i32 = 10;

/// A roll-and-keep dice pool: roll `rolled` d10s and keep the `kept` highest.
///
/// Counts are signed so ability modifiers can subtract dice; a pool with
/// nothing to roll or keep produces a total of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pool {
    /// Dice rolled.
    pub rolled: i32,
    /// Highest dice kept.
    pub kept: i32,
}

impl Pool {
    /// Create a pool rolling `rolled` dice and keeping `kept`.
    pub const fn new(rolled: i32, kept: i32) -> Self {
        Self { rolled, kept }
    }

    /// Returns this pool with extra rolled and kept dice.
    pub const fn with_extra(self, rolled: i32, kept: i32) -> Self {
        Self {
            rolled: self.rolled + rolled,
            kept: self.kept + kept,
        }
    }

    /// Returns true if the pool has no dice to roll or keep.
    pub const fn is_empty(self) -> bool {
        self.rolled <= 0 || self.kept <= 0
    }

    /// Normalize overflow, returning the capped pool and its flat bonus.
    pub fn normalized(self) -> (Pool, i32) {
        let (rolled, kept, bonus) = normalize_pool(self.rolled, self.kept);
        (Pool::new(rolled, kept), bonus)
    }
}

/// Cap a pool at 10k10.
///
/// Rolled dice above ten become extra kept dice (12k4 is 10k6); kept dice
/// above ten become a flat bonus of one per excess die (10k12 is 10k10+2).
pub fn normalize_pool(rolled: i32, kept: i32) -> (i32, i32, i32) {
    let (mut rolled, mut kept) = (rolled, kept);
    let mut bonus = 0;
    if rolled > MAX_DICE {
        kept += rolled - MAX_DICE;
        rolled = MAX_DICE;
    }
    if kept > MAX_DICE {
        bonus = kept - MAX_DICE;
        kept = MAX_DICE;
    }
    (rolled, kept, bonus)
}

impl Add for Pool {
    type Output = Pool;

    fn add(self, rhs: Pool) -> Pool {
        self.with_extra(rhs.rolled, rhs.kept)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}k{}", self.rolled, self.kept)
    }
}

impl FromStr for Pool {
    type Err = DiceError;

    fn from_str(s: &str) -> DiceResult<Self> {
        let text = s.trim().to_lowercase();
        let (rolled, kept) = text
            .split_once('k')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        let rolled: i32 = rolled
            .trim()
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        let kept: i32 = kept
            .trim()
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        let pool = Pool::new(rolled, kept);
        if pool.is_empty() {
            return Err(DiceError::EmptyPool(pool.to_string()));
        }
        Ok(pool)
    }
}
