//! Error types for combat setup and orchestration.
//!
//! Running out of void points, bonuses or action dice is never an error;
//! those cases simply spend nothing.

use l7r_dice::Pool;

use crate::formation::Side;
use crate::ring::Ring;
use crate::roll_type::RollType;

/// Errors that can occur while building or running a combat.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// A ring is outside 1..=10.
    #[error("ring {ring} must be between 1 and 10, got {value}")]
    InvalidRing {
        /// The offending ring.
        ring: Ring,
        /// Its value.
        value: i32,
    },

    /// A stat that cannot be negative is.
    #[error("{stat} cannot be negative, got {value}")]
    NegativeStat {
        /// Stat name.
        stat: String,
        /// Its value.
        value: i32,
    },

    /// A skill is trained past its cap.
    #[error("{stat} is {value}, above the cap of {cap}")]
    SkillAboveCap {
        /// Stat name.
        stat: String,
        /// Its value.
        value: i32,
        /// The cap.
        cap: i32,
    },

    /// A stat name is not recognized.
    #[error("unknown stat '{0}'")]
    UnknownStat(String),

    /// A roll type that is not a knack was given a knack level.
    #[error("{0} is not a knack")]
    NotAKnack(RollType),

    /// A weapon with no damage dice.
    #[error("weapon must roll and keep at least one die, got {0}")]
    InvalidWeapon(Pool),

    /// A side has no fighters.
    #[error("side {0} has no fighters")]
    EmptySide(Side),

    /// A duel was requested without exactly one fighter per side.
    #[error("a duel needs exactly one fighter per side, got {side_a} and {side_b}")]
    DuelRequiresSingles {
        /// Fighters on side A.
        side_a: usize,
        /// Fighters on side B.
        side_b: usize,
    },

    /// The combat ran past its round limit.
    #[error("combat still undecided after {0} rounds")]
    RoundLimit(u32),
}

/// Convenience result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
