//! Roll-and-keep dice engine for the L7R combat simulator.
//!
//! Every roll in the system is an `XkY` pool of ten-sided dice: roll X,
//! keep the Y highest, and (usually) let 10s explode. This crate provides
//! pool normalization, detailed rolling against an injectable
//! [`DiceSource`], and a Monte-Carlo [`ProbabilityTable`] that the combat
//! AI consults for every spending decision.

pub mod error;
pub mod pool;
pub mod roll;
pub mod roller;
pub mod source;
pub mod table;

pub use error::{DiceError, DiceResult};
pub use pool::{MAX_DICE, Pool, normalize_pool};
pub use roll::{DiceRoll, DieResult, roll_die, roll_keep_lowest, roll_pool};
pub use roller::Dice;
pub use source::{DiceSource, ScriptedDice, SeededDice};
pub use table::{PoolStats, ProbabilityTable};
