//! The [`Dice`] handle combatants roll and estimate through.

use std::fmt;
use std::sync::Arc;

use crate::pool::Pool;
use crate::roll::{DiceRoll, DieResult, roll_die, roll_keep_lowest, roll_pool};
use crate::source::{DiceSource, SeededDice};
use crate::table::ProbabilityTable;

/// A dice source paired with the probability table used for estimates.
pub struct Dice {
    source: Box<dyn DiceSource>,
    table: Arc<ProbabilityTable>,
}

impl fmt::Debug for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dice")
            .field("table_trials", &self.table.trials())
            .finish()
    }
}

impl Dice {
    /// Combine a dice source with a probability table.
    pub fn new(source: impl DiceSource + 'static, table: Arc<ProbabilityTable>) -> Self {
        Self {
            source: Box::new(source),
            table,
        }
    }

    /// Seeded dice over the shared standard table.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SeededDice::new(seed), ProbabilityTable::standard())
    }

    /// The probability table backing estimates.
    pub fn table(&self) -> &Arc<ProbabilityTable> {
        &self.table
    }

    /// Roll a single d10.
    pub fn d10(&mut self, explode: bool) -> DieResult {
        roll_die(self.source.as_mut(), explode)
    }

    /// Roll a pool, keeping the highest dice.
    pub fn roll(&mut self, pool: Pool, explode: bool) -> DiceRoll {
        roll_pool(self.source.as_mut(), pool, explode)
    }

    /// Roll a pool without exploding, keeping the lowest dice.
    pub fn roll_keep_lowest(&mut self, pool: Pool) -> DiceRoll {
        roll_keep_lowest(self.source.as_mut(), pool)
    }

    /// Uniform index in `0..upper`.
    pub fn pick(&mut self, upper: usize) -> usize {
        self.source.pick(upper)
    }

    /// Probability that `pool` totals at least `target`.
    pub fn probability(&self, pool: Pool, target: i32, explode: bool) -> f64 {
        self.table.probability(pool, target, explode)
    }

    /// Expected total of `pool`.
    pub fn expected_value(&self, pool: Pool, explode: bool) -> f64 {
        self.table.expected_value(pool, explode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedDice;

    #[test]
    fn scripted_rolls_flow_through() {
        let table = Arc::new(ProbabilityTable::default());
        let mut dice = Dice::new(ScriptedDice::new([4, 9, 1]), table);
        let roll = dice.roll(Pool::new(3, 1), true);
        assert_eq!(roll.total, 9);
        assert_eq!(dice.d10(false).face, 4);
    }

    #[test]
    fn empty_table_degrades_gracefully() {
        let dice = Dice::new(ScriptedDice::default(), Arc::new(ProbabilityTable::default()));
        assert_eq!(dice.probability(Pool::new(5, 3), 20, true), 0.0);
        assert!((dice.expected_value(Pool::new(5, 3), true) - 37.0).abs() < f64::EPSILON);
    }
}
