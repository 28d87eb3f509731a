//! Monte-Carlo probability and average tables for every pool up to 10k10.
//!
//! The combat AI never computes odds analytically. It asks this table,
//! which is built once by simulation: for each (rolled, kept, explode)
//! combination it records the empirical average and the empirical
//! probability of reaching every achievable total.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::pool::{MAX_DICE, Pool};
use crate::roll::roll_pool;
use crate::source::{DiceSource, SeededDice};

/// Trials per pool for the process-wide table.
pub const STANDARD_TRIALS: u32 = 100_000;

/// Seed for the process-wide table, so every run sees the same odds.
pub const STANDARD_SEED: u64 = 0x4c37_5221;

static STANDARD: OnceLock<Arc<ProbabilityTable>> = OnceLock::new();

/// Empirical statistics for one pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    /// Mean total.
    pub average: f64,
    /// `at_least[t]` is the probability that the total is at least `t`.
    pub at_least: Vec<f64>,
}

impl PoolStats {
    fn from_histogram(counts: &[u64], trials: u32) -> Self {
        let trials = f64::from(trials.max(1));
        let weighted: f64 = counts
            .iter()
            .enumerate()
            .map(|(total, &n)| total as f64 * n as f64)
            .sum();
        let mut at_least = vec![0.0; counts.len()];
        let mut running = 0u64;
        for t in (0..counts.len()).rev() {
            running += counts[t];
            at_least[t] = running as f64 / trials;
        }
        Self {
            average: weighted / trials,
            at_least,
        }
    }

    fn probability(&self, target: i32) -> f64 {
        usize::try_from(target)
            .ok()
            .and_then(|t| self.at_least.get(t))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Lookup table of hit probabilities and averages keyed by pool.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityTable {
    trials: u32,
    entries: HashMap<(i32, i32, bool), PoolStats>,
}

impl ProbabilityTable {
    /// Build a table by rolling every pool up to 10k10 `trials` times.
    pub fn generate(trials: u32, source: &mut dyn DiceSource) -> Self {
        tracing::info!(trials, "generating probability table");
        let mut entries = HashMap::new();
        for explode in [true, false] {
            for rolled in 1..=MAX_DICE {
                for kept in 1..=rolled {
                    let mut counts: Vec<u64> = Vec::new();
                    for _ in 0..trials {
                        let total = roll_pool(source, Pool::new(rolled, kept), explode).total;
                        let idx = usize::try_from(total).unwrap_or(0);
                        if counts.len() <= idx {
                            counts.resize(idx + 1, 0);
                        }
                        counts[idx] += 1;
                    }
                    entries.insert(
                        (rolled, kept, explode),
                        PoolStats::from_histogram(&counts, trials),
                    );
                }
            }
        }
        tracing::debug!(pools = entries.len(), "probability table ready");
        Self { trials, entries }
    }

    /// The shared table built from [`STANDARD_TRIALS`] trials per pool.
    ///
    /// Built on first use and reused for the life of the process.
    pub fn standard() -> Arc<ProbabilityTable> {
        Arc::clone(STANDARD.get_or_init(|| {
            let mut source = SeededDice::new(STANDARD_SEED);
            Arc::new(Self::generate(STANDARD_TRIALS, &mut source))
        }))
    }

    /// Trials rolled per pool.
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Raw statistics for a pool already inside 10k10.
    pub fn stats(&self, rolled: i32, kept: i32, explode: bool) -> Option<&PoolStats> {
        self.entries.get(&(rolled, kept, explode))
    }

    /// Probability that `pool` totals at least `target`.
    ///
    /// The pool is normalized first, so 12k4 reads as 10k6 and a kept
    /// overflow lowers the target by its flat bonus. Totals the table never
    /// observed, and empty pools, have probability 0.
    pub fn probability(&self, pool: Pool, target: i32, explode: bool) -> f64 {
        let (normal, bonus) = pool.normalized();
        let target = target - bonus;
        if target <= 0 {
            return 1.0;
        }
        if normal.is_empty() {
            return 0.0;
        }
        let kept = normal.kept.min(normal.rolled);
        self.stats(normal.rolled, kept, explode)
            .map_or(0.0, |s| s.probability(target))
    }

    /// Expected total of `pool`.
    ///
    /// Pools that overflow 10k10 into a flat bonus fall back to the
    /// closed-form estimate `61 + 2 * (rolled + kept - 20)`.
    pub fn expected_value(&self, pool: Pool, explode: bool) -> f64 {
        let (normal, bonus) = pool.normalized();
        if normal.is_empty() {
            return 0.0;
        }
        let estimate = f64::from(61 + 2 * (pool.rolled + pool.kept - 20));
        if bonus > 0 {
            return estimate;
        }
        let kept = normal.kept.min(normal.rolled);
        self.stats(normal.rolled, kept, explode)
            .map_or(estimate, |s| s.average)
    }
}
