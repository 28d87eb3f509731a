pub mod fight;
pub mod odds;
pub mod simulate;

use std::sync::Arc;

use l7r_combat::{CombatConfig, FighterConfig, FormationKind};
use l7r_dice::{ProbabilityTable, SeededDice};

/// Seed for private probability tables requested with `--trials`.
const TABLE_SEED: u64 = 0x5eed;

/// Flags shared by `fight` and `simulate`.
pub struct Setup {
    pub seed: u64,
    pub trials: Option<u32>,
    pub line: bool,
    pub duel: bool,
    pub max_rounds: u32,
}

impl Setup {
    /// The combat config for the fight with `seed`.
    pub fn combat_config(&self, seed: u64) -> CombatConfig {
        let formation = if self.line {
            FormationKind::Line
        } else {
            FormationKind::Surround
        };
        let config = CombatConfig::default()
            .with_seed(seed)
            .with_max_rounds(self.max_rounds)
            .with_duel(self.duel)
            .with_formation(formation);
        match self.trials {
            Some(trials) => config.with_table_trials(trials),
            None => config,
        }
    }
}

/// The shared table, or a private one with `trials` rolls per pool.
pub fn probability_table(trials: Option<u32>) -> Arc<ProbabilityTable> {
    match trials {
        Some(trials) => Arc::new(ProbabilityTable::generate(
            trials,
            &mut SeededDice::new(TABLE_SEED),
        )),
        None => ProbabilityTable::standard(),
    }
}

/// Parse every `--a`/`--b` value of one side. Unnamed fighters are called
/// `<side><n>`.
pub fn parse_side(specs: &[String], side: &str) -> Result<Vec<FighterConfig>, String> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| parse_fighter(spec, &format!("{side}{}", i + 1)))
        .collect()
}

/// Parse `name=Akodo,fire=3,attack=3,double_attack=2` into a validated
/// fighter config.
pub fn parse_fighter(spec: &str, default_name: &str) -> Result<FighterConfig, String> {
    let mut name = default_name.to_string();
    let mut stats = Vec::new();
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.eq_ignore_ascii_case("name") {
            name = value.trim().to_string();
            continue;
        }
        let value: i32 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid value '{}' for stat '{key}'", value.trim()))?;
        stats.push((key, value));
    }
    FighterConfig::from_stats(name, stats).map_err(|e| format!("fighter '{spec}': {e}"))
}
