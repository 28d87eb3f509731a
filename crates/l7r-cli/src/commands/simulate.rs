use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use l7r_combat::{CombatError, Engine, Fighter, FighterConfig, Side};
use l7r_dice::{Dice, SeededDice};

use super::{Setup, parse_side, probability_table};

/// Tally of a batch of combats.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    wins: [u32; 2],
    undecided: u32,
    rounds: u64,
    decided: u32,
}

impl Tally {
    fn win_rate(&self, side: Side) -> f64 {
        let fought = self.decided + self.undecided;
        if fought == 0 {
            return 0.0;
        }
        let wins = match side {
            Side::A => self.wins[0],
            Side::B => self.wins[1],
        };
        f64::from(wins) / f64::from(fought)
    }

    fn average_rounds(&self) -> f64 {
        if self.decided == 0 {
            return 0.0;
        }
        self.rounds as f64 / f64::from(self.decided)
    }
}

pub fn run(side_a: &[String], side_b: &[String], count: u32, setup: &Setup) -> Result<(), String> {
    if count == 0 {
        return Err("--count must be at least 1".into());
    }
    let a = parse_side(side_a, "A")?;
    let b = parse_side(side_b, "B")?;
    let table = probability_table(setup.trials);

    let mut tally = Tally::default();
    for i in 0..count {
        let seed = setup.seed.wrapping_add(u64::from(i));
        let dice = Dice::new(SeededDice::new(seed), table.clone());
        let mut engine = Engine::new(
            build(&a)?,
            build(&b)?,
            dice,
            setup.combat_config(seed),
        )
        .map_err(|e| e.to_string())?;
        match engine.fight() {
            Ok(winner) => {
                let slot = match winner {
                    Side::A => 0,
                    Side::B => 1,
                };
                tally.wins[slot] += 1;
                tally.decided += 1;
                tally.rounds += engine.record().rounds.len() as u64;
            }
            Err(CombatError::RoundLimit(limit)) => {
                tracing::warn!(seed, limit, "combat undecided");
                tally.undecided += 1;
            }
            Err(e) => return Err(e.to_string()),
        }
    }

    println!(
        "  {} {} combats {}",
        "Simulation".bold(),
        count,
        format!("(seeds {}..{})", setup.seed, setup.seed.wrapping_add(u64::from(count))).dimmed()
    );
    println!();

    let label = |configs: &[FighterConfig]| {
        configs
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut out = Table::new();
    out.set_content_arrangement(ContentArrangement::Dynamic);
    out.set_header(vec!["Side", "Fighters", "Wins", "Win rate"]);
    for (side, configs, wins) in [(Side::A, &a, tally.wins[0]), (Side::B, &b, tally.wins[1])] {
        out.add_row(vec![
            side.to_string(),
            label(configs),
            wins.to_string(),
            format!("{:.1}%", 100.0 * tally.win_rate(side)),
        ]);
    }
    println!("{out}");
    println!();
    println!("  Average rounds: {:.2}", tally.average_rounds());
    if tally.undecided > 0 {
        println!(
            "  {} {} combats hit the round limit",
            "WARN".yellow().bold(),
            tally.undecided
        );
    }
    Ok(())
}

fn build(configs: &[FighterConfig]) -> Result<Vec<Fighter>, String> {
    configs
        .iter()
        .cloned()
        .map(|c| Fighter::new(c).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_rates() {
        let tally = Tally {
            wins: [3, 1],
            undecided: 1,
            rounds: 12,
            decided: 4,
        };
        assert!((tally.win_rate(Side::A) - 0.6).abs() < 1e-9);
        assert!((tally.win_rate(Side::B) - 0.2).abs() < 1e-9);
        assert!((tally.average_rounds() - 3.0).abs() < 1e-9);
        assert_eq!(Tally::default().average_rounds(), 0.0);
    }
}
