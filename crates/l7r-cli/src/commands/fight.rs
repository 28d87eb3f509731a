use std::fs;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use l7r_combat::{Engine, Fighter, Side};

use super::{Setup, parse_side};
use crate::transcript;

pub fn run(
    side_a: &[String],
    side_b: &[String],
    setup: &Setup,
    json: bool,
    output: Option<&Path>,
) -> Result<(), String> {
    let a = parse_side(side_a, "A")?;
    let b = parse_side(side_b, "B")?;
    let mut engine =
        Engine::from_config(a, b, setup.combat_config(setup.seed)).map_err(|e| e.to_string())?;
    let outcome = engine.fight();

    if json || output.is_some() {
        let rendered = serde_json::to_string_pretty(engine.record())
            .map_err(|e| format!("cannot serialize record: {e}"))?;
        match output {
            Some(path) => {
                fs::write(path, rendered)
                    .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
                println!("  Record written to {}", path.display());
            }
            None => println!("{rendered}"),
        }
        return outcome.map(|_| ()).map_err(|e| e.to_string());
    }

    let names = |side: Side| {
        engine
            .fighters()
            .iter()
            .filter(|f| f.side() == side)
            .map(Fighter::name)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!(
        "  {} {} vs {} {}",
        "Combat".bold(),
        names(Side::A),
        names(Side::B),
        format!("(seed={}, {:?})", setup.seed, engine.formation().kind()).dimmed()
    );
    println!();
    transcript::print_record(engine.record());

    let winner = outcome.map_err(|e| e.to_string())?;
    println!(
        "  {} side {winner} ({})",
        "Winner:".green().bold(),
        names(winner)
    );
    println!();
    print_status(engine.fighters());
    Ok(())
}

fn print_status(fighters: &[Fighter]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Fighter", "Side", "Light", "Serious", "VPs", "Status"]);
    for fighter in fighters {
        let status = if fighter.is_dead() {
            "dead"
        } else if fighter.is_crippled() {
            "crippled"
        } else {
            "standing"
        };
        table.add_row(vec![
            fighter.name().to_string(),
            fighter.side().to_string(),
            fighter.light.to_string(),
            format!("{}/{}", fighter.serious, fighter.sw_to_kill()),
            fighter.vps.to_string(),
            status.to_string(),
        ]);
    }
    println!("{table}");
}
