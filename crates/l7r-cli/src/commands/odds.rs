use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use l7r_dice::Pool;

use super::probability_table;

/// TNs listed when no `--tn` is given.
const COMMON_TNS: [i32; 12] = [5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60];

pub fn run(pool: &str, tn: Option<i32>, explode: bool, trials: Option<u32>) -> Result<(), String> {
    let pool: Pool = pool.parse().map_err(|e| format!("{e}"))?;
    let table = probability_table(trials);
    let (normal, bonus) = pool.normalized();

    let mode = if explode { "exploding" } else { "no explode" };
    let shown = if bonus > 0 {
        format!("{pool} = {normal}+{bonus}")
    } else if normal != pool {
        format!("{pool} = {normal}")
    } else {
        pool.to_string()
    };
    println!(
        "  {} {shown} {}",
        "Pool".bold(),
        format!("({mode}, {} trials)", table.trials()).dimmed()
    );
    println!(
        "  Expected total: {:.2}",
        table.expected_value(pool, explode)
    );

    if let Some(tn) = tn {
        let p = table.probability(pool, tn, explode);
        println!("  P(total >= {tn}): {:.1}%", 100.0 * p);
        return Ok(());
    }

    println!();
    let mut out = Table::new();
    out.set_content_arrangement(ContentArrangement::Dynamic);
    out.set_header(vec!["TN", "Chance"]);
    for tn in COMMON_TNS {
        let p = table.probability(pool, tn, explode);
        out.add_row(vec![tn.to_string(), format!("{:.1}%", 100.0 * p)]);
    }
    println!("{out}");
    Ok(())
}
