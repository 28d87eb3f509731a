//! Human-readable rendering of combat records.

use colored::Colorize;

use l7r_combat::{
    ActionRecord, AttackRecord, CombatRecord, DamageRecord, DuelRecord, Modifier, ParryRecord,
    RoundRecord, WoundCheckRecord,
};

/// Print the whole combat: the duel, then every round that saw action.
pub fn print_record(record: &CombatRecord) {
    if let Some(duel) = &record.duel {
        print_duel(duel);
    }
    for round in &record.rounds {
        print_round(round);
    }
}

fn print_duel(duel: &DuelRecord) {
    println!("  {} {} vs {}", "Duel".bold().underline(), duel.a, duel.b);
    for round in &duel.rounds {
        let stance = |strikes: bool| if strikes { "strikes" } else { "focuses" };
        println!(
            "    {} contested {} / {}: {} {}, {} {}{}",
            format!("[{}]", round.number).dimmed(),
            round.contested_a.total,
            round.contested_b.total,
            duel.a,
            stance(round.a_strikes),
            duel.b,
            stance(round.b_strikes),
            if round.forced { " (forced)" } else { "" }
        );
        for strike in &round.strikes {
            print_attack(strike, 3);
        }
        if round.resheathe {
            println!("      {}", "both miss and resheathe".dimmed());
        }
    }
    for death in &duel.deaths {
        println!("    {} {death}", "DEATH".red().bold());
    }
    println!();
}

fn print_round(round: &RoundRecord) {
    println!("  {}", format!("Round {}", round.number).bold().underline());
    for init in &round.initiatives {
        let actions: Vec<String> = init.actions.iter().map(|a| a.to_string()).collect();
        println!(
            "    {} {} [{}]",
            "initiative".dimmed(),
            init.fighter,
            actions.join(", ")
        );
    }
    for (phase, actions) in round.phases.iter().enumerate() {
        if actions.is_empty() {
            continue;
        }
        println!("    {}", format!("Phase {phase}").cyan());
        for action in actions {
            print_action(action, 3);
        }
    }
    println!();
}

fn print_action(action: &ActionRecord, depth: usize) {
    match action {
        ActionRecord::Attack(attack) => print_attack(attack, depth),
        ActionRecord::Parry(parry) => print_parry(parry, depth),
        ActionRecord::Damage(damage) => print_damage(damage, depth),
        ActionRecord::WoundCheck(check) => print_wound_check(check, depth),
        ActionRecord::Death { fighter } => {
            println!("{}{} {fighter}", indent(depth), "DEATH".red().bold());
        }
    }
}

fn print_attack(attack: &AttackRecord, depth: usize) {
    let Some(roll) = &attack.roll else {
        println!(
            "{}{} attack on {} never lands",
            indent(depth),
            attack.attacker,
            attack.defender
        );
        print_children(&attack.children, depth);
        return;
    };
    let outcome = if attack.hit {
        "HIT".green().bold()
    } else {
        "MISS".yellow()
    };
    println!(
        "{}{} {} {}: {}{}{} = {} vs TN {} {}",
        indent(depth),
        attack.attacker,
        attack.knack.to_string().bold(),
        attack.defender,
        roll.total,
        format_modifiers(&attack.modifiers),
        format_vps(attack.vps_spent),
        attack.total,
        attack.tn,
        outcome
    );
    print_children(&attack.children, depth);
}

fn print_children(children: &[ActionRecord], depth: usize) {
    for child in children {
        print_action(child, depth + 1);
    }
}

fn print_parry(parry: &ParryRecord, depth: usize) {
    let outcome = if parry.success {
        "PARRIED".green().bold()
    } else {
        "FAILED".red()
    };
    let on_behalf = parry
        .on_behalf_of
        .as_ref()
        .map(|ally| format!(" for {ally}"))
        .unwrap_or_default();
    let mut tags = Vec::new();
    if parry.predeclared {
        tags.push("pre-declared");
    }
    if parry.interrupt {
        tags.push("interrupt");
    }
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!(" ({})", tags.join(", "))
    };
    println!(
        "{}{} parries{on_behalf}{tags}: {}{}{} = {} vs {} {}",
        indent(depth),
        parry.parrier,
        parry.roll.total,
        format_modifiers(&parry.modifiers),
        format_vps(parry.vps_spent),
        parry.total,
        parry.tn,
        outcome
    );
}

fn print_damage(damage: &DamageRecord, depth: usize) {
    let serious = if damage.serious > 0 {
        format!(" +{} serious", damage.serious)
    } else {
        String::new()
    };
    println!(
        "{}damage {}k{}: {} light{serious}",
        indent(depth),
        damage.roll.rolled,
        damage.roll.kept,
        damage.light
    );
}

fn print_wound_check(check: &WoundCheckRecord, depth: usize) {
    let outcome = if check.passed {
        "passed".green()
    } else {
        "failed".red()
    };
    let serious = if check.serious_taken > 0 {
        format!(", {} serious", check.serious_taken)
            .red()
            .to_string()
    } else {
        String::new()
    };
    let voluntary = if check.voluntary_serious {
        " (took a serious to clear light)"
    } else {
        ""
    };
    println!(
        "{}{} wound check: {}{}{} = {} vs {} {}{serious}{voluntary}",
        indent(depth),
        check.fighter,
        check.roll.total,
        format_modifiers(&check.modifiers),
        format_vps(check.vps_spent),
        check.total,
        check.light_total,
        outcome
    );
}

fn format_modifiers(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(|m| format!(" {:+} {}", m.value, m.source.label()))
        .collect()
}

fn format_vps(vps: i32) -> String {
    if vps > 0 {
        format!(" [{vps} VP]")
    } else {
        String::new()
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
