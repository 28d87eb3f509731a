//! Combat scenario integration tests.
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use l7r_combat::{
    ActionRecord, CombatConfig, Engine, Fighter, FighterConfig, FighterId, FormationKind, Layout,
    RollType, Rings, Side,
};
use l7r_dice::{Dice, ProbabilityTable, ScriptedDice, SeededDice};

fn table() -> Arc<ProbabilityTable> {
    static TABLE: OnceLock<Arc<ProbabilityTable>> = OnceLock::new();
    TABLE
        .get_or_init(|| Arc::new(ProbabilityTable::generate(5_000, &mut SeededDice::new(8))))
        .clone()
}

fn samurai(name: &str) -> FighterConfig {
    FighterConfig::new(name)
        .with_rings(Rings::uniform(3))
        .with_attack(3)
        .with_parry(3)
}

fn fighters(prefix: &str, n: usize, f: impl Fn(FighterConfig) -> FighterConfig) -> Vec<Fighter> {
    (0..n)
        .map(|i| Fighter::new(f(samurai(&format!("{prefix}{i}")))).unwrap())
        .collect()
}

fn seeded_engine(n_a: usize, n_b: usize, seed: u64, kind: FormationKind) -> Engine {
    Engine::new(
        fighters("A", n_a, |c| c),
        fighters("B", n_b, |c| c),
        Dice::new(SeededDice::new(seed), table()),
        CombatConfig::default().with_seed(seed).with_formation(kind),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// forced dice
// ---------------------------------------------------------------------------

#[test]
fn scripted_hit_wounds_the_defender() {
    let faces = [
        10, 4, 10, 4, 10, 2, 1, 1, 1, // attack: 14 + 14 + 12
        9, 8, 7, 1, 1, 1, 1, 1, 1, 1, // damage: 10k3 keeps 9 + 8 + 7
        5, 5, 4, 1, // wound check: 5 + 5 + 4
    ];
    let mut a = fighters("Akodo", 1, |c| c);
    let mut b = fighters("Hida", 1, |c| c);
    a[0].vps = 0;
    b[0].vps = 0;
    let mut engine = Engine::new(
        a,
        b,
        Dice::new(ScriptedDice::new(faces), table()),
        CombatConfig::default(),
    )
    .unwrap();

    let record = engine.resolve_attack(RollType::Attack, FighterId(0), FighterId(1));
    assert_eq!(record.total, 40);
    assert_eq!(record.tn, 20);
    assert!(record.hit);

    let kinds: Vec<_> = record
        .children
        .iter()
        .map(|child| match child {
            ActionRecord::Damage(d) => ("damage", d.light),
            ActionRecord::WoundCheck(w) => ("wound_check", w.total),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![("damage", 24), ("wound_check", 14)]);

    let hida = engine.fighter(FighterId(1)).unwrap();
    assert_eq!(hida.serious, 1);
    assert_eq!(hida.light, 0);
    assert_eq!(hida.tn, 20);
}

// ---------------------------------------------------------------------------
// invariants over seeded fights
// ---------------------------------------------------------------------------

#[test]
fn tns_restored_after_double_attacks() {
    for seed in 0..8 {
        let mut engine = Engine::new(
            fighters("A", 2, |c| c.with_knack(RollType::DoubleAttack, 3)),
            fighters("B", 2, |c| c.with_knack(RollType::DoubleAttack, 3)),
            Dice::new(SeededDice::new(seed), table()),
            CombatConfig::default().with_formation(FormationKind::Line),
        )
        .unwrap();
        engine.fight().unwrap();
        for fighter in engine.fighters() {
            assert_eq!(fighter.tn, fighter.base_tn(), "seed {seed}: {}", fighter.name());
        }
    }
}

#[test]
fn every_death_recorded_once() {
    for seed in 0..6 {
        let mut engine = seeded_engine(3, 3, seed, FormationKind::Line);
        let winner = engine.fight().unwrap();
        let deaths: Vec<String> = engine
            .record()
            .rounds
            .iter()
            .flat_map(|round| round.actions())
            .filter_map(|action| match action {
                ActionRecord::Death { fighter } => Some(fighter.clone()),
                _ => None,
            })
            .collect();
        let unique: HashSet<_> = deaths.iter().collect();
        assert_eq!(unique.len(), deaths.len(), "seed {seed}");
        let dead = engine.fighters().iter().filter(|f| f.is_dead()).count();
        assert_eq!(deaths.len(), dead, "seed {seed}");
        assert!(engine.formation().side(winner.opposite()).is_empty());
    }
}

#[test]
fn resources_never_go_negative() {
    for seed in 10..16 {
        let mut engine = seeded_engine(2, 3, seed, FormationKind::Surround);
        engine.fight().unwrap();
        for fighter in engine.fighters() {
            assert!(fighter.vps >= 0);
            assert!(fighter.light >= 0);
            assert!(fighter.actions.iter().all(|&a| (0..=10).contains(&a)));
        }
    }
}

// ---------------------------------------------------------------------------
// formation
// ---------------------------------------------------------------------------

#[test]
fn lone_fighter_is_encircled() {
    let engine = seeded_engine(1, 3, 1, FormationKind::Surround);
    assert_eq!(
        engine.formation().layout(),
        Layout::Encircled {
            inner: FighterId(0)
        }
    );
    assert_eq!(engine.formation().surround_bonus(), 20);
    for id in engine.formation().side(Side::B) {
        let fighter = engine.fighter(*id).unwrap();
        assert_eq!(fighter.bonuses.permanent(RollType::Attack), 20);
        assert!(engine.formation().can_reach(*id, FighterId(0)));
    }
    assert_eq!(engine.formation().attackable(FighterId(0)).len(), 3);
}

#[test]
fn line_kind_never_encircles() {
    let engine = seeded_engine(1, 3, 1, FormationKind::Line);
    assert_eq!(engine.formation().layout(), Layout::Line);
    assert_eq!(engine.formation().surround_bonus(), 0);
}

#[test]
fn surround_bonuses_gone_after_fight() {
    for seed in 0..6 {
        let mut engine = seeded_engine(1, 3, seed, FormationKind::Surround);
        engine.fight().unwrap();
        assert_eq!(engine.formation().surround_bonus(), 0);
        for fighter in engine.fighters() {
            assert_eq!(
                fighter.bonuses.permanent(RollType::Attack),
                0,
                "seed {seed}: {}",
                fighter.name()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// full combats
// ---------------------------------------------------------------------------

#[test]
fn seeded_combat_is_reproducible() {
    let run = || {
        let mut engine = Engine::from_config(
            vec![samurai("Akodo"), samurai("Matsu")],
            vec![samurai("Hida").with_knack(RollType::DoubleAttack, 2)],
            CombatConfig::default().with_seed(77).with_table_trials(2_000),
        )
        .unwrap();
        let winner = engine.fight().unwrap();
        (winner, engine.into_record())
    };
    let (first_winner, first) = run();
    let (second_winner, second) = run();
    assert_eq!(first_winner, second_winner);
    assert_eq!(first, second);
    assert_eq!(first.winner, Some(first_winner));
}

#[test]
fn duel_opens_the_combat() {
    let mut engine = Engine::from_config(
        vec![samurai("Kakita").with_xp(120)],
        vec![samurai("Doji").with_xp(90)],
        CombatConfig::default()
            .with_seed(3)
            .with_table_trials(2_000)
            .with_duel(true),
    )
    .unwrap();
    engine.fight().unwrap();
    let duel = engine.record().duel.as_ref().unwrap();
    assert_eq!(duel.a, "Kakita");
    assert_eq!(duel.b, "Doji");
    assert!(!duel.rounds.is_empty());
    let last = duel.rounds.last().unwrap();
    assert!(last.strikes.iter().any(|s| s.hit));
}

#[test]
fn record_serializes_to_json() {
    let mut engine = seeded_engine(1, 1, 4, FormationKind::Line);
    engine.fight().unwrap();
    let json = serde_json::to_string(engine.record()).unwrap();
    assert!(json.contains("\"kind\":\"attack\""));
    assert!(json.contains("\"kind\":\"death\""));
    assert!(json.contains("\"winner\""));
}
