//! Round and phase orchestration.
//!
//! Each round every living fighter rolls initiative, then phases 0 through
//! 10 are scanned in initiative order until nobody has a ready action. Each
//! chosen action is resolved through [`Engine::resolve_attack`]. Deaths are
//! swept after every action: the `death` event fires once and the
//! formation redeploys.

mod attack;
mod duel;

use std::sync::Arc;

use l7r_dice::{Dice, ProbabilityTable, SeededDice};

use crate::config::{CombatConfig, FighterConfig};
use crate::error::{CombatError, CombatResult};
use crate::event::{Event, EventArgs};
use crate::fighter::{Fighter, FighterId, TargetView};
use crate::formation::{Formation, Side};
use crate::record::{ActionRecord, CombatRecord, RoundRecord};

/// Offset between the fight seed and the seed of a private probability table.
const TABLE_SEED_OFFSET: u64 = 0x7AB1E;

/// Runs one combat from deployment to a winner.
#[derive(Debug)]
pub struct Engine {
    fighters: Vec<Fighter>,
    order: Vec<FighterId>,
    fallen: Vec<bool>,
    formation: Formation,
    dice: Dice,
    config: CombatConfig,
    phase: i32,
    record: CombatRecord,
}

impl Engine {
    /// Deploy two sides. Fighters are numbered side A first.
    pub fn new(
        side_a: Vec<Fighter>,
        side_b: Vec<Fighter>,
        dice: Dice,
        config: CombatConfig,
    ) -> CombatResult<Self> {
        if side_a.is_empty() {
            return Err(CombatError::EmptySide(Side::A));
        }
        if side_b.is_empty() {
            return Err(CombatError::EmptySide(Side::B));
        }
        let mut fighters = Vec::with_capacity(side_a.len() + side_b.len());
        let mut ids = [Vec::new(), Vec::new()];
        for (slot, side, members) in [(0, Side::A, side_a), (1, Side::B, side_b)] {
            for mut fighter in members {
                fighter.id = FighterId(fighters.len());
                fighter.side = side;
                ids[slot].push(fighter.id);
                fighters.push(fighter);
            }
        }
        let [ids_a, ids_b] = ids;
        let formation = Formation::new(config.formation, ids_a, ids_b, &mut fighters)?;
        let order = fighters.iter().map(Fighter::id).collect();
        let fallen = vec![false; fighters.len()];
        Ok(Self {
            fighters,
            order,
            fallen,
            formation,
            dice,
            config,
            phase: 0,
            record: CombatRecord::default(),
        })
    }

    /// Build fighters from configs and seed the dice from `config`.
    ///
    /// Uses the shared standard table unless `table_trials` asks for a
    /// private one.
    pub fn from_config(
        side_a: Vec<FighterConfig>,
        side_b: Vec<FighterConfig>,
        config: CombatConfig,
    ) -> CombatResult<Self> {
        let build = |configs: Vec<FighterConfig>| {
            configs
                .into_iter()
                .map(Fighter::new)
                .collect::<CombatResult<Vec<_>>>()
        };
        let table = match config.table_trials {
            Some(trials) => Arc::new(ProbabilityTable::generate(
                trials,
                &mut SeededDice::new(config.seed.wrapping_add(TABLE_SEED_OFFSET)),
            )),
            None => ProbabilityTable::standard(),
        };
        let dice = Dice::new(SeededDice::new(config.seed), table);
        Self::new(build(side_a)?, build(side_b)?, dice, config)
    }

    /// Run the combat until one side is wiped out.
    ///
    /// Fires `pre_fight`, fights the opening duel if configured, then
    /// plays rounds. Fails if the round limit is reached first.
    pub fn fight(&mut self) -> CombatResult<Side> {
        tracing::info!(
            side_a = self.formation.side(Side::A).len(),
            side_b = self.formation.side(Side::B).len(),
            formation = ?self.formation.kind(),
            duel = self.config.duel,
            "combat started"
        );
        for fighter in &mut self.fighters {
            fighter.fire(Event::PreFight, None, &EventArgs::None);
        }
        if self.config.duel {
            self.duel()?;
        }
        while !self.finished() {
            if self.record.rounds.len() as u32 >= self.config.max_rounds {
                tracing::warn!(rounds = self.config.max_rounds, "round limit reached");
                return Err(CombatError::RoundLimit(self.config.max_rounds));
            }
            self.round();
        }
        let winner = if self.formation.side(Side::A).is_empty() {
            Side::B
        } else {
            Side::A
        };
        self.record.winner = Some(winner);
        tracing::info!(%winner, rounds = self.record.rounds.len(), "combat finished");
        Ok(winner)
    }

    /// Play one round: initiative, phases 0 through 10, cleanup.
    pub fn round(&mut self) {
        let number = self.record.rounds.len() as u32 + 1;
        self.record.rounds.push(RoundRecord::new(number));
        tracing::debug!(round = number, "round started");

        for id in self.order.clone() {
            let fighter = &mut self.fighters[id.0];
            fighter.fire(Event::PreRound, None, &EventArgs::None);
            let initiative = fighter.initiative(&mut self.dice);
            if let Some(round) = self.record.rounds.last_mut() {
                round.initiatives.push(initiative);
            }
        }
        let fighters = &self.fighters;
        self.order
            .sort_by(|x, y| fighters[x.0].init_order.cmp(&fighters[y.0].init_order));

        for phase in 0..=10 {
            self.phase = phase;
            for fighter in &mut self.fighters {
                fighter.phase = phase;
            }
            loop {
                let mut acted = false;
                for i in 0..self.order.len() {
                    let id = self.order[i];
                    if self.fallen[id.0] {
                        continue;
                    }
                    let targets: Vec<TargetView> = self
                        .formation
                        .attackable(id)
                        .into_iter()
                        .map(|t| TargetView::of(&self.fighters[t.0]))
                        .collect();
                    let Some((knack, target)) =
                        self.fighters[id.0].choose_action(&targets, &mut self.dice)
                    else {
                        continue;
                    };
                    acted = true;
                    let attack = self.resolve_attack(knack, id, target);
                    self.push_action(ActionRecord::Attack(attack));
                    for fighter in self.sweep_deaths() {
                        self.push_action(ActionRecord::Death { fighter });
                    }
                    if self.finished() {
                        return;
                    }
                }
                if !acted {
                    break;
                }
            }
            let fallen = &self.fallen;
            self.order.retain(|id| !fallen[id.0]);
        }

        for id in self.order.clone() {
            self.fighters[id.0].fire(Event::PostRound, None, &EventArgs::None);
        }
    }

    /// Whether one side has no living fighters.
    pub fn finished(&self) -> bool {
        self.formation.one_side_finished()
    }

    /// Every fighter, dead or alive, indexed by id.
    pub fn fighters(&self) -> &[Fighter] {
        &self.fighters
    }

    /// One fighter by id.
    pub fn fighter(&self, id: FighterId) -> Option<&Fighter> {
        self.fighters.get(id.0)
    }

    /// One fighter by id, mutably.
    pub fn fighter_mut(&mut self, id: FighterId) -> Option<&mut Fighter> {
        self.fighters.get_mut(id.0)
    }

    /// The battlefield layout.
    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    /// The combat settings.
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// The current phase.
    pub fn phase(&self) -> i32 {
        self.phase
    }

    /// Everything resolved so far.
    pub fn record(&self) -> &CombatRecord {
        &self.record
    }

    /// Consume the engine and keep the record.
    pub fn into_record(self) -> CombatRecord {
        self.record
    }

    /// Fire `death` once for every newly dead fighter and update the
    /// formation. Returns their names.
    pub(crate) fn sweep_deaths(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        for i in 0..self.fighters.len() {
            if self.fallen[i] || !self.fighters[i].is_dead() {
                continue;
            }
            self.fallen[i] = true;
            let fighter = &mut self.fighters[i];
            tracing::debug!(fighter = %fighter.name(), serious = fighter.serious, "died");
            fighter.fire(Event::Death, None, &EventArgs::None);
            names.push(fighter.name().to_string());
            self.formation.death(FighterId(i), &mut self.fighters);
        }
        names
    }

    fn push_action(&mut self, action: ActionRecord) {
        let phase = self.phase as usize;
        if let Some(list) = self
            .record
            .rounds
            .last_mut()
            .and_then(|round| round.phases.get_mut(phase))
        {
            list.push(action);
        }
    }
}

/// Borrow two distinct fighters mutably at once.
pub(crate) fn pair_mut(
    fighters: &mut [Fighter],
    x: FighterId,
    y: FighterId,
) -> (&mut Fighter, &mut Fighter) {
    debug_assert_ne!(x, y, "a fighter cannot face itself");
    if x.0 < y.0 {
        let (low, high) = fighters.split_at_mut(y.0);
        (&mut low[x.0], &mut high[0])
    } else {
        let (low, high) = fighters.split_at_mut(x.0);
        (&mut high[0], &mut low[y.0])
    }
}
