use std::iter;

use super::{Engine, pair_mut};
use crate::ability::Tactics;
use crate::event::{Event, EventArgs};
use crate::fighter::{Fighter, FighterId, WoundCheckOptions};
use crate::record::{ActionRecord, AttackRecord, ParryRecord};
use crate::roll_type::RollType;

/// Outcome of the parry step for a landed attack.
struct ParryStep {
    attempted: bool,
    blocked: bool,
    record: Option<ParryRecord>,
}

impl Engine {
    /// Resolve one attack from `attacker` on `defender` with `knack`.
    ///
    /// Order of play: counterattacks from the defender or an adjacent ally,
    /// `pre_attack`/`pre_defense`, forced or pre-declared parries, the
    /// attack roll, a reactive counterattack, the parry step, then damage
    /// and the wound check for an unblocked hit. On a miss any committed
    /// parry is still rolled and succeeds. Counterattacks resolved along
    /// the way are attached as children ahead of the attack's own actions.
    pub fn resolve_attack(
        &mut self,
        knack: RollType,
        attacker: FighterId,
        defender: FighterId,
    ) -> AttackRecord {
        let (a, d) = (attacker, defender);
        let mut counters = Vec::new();
        if knack != RollType::Counterattack {
            self.counterattacks(a, d, &mut counters);
        }
        if self.fighters[a.0].is_dead() {
            let mut record = AttackRecord::pending(
                self.fighters[a.0].name(),
                self.fighters[d.0].name(),
                knack,
                self.phase,
            );
            record.children = counters;
            return record;
        }

        {
            let (att, def) = pair_mut(&mut self.fighters, a, d);
            att.attack_knack = knack;
            att.enemy = Some(d);
            def.enemy = Some(a);
            att.fire(Event::PreAttack, Some(def), &EventArgs::None);
            def.fire(Event::PreDefense, Some(att), &EventArgs::None);
        }
        self.predeclare(a, d);

        let mut record = {
            let (att, def) = pair_mut(&mut self.fighters, a, d);
            att.make_attack(def, &mut self.dice)
        };

        if record.lands() {
            if knack != RollType::Counterattack
                && self.ask(d, |t, f| t.will_react_to_attack(&f[d.0], &f[a.0]))
            {
                let counter = self.resolve_attack(RollType::Counterattack, d, a);
                counters.push(ActionRecord::Attack(counter));
            }
            if !self.fighters[a.0].is_dead() {
                let step = self.parry_step(a, d);
                self.fighters[a.0].was_parried = step.attempted;
                if let Some(parry) = step.record {
                    record.children.push(ActionRecord::Parry(parry));
                }
                if !step.blocked {
                    let (att, def) = pair_mut(&mut self.fighters, a, d);
                    let damage = att.deal_damage(def, !step.attempted, &mut self.dice);
                    let check = def.wound_check(
                        damage.light,
                        damage.serious,
                        WoundCheckOptions::default(),
                        &mut self.dice,
                    );
                    record.children.push(ActionRecord::Damage(damage));
                    record.children.push(ActionRecord::WoundCheck(check));
                }
            }
        } else {
            self.fighters[a.0].was_parried = false;
            for parry in self.committed_parries(a, d) {
                record.children.push(ActionRecord::Parry(parry));
            }
        }

        self.finish_attack(a, d);
        counters.append(&mut record.children);
        record.children = counters;
        record
    }

    /// Ask `id`'s tactics a question about the current battlefield.
    pub(crate) fn ask<R>(
        &mut self,
        id: FighterId,
        question: impl FnOnce(&mut dyn Tactics, &[Fighter]) -> R,
    ) -> R {
        let mut tactics = self.fighters[id.0].take_tactics();
        let answer = question(tactics.as_mut(), &self.fighters);
        self.fighters[id.0].restore_tactics(tactics);
        answer
    }

    /// The defender may strike first. Failing that, each adjacent ally who
    /// can reach the attacker may, against the attacker's TN raised by 5
    /// per rank of parry.
    fn counterattacks(&mut self, a: FighterId, d: FighterId, out: &mut Vec<ActionRecord>) {
        if self.ask(d, |t, f| t.will_counterattack(&f[d.0], &f[a.0])) {
            let counter = self.resolve_attack(RollType::Counterattack, d, a);
            out.push(ActionRecord::Attack(counter));
            return;
        }
        let raise = 5 * self.fighters[a.0].skill(RollType::Parry);
        self.fighters[a.0].tn += raise;
        for ally in self.formation.adjacent(d) {
            if self.fighters[a.0].is_dead() {
                break;
            }
            if self.fighters[ally.0].is_dead() || !self.formation.can_reach(ally, a) {
                continue;
            }
            if self.ask(ally, |t, f| {
                t.will_counterattack_for(&f[ally.0], &f[d.0], &f[a.0])
            }) {
                let counter = self.resolve_attack(RollType::Counterattack, ally, a);
                out.push(ActionRecord::Attack(counter));
            }
        }
        self.fighters[a.0].tn -= raise;
    }

    /// A forced parry is answered first. Otherwise the defender, then the
    /// first willing ally, may pre-declare.
    fn predeclare(&mut self, a: FighterId, d: FighterId) {
        if self.fighters[d.0].forced_parry {
            self.fighters[d.0].commit_forced_parry();
            return;
        }
        let bonus = self.ask(d, |t, f| t.will_predeclare(&f[d.0], &f[a.0]));
        if bonus.is_some_and(|b| self.fighters[d.0].commit_predeclare(b)) {
            return;
        }
        for ally in self.formation.adjacent(d) {
            if self.fighters[ally.0].is_dead() || !self.formation.can_reach(ally, a) {
                continue;
            }
            let bonus = self.ask(ally, |t, f| {
                t.will_predeclare_for(&f[ally.0], &f[d.0], &f[a.0])
            });
            if bonus.is_some_and(|b| self.fighters[ally.0].commit_predeclare(b)) {
                break;
            }
        }
    }

    /// The defender parries if it will. Otherwise the first ally who
    /// pre-declared, or who chooses to, parries on the defender's behalf.
    fn parry_step(&mut self, a: FighterId, d: FighterId) -> ParryStep {
        let will = {
            let (def, att) = pair_mut(&mut self.fighters, d, a);
            def.will_parry(att, &self.dice)
        };
        if will {
            let (def, att) = pair_mut(&mut self.fighters, d, a);
            let record = def.make_parry(att, 0, false, &mut self.dice);
            return ParryStep {
                attempted: true,
                blocked: record.success,
                record: Some(record),
            };
        }
        let protected = self.fighters[d.0].name().to_string();
        for ally in self.formation.adjacent(d) {
            if self.fighters[ally.0].is_dead() || !self.formation.can_reach(ally, a) {
                continue;
            }
            let committed = self.fighters[ally.0].predeclare_bonus > 0;
            if !committed
                && !self.ask(ally, |t, f| t.will_parry_for(&f[ally.0], &f[d.0], &f[a.0]))
            {
                continue;
            }
            let (parrier, att) = pair_mut(&mut self.fighters, ally, a);
            let record = parrier.make_parry_for(&protected, att, &mut self.dice);
            return ParryStep {
                attempted: true,
                blocked: record.success,
                record: Some(record),
            };
        }
        ParryStep {
            attempted: false,
            blocked: false,
            record: None,
        }
    }

    /// Parries already paid for are rolled even when the attack misses,
    /// and succeed.
    fn committed_parries(&mut self, a: FighterId, d: FighterId) -> Vec<ParryRecord> {
        let protected = self.fighters[d.0].name().to_string();
        let mut records = Vec::new();
        for id in iter::once(d).chain(self.formation.adjacent(d)) {
            let fighter = &self.fighters[id.0];
            if fighter.is_dead() || (fighter.predeclare_bonus == 0 && !fighter.parry_committed) {
                continue;
            }
            let raise = if id == d {
                0
            } else {
                5 * self.fighters[a.0].skill(self.fighters[a.0].attack_knack)
            };
            let (parrier, att) = pair_mut(&mut self.fighters, id, a);
            let mut record = parrier.make_parry(att, raise, true, &mut self.dice);
            if id != d {
                record.on_behalf_of = Some(protected.clone());
            }
            records.push(record);
        }
        records
    }

    /// Post events and clearing of parry commitments nobody used.
    fn finish_attack(&mut self, a: FighterId, d: FighterId) {
        {
            let (att, def) = pair_mut(&mut self.fighters, a, d);
            att.fire(Event::PostAttack, Some(&mut *def), &EventArgs::None);
            if !def.is_dead() {
                def.fire(Event::PostDefense, Some(att), &EventArgs::None);
            }
        }
        for id in iter::once(d).chain(self.formation.adjacent(d)) {
            let fighter = &mut self.fighters[id.0];
            fighter.predeclare_bonus = 0;
            fighter.parry_committed = false;
            fighter.interrupt = false;
        }
    }
}
