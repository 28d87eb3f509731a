use l7r_dice::Dice;

use super::Fighter;
use super::wounds::calc_serious;
use crate::event::{Event, EventArgs};
use crate::record::{ModifierSource, ParryRecord, modifiers};
use crate::roll_type::RollType;

impl Fighter {
    /// Expected serious wounds from the attacker's current attack, using
    /// average damage and an average wound check with no VPs.
    ///
    /// `extra_damage` projects an unparried hit. Nothing is rolled or consumed.
    pub fn projected_serious(&self, attacker: &Fighter, extra_damage: bool, dice: &Dice) -> i32 {
        let (pool, serious) = attacker.next_damage(self.tn, extra_damage);
        let light = dice.expected_value(pool, true) + f64::from(self.light);
        let check = dice.expected_value(self.pool(RollType::WoundCheck), true)
            + f64::from(self.bonuses.max_bonus(RollType::WoundCheck));
        serious + calc_serious(light, check)
    }

    /// Decide whether to parry the attacker's successful attack, paying
    /// the action cost if so.
    ///
    /// A pre-declared or forced parry is already paid for. A ready action
    /// die costs one; parrying out of turn costs the two latest dice and
    /// doubles the threshold. A parry is always taken when not parrying
    /// would be lethal.
    pub fn will_parry(&mut self, attacker: &Fighter, dice: &Dice) -> bool {
        self.interrupt = false;
        if self.predeclare_bonus > 0 || self.parry_committed {
            return true;
        }
        let Some(&first) = self.actions.first() else {
            return false;
        };
        let interrupt = first > self.phase;
        if interrupt && self.actions.len() < 2 {
            return false;
        }

        let extra = self.projected_serious(attacker, true, dice);
        let base = self.projected_serious(attacker, false, dice);
        let threshold = if interrupt {
            2 * self.heuristics.sw_parry_threshold
        } else {
            self.heuristics.sw_parry_threshold
        };
        let lethal = extra + self.serious >= self.sw_to_kill();
        let parry = lethal || extra - base >= threshold;
        tracing::trace!(
            fighter = %self.name,
            extra,
            base,
            threshold,
            lethal,
            parry,
            "parry decision"
        );
        if parry {
            if interrupt {
                self.interrupt = true;
                self.actions.truncate(self.actions.len() - 2);
            } else {
                self.actions.remove(0);
            }
        }
        parry
    }

    /// Commit to a parry before the attack roll, paying for it now.
    ///
    /// Uses a ready action die, or the two latest dice out of turn. Returns
    /// false, with nothing spent, if neither is available.
    pub fn commit_predeclare(&mut self, bonus: i32) -> bool {
        match self.actions.first() {
            Some(&first) if first <= self.phase => {
                self.actions.remove(0);
                self.interrupt = false;
            }
            Some(_) if self.actions.len() >= 2 => {
                self.actions.truncate(self.actions.len() - 2);
                self.interrupt = true;
            }
            _ => return false,
        }
        self.predeclare_bonus = bonus.max(1);
        tracing::debug!(fighter = %self.name, bonus, "pre-declared parry");
        true
    }

    /// Answer a forced parry: the first action die is spent and the fighter
    /// must parry if the attack hits. Without action dice nothing happens.
    pub fn commit_forced_parry(&mut self) -> bool {
        self.forced_parry = false;
        self.predeclare_bonus = 0;
        if self.actions.is_empty() {
            return false;
        }
        self.actions.remove(0);
        self.parry_committed = true;
        true
    }

    /// Roll a parry against the attacker's attack total plus `raise`.
    ///
    /// `raise` is non-zero when parrying for an ally. With `auto_success`
    /// the parry succeeds whatever the roll. `successful_parry` fires on
    /// success. Any pre-declare bonus and commitment are used up.
    pub fn make_parry(
        &mut self,
        attacker: &mut Fighter,
        raise: i32,
        auto_success: bool,
        dice: &mut Dice,
    ) -> ParryRecord {
        let tn = attacker.attack_roll + raise;
        let pool = self.pool(RollType::Parry);
        let predeclare = std::mem::take(&mut self.predeclare_bonus);
        self.parry_committed = false;

        let max_bonus = self.bonuses.max_bonus(RollType::Parry) + predeclare;
        let vps = self.vps_for(pool, tn - max_bonus, dice);
        self.spend_vps(vps, RollType::Parry, Some(&mut *attacker));

        let roll = dice.roll(pool.with_extra(vps, vps), self.explodes());
        let permanent = self.bonuses.permanent(RollType::Parry);
        let one_shot = self.bonuses.consume_one_shot(RollType::Parry);
        let needed = (tn - roll.total - predeclare - permanent - one_shot).max(0);
        let discretionary = self.bonuses.spend_discretionary(RollType::Parry, needed);
        self.parry_roll = roll.total + predeclare + permanent + one_shot + discretionary;

        let success = auto_success || self.parry_roll >= tn;
        tracing::debug!(
            parrier = %self.name,
            attacker = %attacker.name,
            total = self.parry_roll,
            tn,
            vps,
            success,
            interrupt = self.interrupt,
            "parry roll"
        );
        let record = ParryRecord {
            parrier: self.name.clone(),
            attacker: attacker.name.clone(),
            on_behalf_of: None,
            vps_spent: vps,
            roll,
            modifiers: modifiers(&[
                (ModifierSource::Predeclare, predeclare),
                (ModifierSource::Permanent, permanent),
                (ModifierSource::OneShot, one_shot),
                (ModifierSource::Discretionary, discretionary),
            ]),
            total: self.parry_roll,
            tn,
            success,
            predeclared: predeclare > 0,
            interrupt: std::mem::take(&mut self.interrupt),
        };
        if success {
            self.fire(Event::SuccessfulParry, Some(attacker), &EventArgs::None);
        }
        record
    }

    /// Parry an attack aimed at the named adjacent ally. The attack total
    /// to beat is raised by 5 per rank the attacker has in the knack being
    /// used.
    pub fn make_parry_for(
        &mut self,
        ally: &str,
        attacker: &mut Fighter,
        dice: &mut Dice,
    ) -> ParryRecord {
        let raise = 5 * attacker.skill(attacker.attack_knack);
        let mut record = self.make_parry(attacker, raise, false, dice);
        record.on_behalf_of = Some(ally.to_string());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristics;
    use crate::roll_type::BonusKey;
    use crate::testing;

    #[test]
    fn projection_is_pure() {
        let mut a = testing::fighter("Akodo");
        let d = testing::fighter("Hida");
        let dice = testing::seeded(1);
        a.attack_roll = 45;
        a.bonuses.add_one_shot(BonusKey::Serious, 1);
        let extra = d.projected_serious(&a, true, &dice);
        let base = d.projected_serious(&a, false, &dice);
        assert!(extra > base);
        assert_eq!(a.bonuses.one_shot(BonusKey::Serious), 1);
        assert_eq!(a.attack_roll, 45);
    }

    #[test]
    fn no_actions_means_no_parry() {
        let a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        let dice = testing::seeded(1);
        assert!(!d.will_parry(&a, &dice));
        d.actions = vec![9];
        d.phase = 2;
        assert!(!d.will_parry(&a, &dice));
        assert_eq!(d.actions, vec![9]);
    }

    #[test]
    fn lethal_hit_is_always_parried() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        let dice = testing::seeded(1);
        a.attack_roll = 60;
        d.serious = 5;
        d.actions = vec![2, 6];
        d.phase = 2;
        assert!(d.will_parry(&a, &dice));
        assert_eq!(d.actions, vec![6]);
        assert!(!d.interrupt);
    }

    #[test]
    fn interrupt_costs_two_latest_dice() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        let dice = testing::seeded(1);
        a.attack_roll = 60;
        d.serious = 5;
        d.actions = vec![4, 7, 9];
        d.phase = 2;
        assert!(d.will_parry(&a, &dice));
        assert!(d.interrupt);
        assert_eq!(d.actions, vec![4]);
    }

    #[test]
    fn cheap_hit_is_not_parried() {
        let mut a = testing::fighter("Akodo");
        let config = testing::config("Hida")
            .with_heuristics(Heuristics::default().with_sw_parry_threshold(10));
        let mut d = crate::fighter::Fighter::new(config).unwrap();
        let dice = testing::seeded(1);
        a.attack_roll = 20;
        d.actions = vec![1, 5];
        d.phase = 1;
        assert!(!d.will_parry(&a, &dice));
        assert_eq!(d.actions, vec![1, 5]);
    }

    #[test]
    fn predeclared_parry_is_committed() {
        let a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        let dice = testing::seeded(1);
        d.actions = vec![3, 8];
        d.phase = 3;
        assert!(d.commit_predeclare(5));
        assert_eq!(d.actions, vec![8]);
        assert!(d.will_parry(&a, &dice));
        assert_eq!(d.actions, vec![8]);
    }

    #[test]
    fn predeclare_needs_an_affordable_action() {
        let mut d = testing::fighter("Hida");
        d.actions = vec![9];
        d.phase = 3;
        assert!(!d.commit_predeclare(5));
        assert_eq!(d.predeclare_bonus, 0);
        d.actions = vec![6, 9];
        assert!(d.commit_predeclare(5));
        assert!(d.interrupt);
        assert!(d.actions.is_empty());
    }

    #[test]
    fn forced_parry_spends_first_die() {
        let mut d = testing::fighter("Hida");
        d.forced_parry = true;
        d.actions = vec![5, 8];
        assert!(d.commit_forced_parry());
        assert!(!d.forced_parry);
        assert!(d.parry_committed);
        assert_eq!(d.actions, vec![8]);
        let mut e = testing::fighter("Kuni");
        e.forced_parry = true;
        assert!(!e.commit_forced_parry());
        assert!(!e.parry_committed);
    }

    #[test]
    fn parry_includes_predeclare_bonus() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        d.vps = 0;
        a.attack_roll = 20;
        d.predeclare_bonus = 5;
        // 5 + 5 + 5 = 15, +5 predeclared meets 20.
        let mut dice = testing::scripted([5]);
        let rec = d.make_parry(&mut a, 0, false, &mut dice);
        assert!(rec.success);
        assert!(rec.predeclared);
        assert_eq!(rec.total, 20);
        assert_eq!(d.predeclare_bonus, 0);
    }

    #[test]
    fn auto_success_ignores_roll() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        d.vps = 0;
        a.attack_roll = 90;
        let mut dice = testing::scripted([1]);
        let rec = d.make_parry(&mut a, 0, true, &mut dice);
        assert!(rec.success);
        assert_eq!(rec.total, 3);
    }

    #[test]
    fn parry_for_ally_raises_tn_by_attacker_skill() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Kuni");
        d.vps = 0;
        a.attack_roll = 20;
        a.attack_knack = RollType::Attack;
        let mut dice = testing::scripted([8]);
        let rec = d.make_parry_for("Hida", &mut a, &mut dice);
        assert_eq!(rec.tn, 35);
        assert_eq!(rec.total, 24);
        assert!(!rec.success);
        assert_eq!(rec.on_behalf_of.as_deref(), Some("Hida"));
        assert_eq!(a.attack_roll, 20);
    }

    #[test]
    fn successful_parry_fires_event() {
        let mut a = testing::fighter("Akodo");
        let mut d = testing::fighter("Hida");
        d.vps = 0;
        d.events.register(Event::SuccessfulParry, |ctx| {
            ctx.owner.light = 99;
            crate::event::HookStatus::Done
        });
        a.attack_roll = 5;
        let mut dice = testing::scripted([4]);
        d.make_parry(&mut a, 0, false, &mut dice);
        assert_eq!(d.light, 99);
    }
}
