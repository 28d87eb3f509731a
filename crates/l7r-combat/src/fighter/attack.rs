use l7r_dice::{Dice, Pool};

use super::Fighter;
use crate::event::{Event, EventArgs};
use crate::record::{AttackRecord, DamageRecord, ModifierSource, modifiers};
use crate::roll_type::{BonusKey, RollType};

impl Fighter {
    /// Roll the current `attack_knack` against the defender's TN.
    ///
    /// VPs are committed first (the smallest spend whose hit chance reaches
    /// `vp_fail_threshold`, else none), then permanent and one-shot bonuses
    /// are added, then the minimum discretionary spend that reaches the TN.
    /// `successful_attack` fires when the TN is met.
    pub fn make_attack(&mut self, defender: &mut Fighter, dice: &mut Dice) -> AttackRecord {
        let knack = self.attack_knack;
        let tn = defender.tn;
        let pool = self.pool(knack);

        let vps = self.vps_for(pool, tn - self.bonuses.max_bonus(knack), dice);
        self.spend_vps(vps, knack, Some(&mut *defender));

        let roll = dice.roll(pool.with_extra(vps, vps), self.explodes());
        let permanent = self.bonuses.permanent(knack);
        let one_shot = self.bonuses.consume_one_shot(knack);
        let needed = (tn - roll.total - permanent - one_shot).max(0);
        let discretionary = self.bonuses.spend_discretionary(knack, needed);

        self.attack_roll = roll.total + permanent + one_shot + discretionary;
        let hit = self.attack_roll >= tn;
        tracing::debug!(
            attacker = %self.name,
            defender = %defender.name,
            %knack,
            total = self.attack_roll,
            tn,
            vps,
            hit,
            "attack roll"
        );

        let mut record = AttackRecord::pending(&self.name, &defender.name, knack, self.phase);
        record.vps_spent = vps;
        record.roll = Some(roll);
        record.modifiers = modifiers(&[
            (ModifierSource::Permanent, permanent),
            (ModifierSource::OneShot, one_shot),
            (ModifierSource::Discretionary, discretionary),
        ]);
        record.total = self.attack_roll;
        record.tn = tn;
        record.hit = hit;

        if hit {
            self.fire(Event::SuccessfulAttack, Some(defender), &EventArgs::None);
        }
        record
    }

    /// The damage pool and bonus serious wounds the current attack would
    /// deal against `tn`, without consuming anything.
    ///
    /// With `extra_damage` (the hit went unparried) every 5 points over the
    /// TN adds a rolled die, and pending one-shot damage dice and serious
    /// wounds apply. Otherwise only the base damage pool is used.
    pub fn next_damage(&self, tn: i32, extra_damage: bool) -> (Pool, i32) {
        let base = self.pool(RollType::Damage);
        if !extra_damage {
            return (base, 0);
        }
        let extra_rolled =
            (self.attack_roll - tn).max(0) / 5 + self.bonuses.one_shot(BonusKey::DamageRolled);
        let extra_kept = self.bonuses.one_shot(BonusKey::DamageKept);
        (
            base.with_extra(extra_rolled, extra_kept),
            self.bonuses.one_shot(BonusKey::Serious),
        )
    }

    /// Roll damage for the current attack. Damage always explodes.
    ///
    /// The one-shot damage dice and serious wounds are consumed whether or
    /// not they applied.
    pub fn deal_damage(
        &mut self,
        defender: &Fighter,
        extra_damage: bool,
        dice: &mut Dice,
    ) -> DamageRecord {
        let (pool, serious) = self.next_damage(defender.tn, extra_damage);
        let base = self.pool(RollType::Damage);
        self.bonuses.clear_one_shot(BonusKey::DamageRolled);
        self.bonuses.clear_one_shot(BonusKey::DamageKept);
        self.bonuses.clear_one_shot(BonusKey::Serious);
        self.roll_damage(defender, pool, base, serious, dice)
    }

    /// Duel damage: one extra rolled die per point over the TN, plus one per
    /// free raise.
    pub fn deal_duel_damage(
        &mut self,
        defender: &Fighter,
        free_raises: i32,
        dice: &mut Dice,
    ) -> DamageRecord {
        let base = self.pool(RollType::Damage);
        let extra_rolled = (self.attack_roll - defender.tn).max(0)
            + free_raises
            + self.bonuses.consume_one_shot(BonusKey::DamageRolled);
        let extra_kept = self.bonuses.consume_one_shot(BonusKey::DamageKept);
        let serious = self.bonuses.consume_one_shot(BonusKey::Serious);
        let pool = base.with_extra(extra_rolled, extra_kept);
        self.roll_damage(defender, pool, base, serious, dice)
    }

    fn roll_damage(
        &mut self,
        defender: &Fighter,
        pool: Pool,
        base: Pool,
        serious: i32,
        dice: &mut Dice,
    ) -> DamageRecord {
        let roll = dice.roll(pool, true);
        let flat = self.bonuses.consume_one_shot(RollType::Damage);
        let light = roll.total + flat;
        tracing::debug!(
            attacker = %self.name,
            defender = %defender.name,
            %pool,
            light,
            serious,
            "damage"
        );
        DamageRecord {
            attacker: self.name.clone(),
            defender: defender.name.clone(),
            roll,
            modifiers: modifiers(&[(ModifierSource::OneShot, flat)]),
            light,
            serious,
            extra_rolled: pool.rolled - base.rolled,
            extra_kept: pool.kept - base.kept,
        }
    }

    /// Whether to strike in a duel rather than focus.
    ///
    /// Strikes when the expected non-exploding iaijutsu total, plus
    /// permanent bonuses, clears the opponent's TN by at least
    /// `duel_strike_threshold`.
    pub fn duel_should_strike(&self, opponent: &Fighter, dice: &Dice) -> bool {
        let expected = dice.expected_value(self.pool(RollType::Iaijutsu), false)
            + f64::from(self.bonuses.permanent(RollType::Iaijutsu));
        expected - f64::from(opponent.tn) >= f64::from(self.heuristics.duel_strike_threshold)
    }
}
