use l7r_dice::DiceRoll;

use super::{Engine, pair_mut};
use crate::error::{CombatError, CombatResult};
use crate::event::{Event, EventArgs};
use crate::fighter::{FighterId, WoundCheckOptions};
use crate::formation::Side;
use crate::record::{
    ActionRecord, AttackRecord, DuelRecord, DuelRoundRecord, ModifierSource, modifiers,
};
use crate::roll_type::RollType;

/// Consecutive rounds of mutual focus after which both duelists must strike.
pub const FOCUS_LIMIT: u32 = 3;

impl Engine {
    /// Fight the opening iaijutsu duel between the only fighter on each
    /// side.
    ///
    /// TNs start at XP/10. Each round both duelists roll a contested
    /// non-exploding iaijutsu roll, then each either strikes or focuses.
    /// Focusing raises the focuser's TN by 5. Strikes resolve in contested
    /// order. If somebody struck and nobody hit, the duelists resheathe:
    /// each contested winner banks a free raise and TNs reset. The duel ends
    /// on the first hit. Original TNs are restored afterwards.
    pub fn duel(&mut self) -> CombatResult<()> {
        let (side_a, side_b) = (self.formation.side(Side::A), self.formation.side(Side::B));
        let (a, b) = match (side_a, side_b) {
            (&[a], &[b]) => (a, b),
            _ => {
                return Err(CombatError::DuelRequiresSingles {
                    side_a: side_a.len(),
                    side_b: side_b.len(),
                });
            }
        };

        {
            let (fa, fb) = pair_mut(&mut self.fighters, a, b);
            fa.fire(Event::PreDuel, Some(&mut *fb), &EventArgs::None);
            fb.fire(Event::PreDuel, Some(fa), &EventArgs::None);
        }
        let saved = [self.fighters[a.0].tn, self.fighters[b.0].tn];
        self.reset_duel_tns(a, b);
        tracing::info!(
            a = %self.fighters[a.0].name(),
            b = %self.fighters[b.0].name(),
            "duel started"
        );

        let mut record = DuelRecord {
            a: self.fighters[a.0].name().to_string(),
            b: self.fighters[b.0].name().to_string(),
            rounds: Vec::new(),
            deaths: Vec::new(),
        };
        let mut free_raises = [0, 0];
        let mut focus_streak = 0;
        let mut number = 0;
        let outcome = loop {
            if self.fighters[a.0].is_dead() || self.fighters[b.0].is_dead() {
                break Ok(());
            }
            if number >= self.config.max_rounds {
                break Err(CombatError::RoundLimit(self.config.max_rounds));
            }
            number += 1;
            let forced = focus_streak >= FOCUS_LIMIT;
            let (mut round, hit, [total_a, total_b]) =
                self.duel_round(a, b, number, free_raises, forced);

            if !round.a_strikes && !round.b_strikes {
                focus_streak += 1;
                record.rounds.push(round);
                continue;
            }
            focus_streak = 0;
            if hit {
                record.rounds.push(round);
                break Ok(());
            }
            round.resheathe = true;
            record.rounds.push(round);
            if total_a >= total_b {
                free_raises[0] += 1;
            }
            if total_b >= total_a {
                free_raises[1] += 1;
            }
            tracing::debug!(?free_raises, "duelists resheathe");
            self.reset_duel_tns(a, b);
        };

        self.fighters[a.0].tn = saved[0];
        self.fighters[b.0].tn = saved[1];
        {
            let (fa, fb) = pair_mut(&mut self.fighters, a, b);
            fa.fire(Event::PostDuel, Some(&mut *fb), &EventArgs::None);
            fb.fire(Event::PostDuel, Some(fa), &EventArgs::None);
        }
        record.deaths = self.sweep_deaths();
        tracing::info!(rounds = record.rounds.len(), deaths = ?record.deaths, "duel finished");
        self.record.duel = Some(record);
        outcome
    }

    fn reset_duel_tns(&mut self, a: FighterId, b: FighterId) {
        for id in [a, b] {
            let fighter = &mut self.fighters[id.0];
            fighter.tn = fighter.xp() / 10;
        }
    }

    /// One exchange. Returns the record, whether anybody hit, and both
    /// contested totals.
    fn duel_round(
        &mut self,
        a: FighterId,
        b: FighterId,
        number: u32,
        free_raises: [i32; 2],
        forced: bool,
    ) -> (DuelRoundRecord, bool, [i32; 2]) {
        let contested_a = self.contested(a);
        let contested_b = self.contested(b);
        let (fa, fb) = (&self.fighters[a.0], &self.fighters[b.0]);
        let total_a = contested_a.total + fa.bonuses.permanent(RollType::Iaijutsu);
        let total_b = contested_b.total + fb.bonuses.permanent(RollType::Iaijutsu);
        let a_strikes = forced || fa.duel_should_strike(fb, &self.dice);
        let b_strikes = forced || fb.duel_should_strike(fa, &self.dice);
        tracing::debug!(
            round = number,
            total_a,
            total_b,
            a_strikes,
            b_strikes,
            forced,
            "duel round"
        );

        let mut round = DuelRoundRecord {
            number,
            contested_a,
            contested_b,
            a_strikes,
            b_strikes,
            forced,
            strikes: Vec::new(),
            resheathe: false,
        };
        if !a_strikes {
            self.fighters[a.0].tn += 5;
        }
        if !b_strikes {
            self.fighters[b.0].tn += 5;
        }
        if !a_strikes && !b_strikes {
            return (round, false, [total_a, total_b]);
        }

        let mut strikers = [
            (a, b, a_strikes, free_raises[0]),
            (b, a, b_strikes, free_raises[1]),
        ];
        if total_b > total_a {
            strikers.swap(0, 1);
        }
        let mut hit = false;
        for (striker, target, strikes, raises) in strikers {
            if strikes && !self.fighters[striker.0].is_dead() {
                let strike = self.duel_strike(striker, target, raises);
                hit |= strike.hit;
                round.strikes.push(strike);
            }
        }
        (round, hit, [total_a, total_b])
    }

    fn contested(&mut self, id: FighterId) -> DiceRoll {
        let pool = self.fighters[id.0].pool(RollType::Iaijutsu);
        self.dice.roll(pool, false)
    }

    /// A non-exploding iaijutsu strike. A hit deals duel damage and a wound
    /// check that neither explodes nor spends VPs.
    fn duel_strike(
        &mut self,
        striker: FighterId,
        target: FighterId,
        free_raises: i32,
    ) -> AttackRecord {
        let (s, t) = pair_mut(&mut self.fighters, striker, target);
        s.attack_knack = RollType::Iaijutsu;
        s.enemy = Some(target);
        t.enemy = Some(striker);

        let roll = self.dice.roll(s.pool(RollType::Iaijutsu), false);
        let permanent = s.bonuses.permanent(RollType::Iaijutsu);
        s.attack_roll = roll.total + permanent;
        let hit = s.attack_roll >= t.tn;
        tracing::debug!(
            striker = %s.name(),
            target = %t.name(),
            total = s.attack_roll,
            tn = t.tn,
            hit,
            "duel strike"
        );

        let mut record = AttackRecord::pending(s.name(), t.name(), RollType::Iaijutsu, 0);
        record.roll = Some(roll);
        record.modifiers = modifiers(&[(ModifierSource::Permanent, permanent)]);
        record.total = s.attack_roll;
        record.tn = t.tn;
        record.hit = hit;
        if hit {
            s.fire(Event::SuccessfulAttack, Some(&mut *t), &EventArgs::None);
            let damage = s.deal_duel_damage(t, free_raises, &mut self.dice);
            let check = t.wound_check(
                damage.light,
                damage.serious,
                WoundCheckOptions::duel(),
                &mut self.dice,
            );
            record.children.push(ActionRecord::Damage(damage));
            record.children.push(ActionRecord::WoundCheck(check));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatConfig, Heuristics};
    use crate::fighter::Fighter;
    use crate::testing;

    fn duel_engine(faces: impl IntoIterator<Item = u32>, a: Fighter, b: Fighter) -> Engine {
        Engine::new(
            vec![a],
            vec![b],
            testing::scripted(faces),
            CombatConfig::default().with_duel(true),
        )
        .unwrap()
    }

    #[test]
    fn duel_needs_one_per_side() {
        let mut e = Engine::new(
            vec![testing::fighter("A0"), testing::fighter("A1")],
            vec![testing::fighter("B0")],
            testing::seeded(1),
            CombatConfig::default(),
        )
        .unwrap();
        let err = e.duel().unwrap_err();
        assert!(matches!(
            err,
            CombatError::DuelRequiresSingles { side_a: 2, side_b: 1 }
        ));
        assert!(e.record().duel.is_none());
    }

    #[test]
    fn zero_xp_duelists_strike_and_hit() {
        let mut e = duel_engine([5], testing::fighter("Kakita"), testing::fighter("Doji"));
        e.duel().unwrap();
        let duel = e.record().duel.as_ref().unwrap();
        assert_eq!(duel.rounds.len(), 1);
        let round = &duel.rounds[0];
        assert!(round.a_strikes && round.b_strikes);
        assert_eq!(round.strikes.len(), 2);
        assert!(round.strikes.iter().all(|s| s.hit && s.tn == 0));
        assert!(!round.resheathe);
    }

    #[test]
    fn tns_restored_after_duel() {
        let mut e = duel_engine([5], testing::fighter("Kakita"), testing::fighter("Doji"));
        e.duel().unwrap();
        assert_eq!(e.fighter(FighterId(0)).unwrap().tn, 20);
        assert_eq!(e.fighter(FighterId(1)).unwrap().tn, 20);
    }

    #[test]
    fn reluctant_duelists_forced_to_strike() {
        let reluctant = |name: &str| {
            let heuristics = Heuristics::default().with_duel_strike_threshold(100);
            Fighter::new(testing::config(name).with_heuristics(heuristics)).unwrap()
        };
        let mut e = duel_engine([9], reluctant("Kakita"), reluctant("Doji"));
        e.duel().unwrap();
        let duel = e.record().duel.as_ref().unwrap();
        assert_eq!(duel.rounds.len(), FOCUS_LIMIT as usize + 1);
        for focus in &duel.rounds[..FOCUS_LIMIT as usize] {
            assert!(!focus.a_strikes && !focus.b_strikes);
            assert!(!focus.forced);
        }
        let forced = &duel.rounds[FOCUS_LIMIT as usize];
        assert!(forced.forced);
        assert!(forced.a_strikes && forced.b_strikes);
        // Three rounds of focus put both TNs at 15.
        assert!(forced.strikes.iter().all(|s| s.hit && s.tn == 15));
    }

    #[test]
    fn missed_strikes_resheathe() {
        let veteran = |name: &str| Fighter::new(testing::config(name).with_xp(900)).unwrap();
        let mut e = duel_engine([9], veteran("Kakita"), veteran("Doji"));
        e.config.max_rounds = 5;
        let err = e.duel().unwrap_err();
        assert!(matches!(err, CombatError::RoundLimit(5)));
        let duel = e.record().duel.as_ref().unwrap();
        assert_eq!(duel.rounds.len(), 5);
        let forced = &duel.rounds[FOCUS_LIMIT as usize];
        assert!(forced.forced);
        assert!(forced.strikes.iter().all(|s| !s.hit && s.tn == 105));
        assert!(forced.resheathe);
        assert!(!duel.rounds[4].forced);
        assert_eq!(e.fighter(FighterId(0)).unwrap().tn, 20);
        assert_eq!(e.fighter(FighterId(1)).unwrap().tn, 20);
    }
}
