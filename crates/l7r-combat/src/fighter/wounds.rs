use l7r_dice::{Dice, Pool};

use super::Fighter;
use crate::event::{Event, EventArgs};
use crate::record::{ModifierSource, WoundCheckRecord, modifiers};
use crate::roll_type::RollType;

/// How a wound check is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WoundCheckOptions {
    /// Whether 10s explode.
    pub explode: bool,
    /// Whether the fighter may spend void points.
    pub spend_vps: bool,
}

impl Default for WoundCheckOptions {
    fn default() -> Self {
        Self {
            explode: true,
            spend_vps: true,
        }
    }
}

impl WoundCheckOptions {
    /// Duel wound checks neither explode nor take void points.
    pub fn duel() -> Self {
        Self {
            explode: false,
            spend_vps: false,
        }
    }
}

/// Serious wounds for failing a check: one per started 10 points of shortfall.
///
/// Takes floats so the same rule serves projections from averages.
pub fn calc_serious(light: f64, check: f64) -> i32 {
    ((light - check).max(0.0) / 10.0).ceil() as i32
}

impl Fighter {
    /// Take a hit and roll the wound check against all light wounds.
    ///
    /// A failed check converts every light wound into serious wounds. A
    /// passed check keeps the light wounds while they stay at or below
    /// `base_wc_threshold`, otherwise takes one serious wound to clear them,
    /// except that a fighter one serious wound from death always keeps them.
    pub fn wound_check(
        &mut self,
        light: i32,
        serious: i32,
        options: WoundCheckOptions,
        dice: &mut Dice,
    ) -> WoundCheckRecord {
        let light_total = light + self.light;
        let before = self.serious;
        self.serious += serious;

        let pool = self.pool(RollType::WoundCheck);
        let vps = if options.spend_vps {
            self.wc_vps(light_total, pool, options.explode, dice)
        } else {
            0
        };
        self.spend_vps(vps, RollType::WoundCheck, None);

        let roll = dice.roll(pool.with_extra(vps, vps), options.explode);
        let (permanent, one_shot, discretionary) = self.wc_bonus(light_total, roll.total);
        let check = roll.total + permanent + one_shot + discretionary;
        self.fire(
            Event::WoundCheck,
            None,
            &EventArgs::WoundCheck {
                check,
                light,
                light_total,
            },
        );

        let passed = check >= light_total;
        let mut voluntary = false;
        if !passed {
            self.light = 0;
            self.serious += calc_serious(f64::from(light_total), f64::from(check));
        } else if light_total <= self.heuristics.base_wc_threshold
            || self.serious >= self.sw_to_kill() - 1
        {
            self.light = light_total;
        } else {
            self.light = 0;
            self.serious += 1;
            voluntary = true;
        }
        tracing::debug!(
            fighter = %self.name,
            check,
            light_total,
            vps,
            serious = self.serious,
            passed,
            "wound check"
        );

        WoundCheckRecord {
            fighter: self.name.clone(),
            light_this_hit: light,
            light_total,
            vps_spent: vps,
            roll,
            modifiers: modifiers(&[
                (ModifierSource::Permanent, permanent),
                (ModifierSource::OneShot, one_shot),
                (ModifierSource::Discretionary, discretionary),
            ]),
            total: check,
            passed,
            serious_taken: self.serious - before,
            voluntary_serious: voluntary,
        }
    }

    /// VPs worth spending on a wound check.
    ///
    /// Scans from the largest spend down for the highest one that still
    /// beats one fewer VP, and takes it if it prevents at least
    /// `sw2vp_threshold` serious wounds per VP or if death is otherwise
    /// expected.
    fn wc_vps(&self, light_total: i32, pool: Pool, explode: bool, dice: &Dice) -> i32 {
        let bonus = f64::from(self.bonuses.max_bonus(RollType::WoundCheck));
        let wounds: Vec<i32> = (0..=self.vps.max(0))
            .map(|vps| {
                let check = dice.expected_value(pool.with_extra(vps, vps), explode) + bonus;
                calc_serious(f64::from(light_total), check)
            })
            .collect();
        let doomed = wounds[0] + self.serious >= self.sw_to_kill();
        for vps in (1..wounds.len()).rev() {
            let prevented = f64::from(wounds[0] - wounds[vps]);
            if wounds[vps] < wounds[vps - 1]
                && (prevented / vps as f64 >= self.heuristics.sw2vp_threshold || doomed)
            {
                tracing::trace!(fighter = %self.name, vps, ?wounds, doomed, "wound check VPs");
                return vps as i32;
            }
        }
        0
    }

    /// Static and discretionary bonuses for a wound check, as
    /// `(permanent, one_shot, discretionary)`.
    ///
    /// One wound from death, everything needed to pass is spent. Otherwise
    /// only enough to drop one serious wound band, stepping the target down
    /// by 10 until the discretionary pool can cover it.
    fn wc_bonus(&mut self, light_total: i32, check: i32) -> (i32, i32, i32) {
        let permanent = self.bonuses.permanent(RollType::WoundCheck);
        let one_shot = self.bonuses.consume_one_shot(RollType::WoundCheck);
        let gap = light_total - check - permanent - one_shot;
        let needed = if self.serious + 1 >= self.sw_to_kill() {
            gap.max(0)
        } else {
            let available: i32 = self
                .bonuses
                .available_discretionary(RollType::WoundCheck)
                .iter()
                .sum();
            let mut needed = (gap - 9).max(0);
            while needed > available {
                needed = (needed - 10).max(0);
            }
            needed
        };
        let discretionary = self
            .bonuses
            .spend_discretionary(RollType::WoundCheck, needed);
        (permanent, one_shot, discretionary)
    }
}
