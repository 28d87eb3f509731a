//! Fighter and combat configuration.

use std::collections::BTreeMap;

use l7r_dice::Pool;

use crate::error::{CombatError, CombatResult};
use crate::formation::FormationKind;
use crate::ring::{Ring, Rings};
use crate::roll_type::RollType;

/// Highest trainable level for skills and knacks.
pub const SKILL_CAP: i32 = 5;

/// Highest ring value.
pub const RING_CAP: i32 = 10;

/// Tuning knobs for a fighter's decision making.
#[derive(Debug, Clone, PartialEq)]
pub struct Heuristics {
    /// Serious wounds a parry must be expected to prevent before spending an action on it.
    pub sw_parry_threshold: i32,
    /// Serious wounds a void point must prevent on a wound check to be worth spending.
    pub sw2vp_threshold: f64,
    /// Hit probability void points must reach on an attack or parry before any are spent.
    pub vp_fail_threshold: f64,
    /// Largest hit-probability drop accepted when choosing a double attack.
    pub datt_threshold: f64,
    /// Light wounds kept after a passed wound check instead of taking a serious wound.
    pub base_wc_threshold: i32,
    /// Reserve one action die for parrying until phase 10.
    pub hold_one_action: bool,
    /// Expected margin over the opponent's TN needed to strike in a duel.
    pub duel_strike_threshold: i32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            sw_parry_threshold: 2,
            sw2vp_threshold: 0.5,
            vp_fail_threshold: 0.7,
            datt_threshold: 0.20,
            base_wc_threshold: 10,
            hold_one_action: true,
            duel_strike_threshold: 0,
        }
    }
}

impl Heuristics {
    /// Set the parry threshold in serious wounds.
    pub fn with_sw_parry_threshold(mut self, value: i32) -> Self {
        self.sw_parry_threshold = value;
        self
    }

    /// Set the wound-check void point efficiency threshold.
    pub fn with_sw2vp_threshold(mut self, value: f64) -> Self {
        self.sw2vp_threshold = value;
        self
    }

    /// Set the hit probability void points must reach.
    pub fn with_vp_fail_threshold(mut self, value: f64) -> Self {
        self.vp_fail_threshold = value;
        self
    }

    /// Set the accepted double attack probability drop.
    pub fn with_datt_threshold(mut self, value: f64) -> Self {
        self.datt_threshold = value;
        self
    }

    /// Set how many light wounds to keep after a passed wound check.
    pub fn with_base_wc_threshold(mut self, value: i32) -> Self {
        self.base_wc_threshold = value;
        self
    }

    /// Set whether to hold an action in reserve.
    pub fn with_hold_one_action(mut self, hold: bool) -> Self {
        self.hold_one_action = hold;
        self
    }

    /// Set the duel strike margin.
    pub fn with_duel_strike_threshold(mut self, value: i32) -> Self {
        self.duel_strike_threshold = value;
        self
    }
}

/// Starting statistics for one fighter.
#[derive(Debug, Clone, PartialEq)]
pub struct FighterConfig {
    /// Display name.
    pub name: String,
    /// The five rings.
    pub rings: Rings,
    /// Attack skill.
    pub attack: i32,
    /// Parry skill.
    pub parry: i32,
    /// Knack levels.
    pub knacks: BTreeMap<RollType, i32>,
    /// Dan rank. When zero it is inferred from the lowest knack.
    pub rank: i32,
    /// Experience points. Sets the fighter's TN in a duel.
    pub xp: i32,
    /// Void points beyond the lowest ring.
    pub extra_vps: i32,
    /// Serious wounds survivable beyond twice Earth.
    pub extra_serious: i32,
    /// Weapon damage dice before Fire is added.
    pub weapon: Pool,
    /// Decision tuning.
    pub heuristics: Heuristics,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            name: "Fighter".to_string(),
            rings: Rings::default(),
            attack: 1,
            parry: 1,
            knacks: BTreeMap::new(),
            rank: 0,
            xp: 0,
            extra_vps: 0,
            extra_serious: 0,
            weapon: Pool::new(4, 2),
            heuristics: Heuristics::default(),
        }
    }
}

impl FighterConfig {
    /// Start a config with default stats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a config from `(stat, value)` pairs such as `("fire", 3)`.
    ///
    /// Recognized stats are the five rings, `attack`, `parry`, every knack,
    /// `rank`, `xp`, `extra_vps`, `extra_serious`, `weapon_rolled` and
    /// `weapon_kept`. Unknown stats are an error. The result is validated.
    pub fn from_stats<'a>(
        name: impl Into<String>,
        stats: impl IntoIterator<Item = (&'a str, i32)>,
    ) -> CombatResult<Self> {
        let mut config = Self::new(name);
        for (stat, value) in stats {
            let key = stat.trim().to_lowercase();
            if let Some(ring) = Ring::from_name(&key) {
                *config.rings.get_mut(ring) = value;
                continue;
            }
            match key.as_str() {
                "attack" => config.attack = value,
                "parry" => config.parry = value,
                "rank" => config.rank = value,
                "xp" => config.xp = value,
                "extra_vps" => config.extra_vps = value,
                "extra_serious" => config.extra_serious = value,
                "weapon_rolled" => config.weapon.rolled = value,
                "weapon_kept" => config.weapon.kept = value,
                other => match RollType::from_name(other).filter(|rt| rt.is_knack()) {
                    Some(knack) => {
                        config.knacks.insert(knack, value);
                    }
                    None => return Err(CombatError::UnknownStat(stat.to_string())),
                },
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Set all five rings.
    pub fn with_rings(mut self, rings: Rings) -> Self {
        self.rings = rings;
        self
    }

    /// Set one ring.
    pub fn with_ring(mut self, ring: Ring, value: i32) -> Self {
        *self.rings.get_mut(ring) = value;
        self
    }

    /// Set the attack skill.
    pub fn with_attack(mut self, value: i32) -> Self {
        self.attack = value;
        self
    }

    /// Set the parry skill.
    pub fn with_parry(mut self, value: i32) -> Self {
        self.parry = value;
        self
    }

    /// Set a knack level.
    pub fn with_knack(mut self, knack: RollType, level: i32) -> Self {
        self.knacks.insert(knack, level);
        self
    }

    /// Set the dan rank.
    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    /// Set experience points.
    pub fn with_xp(mut self, xp: i32) -> Self {
        self.xp = xp;
        self
    }

    /// Set bonus void points.
    pub fn with_extra_vps(mut self, value: i32) -> Self {
        self.extra_vps = value;
        self
    }

    /// Set bonus serious wound capacity.
    pub fn with_extra_serious(mut self, value: i32) -> Self {
        self.extra_serious = value;
        self
    }

    /// Set the weapon's damage dice.
    pub fn with_weapon(mut self, weapon: Pool) -> Self {
        self.weapon = weapon;
        self
    }

    /// Set decision heuristics.
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Check every stat is in range.
    pub fn validate(&self) -> CombatResult<()> {
        for ring in Ring::ALL {
            let value = self.rings.get(ring);
            if !(1..=RING_CAP).contains(&value) {
                return Err(CombatError::InvalidRing { ring, value });
            }
        }
        check_skill("attack", self.attack)?;
        check_skill("parry", self.parry)?;
        check_skill("rank", self.rank)?;
        for (&knack, &level) in &self.knacks {
            if !knack.is_knack() {
                return Err(CombatError::NotAKnack(knack));
            }
            check_skill(knack.name(), level)?;
        }
        for (stat, value) in [
            ("xp", self.xp),
            ("extra_vps", self.extra_vps),
            ("extra_serious", self.extra_serious),
        ] {
            if value < 0 {
                return Err(CombatError::NegativeStat {
                    stat: stat.to_string(),
                    value,
                });
            }
        }
        if self.weapon.is_empty() {
            return Err(CombatError::InvalidWeapon(self.weapon));
        }
        Ok(())
    }

    /// The rank, inferred from the lowest knack when unset.
    pub fn effective_rank(&self) -> i32 {
        if self.rank > 0 {
            return self.rank;
        }
        self.knacks.values().copied().min().unwrap_or(0)
    }
}

fn check_skill(stat: &str, value: i32) -> CombatResult<()> {
    if value < 0 {
        return Err(CombatError::NegativeStat {
            stat: stat.to_string(),
            value,
        });
    }
    if value > SKILL_CAP {
        return Err(CombatError::SkillAboveCap {
            stat: stat.to_string(),
            value,
            cap: SKILL_CAP,
        });
    }
    Ok(())
}

/// Settings for one combat.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatConfig {
    /// Seed for the dice.
    pub seed: u64,
    /// Trials per pool for a private probability table. `None` uses the shared table.
    pub table_trials: Option<u32>,
    /// Rounds fought before the combat is abandoned.
    pub max_rounds: u32,
    /// Open with an iaijutsu duel (one fighter per side only).
    pub duel: bool,
    /// Battlefield layout.
    pub formation: FormationKind,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            table_trials: None,
            max_rounds: 1_000,
            duel: false,
            formation: FormationKind::Surround,
        }
    }
}

impl CombatConfig {
    /// Set the dice seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build a private probability table with this many trials per pool.
    pub fn with_table_trials(mut self, trials: u32) -> Self {
        self.table_trials = Some(trials);
        self
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Enable or disable the opening duel.
    pub fn with_duel(mut self, duel: bool) -> Self {
        self.duel = duel;
        self
    }

    /// Set the formation kind.
    pub fn with_formation(mut self, formation: FormationKind) -> Self {
        self.formation = formation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristics_defaults() {
        let h = Heuristics::default();
        assert_eq!(h.sw_parry_threshold, 2);
        assert!((h.sw2vp_threshold - 0.5).abs() < f64::EPSILON);
        assert!((h.vp_fail_threshold - 0.7).abs() < f64::EPSILON);
        assert!((h.datt_threshold - 0.20).abs() < f64::EPSILON);
        assert_eq!(h.base_wc_threshold, 10);
        assert!(h.hold_one_action);
        assert_eq!(h.duel_strike_threshold, 0);
    }

    #[test]
    fn heuristics_builder_chain() {
        let h = Heuristics::default()
            .with_sw_parry_threshold(1)
            .with_hold_one_action(false)
            .with_base_wc_threshold(25)
            .with_duel_strike_threshold(5);
        assert_eq!(h.sw_parry_threshold, 1);
        assert!(!h.hold_one_action);
        assert_eq!(h.base_wc_threshold, 25);
        assert_eq!(h.duel_strike_threshold, 5);
    }

    #[test]
    fn from_stats_reads_everything() {
        let config = FighterConfig::from_stats(
            "Akodo",
            [
                ("air", 3),
                ("earth", 4),
                ("fire", 3),
                ("water", 3),
                ("void", 2),
                ("attack", 4),
                ("parry", 3),
                ("double_attack", 2),
                ("xp", 150),
                ("weapon_rolled", 3),
            ],
        )
        .unwrap();
        assert_eq!(config.rings.earth, 4);
        assert_eq!(config.attack, 4);
        assert_eq!(config.knacks[&RollType::DoubleAttack], 2);
        assert_eq!(config.xp, 150);
        assert_eq!(config.weapon, Pool::new(3, 2));
        assert_eq!(config.effective_rank(), 2);
    }

    #[test]
    fn from_stats_rejects_unknown_keys() {
        let err = FighterConfig::from_stats("X", [("charisma", 3)]).unwrap_err();
        assert!(matches!(err, CombatError::UnknownStat(s) if s == "charisma"));
        let err = FighterConfig::from_stats("X", [("wound_check", 3)]).unwrap_err();
        assert!(matches!(err, CombatError::UnknownStat(_)));
    }

    #[test]
    fn validation_catches_bad_values() {
        let bad_ring = FighterConfig::new("X").with_ring(Ring::Earth, 0);
        assert!(matches!(
            bad_ring.validate(),
            Err(CombatError::InvalidRing { ring: Ring::Earth, value: 0 })
        ));
        let high_skill = FighterConfig::new("X").with_attack(6);
        assert!(matches!(
            high_skill.validate(),
            Err(CombatError::SkillAboveCap { value: 6, .. })
        ));
        let negative = FighterConfig::new("X").with_parry(-1);
        assert!(matches!(
            negative.validate(),
            Err(CombatError::NegativeStat { value: -1, .. })
        ));
        let not_knack = FighterConfig::new("X").with_knack(RollType::Parry, 2);
        assert!(matches!(
            not_knack.validate(),
            Err(CombatError::NotAKnack(RollType::Parry))
        ));
        let no_weapon = FighterConfig::new("X").with_weapon(Pool::new(0, 2));
        assert!(matches!(
            no_weapon.validate(),
            Err(CombatError::InvalidWeapon(_))
        ));
    }

    #[test]
    fn explicit_rank_wins() {
        let config = FighterConfig::new("X")
            .with_knack(RollType::Feint, 1)
            .with_rank(3);
        assert_eq!(config.effective_rank(), 3);
        assert_eq!(FighterConfig::new("Y").effective_rank(), 0);
    }

    #[test]
    fn combat_config_builder_chain() {
        let config = CombatConfig::default()
            .with_seed(7)
            .with_table_trials(500)
            .with_max_rounds(20)
            .with_duel(true)
            .with_formation(FormationKind::Line);
        assert_eq!(config.seed, 7);
        assert_eq!(config.table_trials, Some(500));
        assert_eq!(config.max_rounds, 20);
        assert!(config.duel);
        assert_eq!(config.formation, FormationKind::Line);
    }
}
