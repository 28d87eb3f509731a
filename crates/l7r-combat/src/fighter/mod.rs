//! A single combatant: stats, wound state, resources and decision making.
//!
//! The resolution steps live in submodules: attack rolls and damage in
//! `attack`, parries in `defense`, wound checks in `wounds`. The basic
//! knack triggers every fighter carries are registered by `hooks`.

mod attack;
mod defense;
mod hooks;
mod wounds;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use l7r_dice::{Dice, Pool};
use serde::{Deserialize, Serialize};

pub use wounds::{WoundCheckOptions, calc_serious};

use crate::ability::{Ability, BaseTactics, PoolOverride, Tactics};
use crate::bonus::BonusPools;
use crate::config::{FighterConfig, Heuristics};
use crate::error::CombatResult;
use crate::event::{Event, EventArgs, EventRegistry};
use crate::formation::Side;
use crate::record::InitiativeRecord;
use crate::ring::{Ring, Rings};
use crate::roll_type::RollType;

/// Identifies a fighter within one combat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct FighterId(pub usize);

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a fighter can see of a potential target when choosing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetView {
    /// The target.
    pub id: FighterId,
    /// Its current TN.
    pub tn: i32,
    /// Its serious wounds.
    pub serious: i32,
    /// Action dice it has already used this round.
    pub actions_used: i32,
}

impl TargetView {
    /// Snapshot a fighter as a target.
    pub fn of(fighter: &Fighter) -> Self {
        Self {
            id: fighter.id,
            tn: fighter.tn,
            serious: fighter.serious,
            actions_used: i32::try_from(
                fighter.init_order.len().saturating_sub(fighter.actions.len()),
            )
            .unwrap_or(i32::MAX),
        }
    }

    /// Selection weight: wounded, easy to hit and spent targets are favored.
    pub fn weight(&self) -> i32 {
        (1 + self.serious + (30 - self.tn).div_euclid(5) + self.actions_used).max(1)
    }
}

/// A fighter in a combat.
pub struct Fighter {
    pub(crate) id: FighterId,
    pub(crate) side: Side,
    name: String,
    rings: Rings,
    attack: i32,
    parry: i32,
    knacks: BTreeMap<RollType, i32>,
    rank: i32,
    xp: i32,
    extra_serious: i32,
    weapon: Pool,
    heuristics: Heuristics,

    /// Current target number.
    pub tn: i32,
    /// Void points left.
    pub vps: i32,
    /// Accumulated light wounds.
    pub light: i32,
    /// Serious wounds taken.
    pub serious: i32,
    /// Pending action dice this round, ascending.
    pub actions: Vec<i32>,
    /// The action dice as rolled at initiative.
    pub init_order: Vec<i32>,
    /// The engine's current phase.
    pub phase: i32,
    /// Situational bonuses.
    pub bonuses: BonusPools,
    /// Event hooks.
    pub events: EventRegistry,

    extra_dice: HashMap<RollType, Pool>,
    ring_overrides: HashMap<RollType, Ring>,
    pool_overrides: Vec<(RollType, PoolOverride)>,
    tactics: Box<dyn Tactics>,
    abilities: Vec<String>,

    /// Knack of the attack currently being made.
    pub attack_knack: RollType,
    /// Total of the most recent attack roll.
    pub attack_roll: i32,
    /// Total of the most recent parry roll.
    pub parry_roll: i32,
    /// Bonus for a parry committed before the attack roll. Zero when none.
    pub predeclare_bonus: i32,
    /// The next attack against this fighter must be parried.
    pub forced_parry: bool,
    /// This fighter has already paid for a parry against the current attack.
    pub parry_committed: bool,
    /// The pending parry spends future action dice out of turn.
    pub interrupt: bool,
    /// The opponent in the current exchange.
    pub enemy: Option<FighterId>,
    /// Whether the last attack this fighter made was parried, successfully or not.
    pub was_parried: bool,
    pub(crate) raised_tn: i32,
}

impl fmt::Debug for Fighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fighter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("side", &self.side)
            .field("rings", &self.rings)
            .field("tn", &self.tn)
            .field("vps", &self.vps)
            .field("light", &self.light)
            .field("serious", &self.serious)
            .field("actions", &self.actions)
            .field("abilities", &self.abilities)
            .finish_non_exhaustive()
    }
}

impl Fighter {
    /// Build a fighter from a validated configuration.
    ///
    /// TN is `5 + 5 × parry`; void points are the lowest ring plus any
    /// extras. The basic knack triggers are registered here.
    pub fn new(config: FighterConfig) -> CombatResult<Self> {
        config.validate()?;
        let rank = config.effective_rank();
        let mut fighter = Self {
            id: FighterId::default(),
            side: Side::A,
            tn: 5 + 5 * config.parry,
            vps: config.rings.lowest() + config.extra_vps,
            name: config.name,
            rings: config.rings,
            attack: config.attack,
            parry: config.parry,
            knacks: config.knacks,
            rank,
            xp: config.xp,
            extra_serious: config.extra_serious,
            weapon: config.weapon,
            heuristics: config.heuristics,
            light: 0,
            serious: 0,
            actions: Vec::new(),
            init_order: Vec::new(),
            phase: 0,
            bonuses: BonusPools::new(),
            events: EventRegistry::new(),
            extra_dice: HashMap::new(),
            ring_overrides: HashMap::new(),
            pool_overrides: Vec::new(),
            tactics: Box::new(BaseTactics),
            abilities: Vec::new(),
            attack_knack: RollType::Attack,
            attack_roll: 0,
            parry_roll: 0,
            predeclare_bonus: 0,
            forced_parry: false,
            parry_committed: false,
            interrupt: false,
            enemy: None,
            was_parried: false,
            raised_tn: 0,
        };
        hooks::register(&mut fighter.events);
        Ok(fighter)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id within the current combat.
    pub fn id(&self) -> FighterId {
        self.id
    }

    /// Side within the current combat.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The five rings.
    pub fn rings(&self) -> &Rings {
        &self.rings
    }

    /// Mutable rings, for abilities that raise them.
    pub fn rings_mut(&mut self) -> &mut Rings {
        &mut self.rings
    }

    /// Decision tuning.
    pub fn heuristics(&self) -> &Heuristics {
        &self.heuristics
    }

    /// Mutable decision tuning.
    pub fn heuristics_mut(&mut self) -> &mut Heuristics {
        &mut self.heuristics
    }

    /// Dan rank.
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Experience points.
    pub fn xp(&self) -> i32 {
        self.xp
    }

    /// Weapon damage dice before Fire is added.
    pub fn weapon(&self) -> Pool {
        self.weapon
    }

    /// Names of the abilities applied, in order.
    pub fn abilities(&self) -> &[String] {
        &self.abilities
    }

    /// TN with no temporary modifiers: `5 + 5 × parry`.
    pub fn base_tn(&self) -> i32 {
        5 + 5 * self.parry
    }

    /// Serious wounds at which the fighter is crippled.
    pub fn sw_to_cripple(&self) -> i32 {
        self.rings.earth
    }

    /// Serious wounds at which the fighter dies.
    pub fn sw_to_kill(&self) -> i32 {
        2 * self.rings.earth + self.extra_serious
    }

    /// Crippled fighters no longer explode 10s on skill rolls.
    pub fn is_crippled(&self) -> bool {
        self.serious >= self.sw_to_cripple()
    }

    /// Whether the fighter is dead.
    pub fn is_dead(&self) -> bool {
        self.serious >= self.sw_to_kill()
    }

    /// Trained level for a roll type: attack, parry or a knack.
    pub fn skill(&self, roll_type: RollType) -> i32 {
        match roll_type {
            RollType::Attack => self.attack,
            RollType::Parry => self.parry,
            other => self.knacks.get(&other).copied().unwrap_or(0),
        }
    }

    /// The ring governing a roll type, after overrides.
    pub fn ring_for(&self, roll_type: RollType) -> Ring {
        self.ring_overrides
            .get(&roll_type)
            .copied()
            .unwrap_or_else(|| roll_type.default_ring())
    }

    /// The dice pool for a roll type, with extra dice and overrides applied.
    pub fn pool(&self, roll_type: RollType) -> Pool {
        let ring = self.rings.get(self.ring_for(roll_type));
        let base = match roll_type {
            RollType::WoundCheck | RollType::Initiative => Pool::new(ring + 1, ring),
            RollType::Damage => Pool::new(self.weapon.rolled + ring, self.weapon.kept),
            skill => Pool::new(ring + self.skill(skill), ring),
        };
        let mut pool = base + self.extra_dice.get(&roll_type).copied().unwrap_or_default();
        for (rt, over) in &self.pool_overrides {
            if *rt == roll_type {
                pool = over(self, pool);
            }
        }
        pool
    }

    /// Skill rolls explode unless the fighter is crippled.
    pub fn explodes(&self) -> bool {
        !self.is_crippled()
    }

    /// Attach an ability: hooks, bonus seeds, dice changes and tactics.
    pub fn apply_ability(&mut self, ability: Ability) {
        tracing::debug!(fighter = %self.name, ability = %ability.name, "ability applied");
        for (event, hook) in ability.hooks {
            self.events.register_boxed(event, hook);
        }
        for (rt, value) in ability.permanent {
            self.bonuses.add_permanent(rt, value);
        }
        for (rt, value) in ability.discretionary {
            self.bonuses.add_discretionary(rt, value);
        }
        for (categories, values) in ability.shared {
            self.bonuses.add_shared(categories, values);
        }
        for (rt, extra) in ability.extra_dice {
            let entry = self.extra_dice.entry(rt).or_default();
            *entry = *entry + extra;
        }
        self.ring_overrides.extend(ability.rings);
        self.pool_overrides.extend(ability.pools);
        if let Some(tactics) = ability.tactics {
            self.tactics = tactics;
        }
        self.abilities.push(ability.name);
    }

    /// Consult this fighter's tactics.
    pub fn with_tactics<R>(&mut self, f: impl FnOnce(&mut dyn Tactics, &Fighter) -> R) -> R {
        let mut tactics = self.take_tactics();
        let result = f(tactics.as_mut(), self);
        self.tactics = tactics;
        result
    }

    pub(crate) fn take_tactics(&mut self) -> Box<dyn Tactics> {
        std::mem::replace(&mut self.tactics, Box::new(BaseTactics))
    }

    pub(crate) fn restore_tactics(&mut self, tactics: Box<dyn Tactics>) {
        self.tactics = tactics;
    }

    /// Roll action dice for the round.
    ///
    /// The initiative pool is rolled without exploding and the lowest
    /// `kept` faces become the action schedule.
    pub fn initiative(&mut self, dice: &mut Dice) -> InitiativeRecord {
        let roll = dice.roll_keep_lowest(self.pool(RollType::Initiative));
        self.actions = roll.kept_faces().into_iter().map(|f| f as i32).collect();
        self.actions.sort_unstable();
        self.init_order = self.actions.clone();
        tracing::debug!(fighter = %self.name, actions = ?self.actions, "initiative");
        self.fire(Event::Initiative, None, &EventArgs::None);
        InitiativeRecord {
            fighter: self.name.clone(),
            dice: roll.dice,
            actions: self.actions.clone(),
        }
    }

    /// Whether an action die is ready this phase under the hold-one policy.
    pub fn has_ready_action(&self) -> bool {
        let Some(&first) = self.actions.first() else {
            return false;
        };
        first <= self.phase
            && (self.phase == 10
                || !self.heuristics.hold_one_action
                || self.actions.get(1).is_some_and(|&second| second <= self.phase))
    }

    /// Decide whether and whom to attack this phase.
    ///
    /// Returns `None` without consuming anything when no action is ready or
    /// nobody is in reach. Otherwise spends the first action die, prefers a
    /// double attack when its hit chance against the easiest target drops
    /// by no more than `datt_threshold`, and picks a target by weighted
    /// random choice.
    pub fn choose_action(
        &mut self,
        targets: &[TargetView],
        dice: &mut Dice,
    ) -> Option<(RollType, FighterId)> {
        if !self.has_ready_action() || targets.is_empty() {
            return None;
        }
        self.actions.remove(0);

        let min_tn = targets.iter().map(|t| t.tn).min().unwrap_or(0);
        let mut knack = RollType::Attack;
        if self.skill(RollType::DoubleAttack) > 0 {
            let normal = self.att_prob(RollType::Attack, min_tn, dice);
            let double = self.att_prob(RollType::DoubleAttack, min_tn + 20, dice);
            if normal - double <= self.heuristics.datt_threshold {
                knack = RollType::DoubleAttack;
            }
        }

        let pool: Vec<&TargetView> = targets
            .iter()
            .filter(|t| knack != RollType::DoubleAttack || t.tn == min_tn)
            .collect();
        let total: i32 = pool.iter().map(|t| t.weight()).sum();
        let mut pick = dice.pick(total.max(1) as usize) as i32;
        let mut target = pool[0].id;
        for view in &pool {
            if pick < view.weight() {
                target = view.id;
                break;
            }
            pick -= view.weight();
        }
        tracing::debug!(fighter = %self.name, %knack, %target, phase = self.phase, "chose action");
        Some((knack, target))
    }

    /// Chance to hit `tn` with a knack if every available bonus were used.
    pub fn att_prob(&self, knack: RollType, tn: i32, dice: &Dice) -> f64 {
        dice.probability(
            self.pool(knack),
            tn - self.bonuses.max_bonus(knack),
            self.explodes(),
        )
    }

    /// Smallest VP spend that lifts the chance to reach `target` to the
    /// `vp_fail_threshold`, or 0 if no spend gets there.
    pub(crate) fn vps_for(&self, pool: Pool, target: i32, dice: &Dice) -> i32 {
        (0..=self.vps.max(0))
            .find(|&vps| {
                dice.probability(pool.with_extra(vps, vps), target, self.explodes())
                    >= self.heuristics.vp_fail_threshold
            })
            .unwrap_or(0)
    }

    /// Deduct VPs and fire `vps_spent`.
    pub(crate) fn spend_vps(
        &mut self,
        amount: i32,
        roll_type: RollType,
        opponent: Option<&mut Fighter>,
    ) {
        if amount <= 0 {
            return;
        }
        self.vps -= amount;
        tracing::trace!(
            fighter = %self.name,
            amount,
            %roll_type,
            left = self.vps,
            "spent void points"
        );
        self.fire(
            Event::VpsSpent,
            opponent,
            &EventArgs::VpsSpent { amount, roll_type },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use l7r_dice::ScriptedDice;

    fn view(id: usize, tn: i32) -> TargetView {
        TargetView {
            id: FighterId(id),
            tn,
            serious: 0,
            actions_used: 0,
        }
    }

    #[test]
    fn derived_stats() {
        let f = testing::fighter("Akodo");
        assert_eq!(f.tn, 20);
        assert_eq!(f.vps, 3);
        assert_eq!(f.sw_to_kill(), 6);
        assert_eq!(f.pool(RollType::Attack), Pool::new(6, 3));
        assert_eq!(f.pool(RollType::Parry), Pool::new(6, 3));
        assert_eq!(f.pool(RollType::WoundCheck), Pool::new(4, 3));
        assert_eq!(f.pool(RollType::Initiative), Pool::new(4, 3));
        assert_eq!(f.pool(RollType::Damage), Pool::new(7, 2));
        assert_eq!(f.pool(RollType::Feint), Pool::new(3, 3));
    }

    #[test]
    fn extra_vps_and_serious() {
        let config = testing::config("Hida").with_extra_vps(2).with_extra_serious(1);
        let f = Fighter::new(config).unwrap();
        assert_eq!(f.vps, 5);
        assert_eq!(f.sw_to_kill(), 7);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = testing::config("Broken").with_attack(9);
        assert!(Fighter::new(config).is_err());
    }

    #[test]
    fn wound_thresholds() {
        let mut f = testing::fighter("Matsu");
        f.serious = 2;
        assert!(!f.is_crippled());
        f.serious = 3;
        assert!(f.is_crippled());
        assert!(!f.explodes());
        f.serious = 5;
        assert!(!f.is_dead());
        f.serious = 6;
        assert!(f.is_dead());
    }

    #[test]
    fn initiative_keeps_lowest_dice() {
        let mut f = testing::fighter("Shinjo");
        let mut dice = testing::scripted([7, 2, 10, 4]);
        let rec = f.initiative(&mut dice);
        assert_eq!(f.actions, vec![2, 4, 7]);
        assert_eq!(f.init_order, vec![2, 4, 7]);
        assert_eq!(rec.actions, vec![2, 4, 7]);
        assert_eq!(rec.dice.len(), 4);
        assert!(rec.dice.iter().all(|d| !d.exploded));
    }

    #[test]
    fn initiative_pool_past_ten_dice_keeps_void_actions() {
        let config = testing::config("Togashi").with_ring(Ring::Void, 9);
        let mut f = Fighter::new(config).unwrap();
        f.apply_ability(Ability::new("swift").extra_dice(RollType::Initiative, 1, 0));
        assert_eq!(f.pool(RollType::Initiative), Pool::new(11, 9));
        let mut dice = testing::scripted([10, 2, 2, 3, 3, 5, 7, 8, 8, 9, 10]);
        let rec = f.initiative(&mut dice);
        assert_eq!(rec.dice.len(), 11);
        assert_eq!(f.actions, vec![2, 2, 3, 3, 5, 7, 8, 8, 9]);
    }

    #[test]
    fn hold_one_action_waits_for_second_die() {
        let mut f = testing::fighter("Kakita");
        let mut dice = testing::scripted([1]);
        let targets = [view(1, 20)];
        f.actions = vec![3, 7];
        f.phase = 3;
        assert!(f.choose_action(&targets, &mut dice).is_none());
        assert_eq!(f.actions, vec![3, 7]);
        f.phase = 7;
        assert!(f.choose_action(&targets, &mut dice).is_some());
        assert_eq!(f.actions, vec![7]);
        assert!(f.choose_action(&targets, &mut dice).is_none());
        f.phase = 10;
        assert!(f.choose_action(&targets, &mut dice).is_some());
        assert!(f.actions.is_empty());
    }

    #[test]
    fn no_hold_acts_immediately() {
        let config = testing::config("Bayushi")
            .with_heuristics(Heuristics::default().with_hold_one_action(false));
        let mut f = Fighter::new(config).unwrap();
        let mut dice = testing::scripted([1]);
        f.actions = vec![2];
        f.phase = 2;
        let action = f.choose_action(&[view(4, 20)], &mut dice);
        assert_eq!(action, Some((RollType::Attack, FighterId(4))));
    }

    #[test]
    fn no_target_consumes_nothing() {
        let mut f = testing::fighter("Doji");
        let mut dice = testing::scripted([1]);
        f.actions = vec![1, 1];
        f.phase = 1;
        assert!(f.choose_action(&[], &mut dice).is_none());
        assert_eq!(f.actions, vec![1, 1]);
    }

    #[test]
    fn weighted_target_pick() {
        let mut f = testing::fighter("Ide");
        f.actions = vec![1, 1];
        f.phase = 1;
        // Weights: 1 + (30-20)/5 = 3 and 1 + (30-10)/5 = 5; pick 4 lands on the second.
        let source = ScriptedDice::new([1]).with_picks([4]);
        let mut dice = Dice::new(source, testing::table());
        let action = f.choose_action(&[view(1, 20), view(2, 10)], &mut dice);
        assert_eq!(action, Some((RollType::Attack, FighterId(2))));
    }

    #[test]
    fn target_view_counts_spent_actions() {
        let mut f = testing::fighter("Isawa");
        f.init_order = vec![2, 5, 9];
        f.actions = vec![9];
        f.serious = 1;
        let seen = TargetView::of(&f);
        assert_eq!(seen.actions_used, 2);
        assert_eq!(seen.serious, 1);
        assert_eq!(seen.tn, 20);
        assert_eq!(seen.weight(), 6);
    }

    #[test]
    fn target_weight_is_floored() {
        let tough = TargetView {
            tn: 60,
            ..view(0, 0)
        };
        assert_eq!(tough.weight(), 1);
        let hurt = TargetView {
            serious: 2,
            actions_used: 1,
            ..view(0, 20)
        };
        assert_eq!(hurt.weight(), 6);
    }

    #[test]
    fn double_attack_chosen_when_gap_small() {
        let config = testing::config("Mirumoto")
            .with_knack(RollType::DoubleAttack, 5)
            .with_heuristics(Heuristics::default().with_datt_threshold(1.0));
        let mut f = Fighter::new(config).unwrap();
        let mut dice = testing::scripted([1]);
        f.actions = vec![1, 1];
        f.phase = 1;
        let (knack, target) = f
            .choose_action(&[view(1, 25), view(2, 10)], &mut dice)
            .unwrap();
        assert_eq!(knack, RollType::DoubleAttack);
        assert_eq!(target, FighterId(2));
    }

    #[test]
    fn double_attack_skipped_when_gap_large() {
        let config = testing::config("Mirumoto")
            .with_knack(RollType::DoubleAttack, 1)
            .with_heuristics(Heuristics::default().with_datt_threshold(0.0));
        let mut f = Fighter::new(config).unwrap();
        let mut dice = testing::scripted([1]);
        f.actions = vec![1, 1];
        f.phase = 1;
        let (knack, _) = f.choose_action(&[view(1, 20)], &mut dice).unwrap();
        assert_eq!(knack, RollType::Attack);
    }

    #[test]
    fn vp_scan_finds_smallest_sufficient_spend() {
        let mut f = testing::fighter("Togashi");
        let dice = testing::seeded(1);
        let pool = f.pool(RollType::Attack);
        assert_eq!(f.vps_for(pool, 5, &dice), 0);
        f.vps = 0;
        assert_eq!(f.vps_for(pool, 200, &dice), 0);
        f.vps = 3;
        let spend = f.vps_for(pool, 30, &dice);
        assert!(spend > 0 && spend <= 3);
    }
}
