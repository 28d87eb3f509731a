//! The extension surface for schools and professions.
//!
//! An [`Ability`] is a bundle of event hooks, bonus seeds, extra dice,
//! ring substitutions and pool overrides attached to a base fighter. Optional
//! reactions (counterattacks, pre-declared parries, parrying for allies) are
//! decided by a [`Tactics`] implementation, which an ability may replace.

use std::fmt;

use l7r_dice::Pool;

use crate::event::{Event, Hook, HookContext, HookStatus};
use crate::fighter::Fighter;
use crate::ring::Ring;
use crate::roll_type::RollType;

/// Replaces the dice pool computed for a roll type.
pub type PoolOverride = Box<dyn Fn(&Fighter, Pool) -> Pool>;

/// Decisions about optional reactions. Every default declines.
pub trait Tactics {
    /// Strike the attacker before their attack resolves.
    fn will_counterattack(&mut self, _me: &Fighter, _attacker: &Fighter) -> bool {
        false
    }

    /// Strike an attacker who is attacking an adjacent ally.
    fn will_counterattack_for(
        &mut self,
        _me: &Fighter,
        _ally: &Fighter,
        _attacker: &Fighter,
    ) -> bool {
        false
    }

    /// Commit to a parry before the attack roll. Returns the parry bonus.
    fn will_predeclare(&mut self, _me: &Fighter, _attacker: &Fighter) -> Option<i32> {
        None
    }

    /// Commit to parrying for an adjacent ally before the attack roll.
    fn will_predeclare_for(
        &mut self,
        _me: &Fighter,
        _ally: &Fighter,
        _attacker: &Fighter,
    ) -> Option<i32> {
        None
    }

    /// Parry a hit aimed at an adjacent ally.
    fn will_parry_for(&mut self, _me: &Fighter, _ally: &Fighter, _attacker: &Fighter) -> bool {
        false
    }

    /// Strike back after being hit, before damage is rolled.
    fn will_react_to_attack(&mut self, _me: &Fighter, _attacker: &Fighter) -> bool {
        false
    }
}

/// Tactics that never take an optional reaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseTactics;

impl Tactics for BaseTactics {}

/// A named bundle of rule modifications for a fighter.
#[derive(Default)]
pub struct Ability {
    pub(crate) name: String,
    pub(crate) hooks: Vec<(Event, Hook)>,
    pub(crate) permanent: Vec<(RollType, i32)>,
    pub(crate) discretionary: Vec<(RollType, i32)>,
    pub(crate) shared: Vec<(Vec<RollType>, Vec<i32>)>,
    pub(crate) extra_dice: Vec<(RollType, Pool)>,
    pub(crate) rings: Vec<(RollType, Ring)>,
    pub(crate) pools: Vec<(RollType, PoolOverride)>,
    pub(crate) tactics: Option<Box<dyn Tactics>>,
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ability")
            .field("name", &self.name)
            .field("hooks", &self.hooks.len())
            .field("permanent", &self.permanent)
            .field("discretionary", &self.discretionary)
            .field("shared", &self.shared)
            .field("extra_dice", &self.extra_dice)
            .field("rings", &self.rings)
            .field("pools", &self.pools.len())
            .field("tactics", &self.tactics.is_some())
            .finish()
    }
}

impl Ability {
    /// Start an empty ability.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The ability's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a hook for an event.
    pub fn on<F>(mut self, event: Event, hook: F) -> Self
    where
        F: FnMut(&mut HookContext<'_>) -> HookStatus + 'static,
    {
        self.hooks.push((event, Box::new(hook)));
        self
    }

    /// Add a permanent bonus.
    pub fn permanent(mut self, roll_type: RollType, value: i32) -> Self {
        self.permanent.push((roll_type, value));
        self
    }

    /// Add a discretionary bonus value.
    pub fn discretionary(mut self, roll_type: RollType, value: i32) -> Self {
        self.discretionary.push((roll_type, value));
        self
    }

    /// Add a group of discretionary values shared by several roll types.
    pub fn shared(
        mut self,
        roll_types: impl IntoIterator<Item = RollType>,
        values: impl IntoIterator<Item = i32>,
    ) -> Self {
        self.shared
            .push((roll_types.into_iter().collect(), values.into_iter().collect()));
        self
    }

    /// Add extra rolled and kept dice to a roll type.
    pub fn extra_dice(mut self, roll_type: RollType, rolled: i32, kept: i32) -> Self {
        self.extra_dice.push((roll_type, Pool::new(rolled, kept)));
        self
    }

    /// Govern a roll type with a different ring.
    pub fn ring(mut self, roll_type: RollType, ring: Ring) -> Self {
        self.rings.push((roll_type, ring));
        self
    }

    /// Replace the computed pool for a roll type.
    pub fn pool<F>(mut self, roll_type: RollType, f: F) -> Self
    where
        F: Fn(&Fighter, Pool) -> Pool + 'static,
    {
        self.pools.push((roll_type, Box::new(f)));
        self
    }

    /// Replace the fighter's tactics.
    pub fn tactics(mut self, tactics: impl Tactics + 'static) -> Self {
        self.tactics = Some(Box::new(tactics));
        self
    }
}
