//! Named combat events and the per-fighter hook registry.
//!
//! Abilities react to combat by registering hooks on a fighter's
//! [`EventRegistry`]. When the engine fires an event on that fighter, its
//! hooks run in registration order; a hook that returns
//! [`HookStatus::Done`] is unregistered right after it runs.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fighter::Fighter;
use crate::roll_type::RollType;

/// A point in the combat flow that hooks can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Once, before anything else happens.
    PreFight,
    /// Before a pre-combat duel.
    PreDuel,
    /// After a pre-combat duel.
    PostDuel,
    /// At the start of every round, before initiative.
    PreRound,
    /// After the last phase of a round.
    PostRound,
    /// After the fighter rolls action dice.
    Initiative,
    /// Before the fighter's attack roll.
    PreAttack,
    /// After the fighter's attack has fully resolved.
    PostAttack,
    /// When the fighter's attack roll meets the TN.
    SuccessfulAttack,
    /// Before an attack against the fighter is rolled.
    PreDefense,
    /// After an attack against the fighter has fully resolved.
    PostDefense,
    /// When the fighter's parry succeeds.
    SuccessfulParry,
    /// After the wound check roll, before its outcome is applied.
    WoundCheck,
    /// When the fighter commits void points to a roll.
    VpsSpent,
    /// When the fighter dies.
    Death,
}

impl Event {
    /// Snake-case event name.
    pub fn name(self) -> &'static str {
        match self {
            Self::PreFight => "pre_fight",
            Self::PreDuel => "pre_duel",
            Self::PostDuel => "post_duel",
            Self::PreRound => "pre_round",
            Self::PostRound => "post_round",
            Self::Initiative => "initiative",
            Self::PreAttack => "pre_attack",
            Self::PostAttack => "post_attack",
            Self::SuccessfulAttack => "successful_attack",
            Self::PreDefense => "pre_defense",
            Self::PostDefense => "post_defense",
            Self::SuccessfulParry => "successful_parry",
            Self::WoundCheck => "wound_check",
            Self::VpsSpent => "vps_spent",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Extra data passed along with some events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventArgs {
    /// The event carries no data.
    #[default]
    None,
    /// Void points were committed to a roll.
    VpsSpent {
        /// Void points spent.
        amount: i32,
        /// The roll they were spent on.
        roll_type: RollType,
    },
    /// A wound check was rolled.
    WoundCheck {
        /// The wound check total.
        check: i32,
        /// Light wounds from the hit that caused the check.
        light: i32,
        /// Light wounds checked against, including older ones.
        light_total: i32,
    },
}

/// Whether a hook stays registered after it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// Keep the hook for future occurrences.
    Keep,
    /// Unregister the hook now.
    Done,
}

/// What a hook sees when it runs.
pub struct HookContext<'a> {
    /// The fighter the hook is registered on.
    pub owner: &'a mut Fighter,
    /// The other party to the event, if any (attacker, defender, duelist).
    pub opponent: Option<&'a mut Fighter>,
    /// Event data.
    pub args: &'a EventArgs,
}

/// A registered event callback.
pub type Hook = Box<dyn FnMut(&mut HookContext<'_>) -> HookStatus>;

/// Handle returned when a hook is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Hooks registered on one fighter, grouped by event.
#[derive(Default)]
pub struct EventRegistry {
    hooks: HashMap<Event, Vec<(HookId, Hook)>>,
    next_id: u64,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(Event, usize)> =
            self.hooks.iter().map(|(e, h)| (*e, h.len())).collect();
        counts.sort();
        f.debug_struct("EventRegistry")
            .field("hooks", &counts)
            .finish()
    }
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. It runs after every hook already registered for the event.
    pub fn register<F>(&mut self, event: Event, hook: F) -> HookId
    where
        F: FnMut(&mut HookContext<'_>) -> HookStatus + 'static,
    {
        self.register_boxed(event, Box::new(hook))
    }

    /// Register an already boxed hook.
    pub fn register_boxed(&mut self, event: Event, hook: Hook) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.hooks.entry(event).or_default().push((id, hook));
        id
    }

    /// Unregister a hook. Returns false if it was not registered.
    pub fn remove(&mut self, id: HookId) -> bool {
        for hooks in self.hooks.values_mut() {
            if let Some(pos) = hooks.iter().position(|(h, _)| *h == id) {
                drop(hooks.remove(pos));
                return true;
            }
        }
        false
    }

    /// Whether a hook is currently registered.
    pub fn contains(&self, id: HookId) -> bool {
        self.hooks.values().flatten().any(|(h, _)| *h == id)
    }

    /// Number of hooks registered for an event.
    pub fn count(&self, event: Event) -> usize {
        self.hooks.get(&event).map_or(0, Vec::len)
    }

    pub(crate) fn take(&mut self, event: Event) -> Vec<(HookId, Hook)> {
        self.hooks.remove(&event).unwrap_or_default()
    }

    /// Put surviving hooks back ahead of any registered while they ran.
    pub(crate) fn restore(&mut self, event: Event, mut survivors: Vec<(HookId, Hook)>) {
        if let Some(added) = self.hooks.remove(&event) {
            survivors.extend(added);
        }
        if !survivors.is_empty() {
            self.hooks.insert(event, survivors);
        }
    }
}

impl Fighter {
    /// Fire an event on this fighter, running its hooks in order.
    ///
    /// Hooks that return [`HookStatus::Done`] are removed. Hooks registered
    /// while the event is firing first run on its next occurrence.
    pub fn fire(&mut self, event: Event, mut opponent: Option<&mut Fighter>, args: &EventArgs) {
        let hooks = self.events.take(event);
        if hooks.is_empty() {
            return;
        }
        let mut survivors = Vec::with_capacity(hooks.len());
        for (id, mut hook) in hooks {
            let mut ctx = HookContext {
                owner: &mut *self,
                opponent: opponent.as_deref_mut(),
                args,
            };
            if hook(&mut ctx) == HookStatus::Keep {
                survivors.push((id, hook));
            }
        }
        self.events.restore(event, survivors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn done_hook_is_removed_immediately() {
        let mut f = testing::fighter("Kakita");
        let id = f.events.register(Event::PreRound, |ctx| {
            ctx.owner.vps += 1;
            HookStatus::Done
        });
        assert!(f.events.contains(id));
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert!(!f.events.contains(id));
        let vps = f.vps;
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert_eq!(f.vps, vps);
    }

    #[test]
    fn keep_hook_fires_every_time() {
        let mut f = testing::fighter("Hida");
        let before = f.vps;
        let id = f.events.register(Event::PostRound, |ctx| {
            ctx.owner.vps += 1;
            HookStatus::Keep
        });
        f.fire(Event::PostRound, None, &EventArgs::None);
        f.fire(Event::PostRound, None, &EventArgs::None);
        assert_eq!(f.vps, before + 2);
        assert!(f.events.contains(id));
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut f = testing::fighter("Akodo");
        f.events.register(Event::PreRound, |ctx| {
            ctx.owner.light = 1;
            HookStatus::Keep
        });
        f.events.register(Event::PreRound, |ctx| {
            ctx.owner.light *= 10;
            HookStatus::Keep
        });
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert_eq!(f.light, 10);
    }

    #[test]
    fn hook_registered_while_firing_waits_for_next_occurrence() {
        let mut f = testing::fighter("Bayushi");
        f.events.register(Event::PreRound, |ctx| {
            ctx.owner.events.register(Event::PreRound, |inner| {
                inner.owner.light += 100;
                HookStatus::Done
            });
            HookStatus::Done
        });
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert_eq!(f.light, 0);
        assert_eq!(f.events.count(Event::PreRound), 1);
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert_eq!(f.light, 100);
        assert_eq!(f.events.count(Event::PreRound), 0);
    }

    #[test]
    fn unregistered_event_is_noop() {
        let mut f = testing::fighter("Shiba");
        f.fire(Event::Death, None, &EventArgs::None);
        assert_eq!(f.events.count(Event::Death), 0);
    }

    #[test]
    fn hooks_see_opponent_and_args() {
        let mut f = testing::fighter("Isawa");
        let mut foe = testing::fighter("Togashi");
        f.events.register(Event::VpsSpent, |ctx| {
            let amount = match ctx.args {
                EventArgs::VpsSpent { amount, .. } => *amount,
                _ => 0,
            };
            if let Some(foe) = ctx.opponent.as_deref_mut() {
                foe.light += amount;
            }
            HookStatus::Keep
        });
        let args = EventArgs::VpsSpent {
            amount: 2,
            roll_type: RollType::Attack,
        };
        f.fire(Event::VpsSpent, Some(&mut foe), &args);
        assert_eq!(foe.light, 2);
    }

    #[test]
    fn remove_by_id() {
        let mut f = testing::fighter("Doji");
        let id = f.events.register(Event::Death, |_| HookStatus::Keep);
        assert!(f.events.remove(id));
        assert!(!f.events.remove(id));
    }

    #[test]
    fn remove_leaves_sibling_hooks() {
        let mut f = testing::fighter("Bayushi");
        let before = f.vps;
        let gone = f.events.register(Event::PreRound, |ctx| {
            ctx.owner.vps += 10;
            HookStatus::Keep
        });
        let kept = f.events.register(Event::PreRound, |ctx| {
            ctx.owner.vps += 1;
            HookStatus::Keep
        });
        assert!(f.events.remove(gone));
        assert!(f.events.contains(kept));
        f.fire(Event::PreRound, None, &EventArgs::None);
        assert_eq!(f.vps, before + 1);
    }
}
