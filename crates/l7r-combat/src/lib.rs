//! Melee combat resolution for L7R.
//!
//! Fighters built from a [`FighterConfig`] are deployed into a
//! [`Formation`] and driven through rounds of initiative and phases by the
//! [`Engine`]. Each fighter decides for itself when to attack, parry and
//! spend resources, consulting the probability tables in `l7r-dice`.
//! School and profession rules plug in as [`Ability`] bundles of event
//! hooks, bonus seeds and dice pool overrides.

pub mod ability;
pub mod bonus;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fighter;
pub mod formation;
pub mod record;
pub mod ring;
pub mod roll_type;

pub use ability::{Ability, BaseTactics, PoolOverride, Tactics};
pub use bonus::{BonusPools, SharedGroupId};
pub use config::{CombatConfig, FighterConfig, Heuristics};
pub use engine::Engine;
pub use error::{CombatError, CombatResult};
pub use event::{Event, EventArgs, EventRegistry, Hook, HookContext, HookId, HookStatus};
pub use fighter::{Fighter, FighterId, TargetView, WoundCheckOptions, calc_serious};
pub use formation::{Formation, FormationKind, Layout, Side};
pub use record::{
    ActionRecord, AttackRecord, CombatRecord, DamageRecord, DuelRecord, DuelRoundRecord,
    InitiativeRecord, Modifier, ModifierSource, ParryRecord, RoundRecord, WoundCheckRecord,
};
pub use ring::{Ring, Rings};
pub use roll_type::{BonusKey, RollType};
