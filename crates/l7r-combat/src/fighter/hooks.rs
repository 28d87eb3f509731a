//! Knack triggers every fighter carries, registered through the same event
//! surface abilities use.

use crate::event::{Event, EventRegistry, HookContext, HookStatus};
use crate::roll_type::{BonusKey, RollType};

/// TN penalty a double attack imposes on its own roll.
pub const DOUBLE_ATTACK_TN: i32 = 20;

/// TN a lunging fighter gives up until the next attack against them resolves.
pub const LUNGE_TN: i32 = 5;

pub(super) fn register(events: &mut EventRegistry) {
    events.register(Event::PreAttack, lunge_pre);
    events.register(Event::PreAttack, double_attack_pre);
    events.register(Event::SuccessfulAttack, feint_success);
    events.register(Event::SuccessfulAttack, double_attack_success);
    events.register(Event::PostAttack, double_attack_post);
    events.register(Event::PostAttack, reset_damage);
}

fn double_attack_pre(ctx: &mut HookContext<'_>) -> HookStatus {
    if ctx.owner.attack_knack != RollType::DoubleAttack {
        return HookStatus::Keep;
    }
    if let Some(defender) = ctx.opponent.as_deref_mut() {
        defender.tn += DOUBLE_ATTACK_TN;
        ctx.owner.raised_tn += DOUBLE_ATTACK_TN;
    }
    HookStatus::Keep
}

fn double_attack_post(ctx: &mut HookContext<'_>) -> HookStatus {
    if let Some(defender) = ctx.opponent.as_deref_mut() {
        defender.tn -= std::mem::take(&mut ctx.owner.raised_tn);
    }
    HookStatus::Keep
}

fn double_attack_success(ctx: &mut HookContext<'_>) -> HookStatus {
    if ctx.owner.attack_knack == RollType::DoubleAttack {
        ctx.owner.bonuses.add_one_shot(BonusKey::Serious, 1);
        ctx.owner.bonuses.add_one_shot(BonusKey::DamageRolled, 4);
    }
    HookStatus::Keep
}

fn lunge_pre(ctx: &mut HookContext<'_>) -> HookStatus {
    if ctx.owner.attack_knack == RollType::Lunge {
        ctx.owner.tn -= LUNGE_TN;
        ctx.owner.bonuses.add_one_shot(BonusKey::DamageRolled, 1);
        ctx.owner.events.register(Event::PostDefense, |inner| {
            inner.owner.tn += LUNGE_TN;
            HookStatus::Done
        });
    }
    HookStatus::Keep
}

/// A successful feint wins a VP and trades the latest action die for one
/// usable right now.
fn feint_success(ctx: &mut HookContext<'_>) -> HookStatus {
    let owner = &mut *ctx.owner;
    if owner.attack_knack == RollType::Feint && !owner.actions.is_empty() {
        owner.vps += 1;
        owner.actions.pop();
        owner.actions.insert(0, owner.phase);
    }
    HookStatus::Keep
}

fn reset_damage(ctx: &mut HookContext<'_>) -> HookStatus {
    for key in [
        BonusKey::DamageRolled,
        BonusKey::DamageKept,
        BonusKey::Roll(RollType::Damage),
        BonusKey::Serious,
    ] {
        ctx.owner.bonuses.clear_one_shot(key);
    }
    HookStatus::Keep
}
