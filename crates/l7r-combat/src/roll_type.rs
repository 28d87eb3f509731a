//! Roll categories and the keys bonuses are filed under.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ring::Ring;

/// A category of roll. Bonuses, extra dice and pool overrides are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollType {
    /// A basic attack.
    Attack,
    /// A strike made in response to someone else's attack.
    Counterattack,
    /// An attack at +20 TN that deals heavy damage on a hit.
    DoubleAttack,
    /// An attack that deals no damage but wins a VP and a fresh action.
    Feint,
    /// The dueling draw-and-strike.
    Iaijutsu,
    /// An attack that lowers the attacker's own TN for extra damage.
    Lunge,
    /// A parry.
    Parry,
    /// A wound check against accumulated light wounds.
    WoundCheck,
    /// A damage roll.
    Damage,
    /// The per-round action dice roll.
    Initiative,
}

impl RollType {
    /// Every roll type.
    pub const ALL: [RollType; 10] = [
        RollType::Attack,
        RollType::Counterattack,
        RollType::DoubleAttack,
        RollType::Feint,
        RollType::Iaijutsu,
        RollType::Lunge,
        RollType::Parry,
        RollType::WoundCheck,
        RollType::Damage,
        RollType::Initiative,
    ];

    /// Roll types that are attack rolls.
    pub const ATTACKS: [RollType; 6] = [
        RollType::Attack,
        RollType::Counterattack,
        RollType::DoubleAttack,
        RollType::Feint,
        RollType::Iaijutsu,
        RollType::Lunge,
    ];

    /// Advanced skills a fighter may train.
    pub const KNACKS: [RollType; 5] = [
        RollType::Counterattack,
        RollType::DoubleAttack,
        RollType::Feint,
        RollType::Iaijutsu,
        RollType::Lunge,
    ];

    /// Returns true for attack rolls.
    pub fn is_attack(self) -> bool {
        Self::ATTACKS.contains(&self)
    }

    /// Returns true for trainable knacks.
    pub fn is_knack(self) -> bool {
        Self::KNACKS.contains(&self)
    }

    /// The ring that governs this roll unless an ability overrides it.
    pub fn default_ring(self) -> Ring {
        match self {
            Self::Parry => Ring::Air,
            Self::WoundCheck => Ring::Water,
            Self::Initiative => Ring::Void,
            _ => Ring::Fire,
        }
    }

    /// Snake-case name used in stat lists and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Counterattack => "counterattack",
            Self::DoubleAttack => "double_attack",
            Self::Feint => "feint",
            Self::Iaijutsu => "iaijutsu",
            Self::Lunge => "lunge",
            Self::Parry => "parry",
            Self::WoundCheck => "wound_check",
            Self::Damage => "damage",
            Self::Initiative => "initiative",
        }
    }

    /// Parse a snake-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rt| rt.name() == name)
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().replace('_', " "))
    }
}

/// A key into the one-shot bonus pool.
///
/// Besides one per roll type, damage has sub-keys for extra dice and
/// automatic serious wounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BonusKey {
    /// A flat bonus to a roll.
    Roll(RollType),
    /// Extra rolled damage dice.
    DamageRolled,
    /// Extra kept damage dice.
    DamageKept,
    /// Automatic serious wounds dealt with the next damage.
    Serious,
}

impl From<RollType> for BonusKey {
    fn from(roll_type: RollType) -> Self {
        BonusKey::Roll(roll_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for rt in RollType::ALL {
            assert_eq!(RollType::from_name(rt.name()), Some(rt));
        }
        assert_eq!(RollType::from_name("haiku"), None);
    }

    #[test]
    fn classification() {
        assert!(RollType::Lunge.is_attack());
        assert!(!RollType::Parry.is_attack());
        assert!(RollType::Feint.is_knack());
        assert!(!RollType::Attack.is_knack());
    }

    #[test]
    fn governing_rings() {
        assert_eq!(RollType::Attack.default_ring(), Ring::Fire);
        assert_eq!(RollType::Damage.default_ring(), Ring::Fire);
        assert_eq!(RollType::Parry.default_ring(), Ring::Air);
        assert_eq!(RollType::WoundCheck.default_ring(), Ring::Water);
        assert_eq!(RollType::Initiative.default_ring(), Ring::Void);
    }

    #[test]
    fn display_uses_spaces() {
        assert_eq!(RollType::DoubleAttack.to_string(), "double attack");
    }
}
