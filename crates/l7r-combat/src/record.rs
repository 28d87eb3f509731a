//! Structured records of everything a combat resolves.
//!
//! Each record carries the dice actually rolled, the modifiers applied and
//! where they came from, the final total, the TN and the outcome. That is
//! enough to rebuild a full transcript, and every record serializes.

use l7r_dice::{DiceRoll, DieResult};
use serde::{Deserialize, Serialize};

use crate::formation::Side;
use crate::roll_type::RollType;

/// Where a modifier on a roll came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierSource {
    /// A permanent bonus.
    Permanent,
    /// A one-shot bonus set by a trigger.
    OneShot,
    /// Discretionary bonuses chosen by the fighter.
    Discretionary,
    /// The flat bonus for a pre-declared parry.
    Predeclare,
    /// Free raises won during a duel.
    FreeRaise,
}

impl ModifierSource {
    /// Short label for transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::OneShot => "one-shot",
            Self::Discretionary => "discretionary",
            Self::Predeclare => "predeclare",
            Self::FreeRaise => "free raise",
        }
    }
}

/// A labeled bonus applied to a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    /// Where it came from.
    pub source: ModifierSource,
    /// How much it added.
    pub value: i32,
}

/// Collect the non-zero modifiers from `(source, value)` pairs.
pub(crate) fn modifiers(pairs: &[(ModifierSource, i32)]) -> Vec<Modifier> {
    pairs
        .iter()
        .filter(|(_, value)| *value != 0)
        .map(|&(source, value)| Modifier { source, value })
        .collect()
}

/// One fighter's action dice for a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeRecord {
    /// Who rolled.
    pub fighter: String,
    /// Every die rolled, lowest first; the kept ones are the actions.
    pub dice: Vec<DieResult>,
    /// The resulting action schedule.
    pub actions: Vec<i32>,
}

/// A single attack and everything it caused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Who attacked.
    pub attacker: String,
    /// Who was attacked.
    pub defender: String,
    /// Attack knack used.
    pub knack: RollType,
    /// Phase the attack happened in.
    pub phase: i32,
    /// Void points committed before the roll.
    pub vps_spent: i32,
    /// The attack dice. `None` if the attacker died before rolling.
    pub roll: Option<DiceRoll>,
    /// Bonuses added to the dice.
    pub modifiers: Vec<Modifier>,
    /// Final attack total.
    pub total: i32,
    /// The defender's TN at the time of the roll.
    pub tn: i32,
    /// Whether the total met the TN.
    pub hit: bool,
    /// Counterattacks, parries, damage and wound checks this attack caused.
    pub children: Vec<ActionRecord>,
}

impl AttackRecord {
    /// A record for an attack that has not been rolled yet.
    pub(crate) fn pending(attacker: &str, defender: &str, knack: RollType, phase: i32) -> Self {
        Self {
            attacker: attacker.to_string(),
            defender: defender.to_string(),
            knack,
            phase,
            vps_spent: 0,
            roll: None,
            modifiers: Vec::new(),
            total: 0,
            tn: 0,
            hit: false,
            children: Vec::new(),
        }
    }

    /// Whether the attack connects for damage. Feints never do.
    pub fn lands(&self) -> bool {
        self.hit && self.knack != RollType::Feint
    }
}

/// A parry attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParryRecord {
    /// Who parried.
    pub parrier: String,
    /// Whose attack was parried.
    pub attacker: String,
    /// The ally being protected, when parrying for someone else.
    pub on_behalf_of: Option<String>,
    /// Void points spent on the parry.
    pub vps_spent: i32,
    /// The parry dice.
    pub roll: DiceRoll,
    /// Bonuses added to the dice.
    pub modifiers: Vec<Modifier>,
    /// Final parry total.
    pub total: i32,
    /// The attack total to beat, including any raise for parrying for an ally.
    pub tn: i32,
    /// Whether the parry blocked the attack.
    pub success: bool,
    /// Whether the parry was committed before the attack roll.
    pub predeclared: bool,
    /// Whether the parry spent future action dice out of turn.
    pub interrupt: bool,
}

/// A damage roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Who dealt the damage.
    pub attacker: String,
    /// Who took it.
    pub defender: String,
    /// The damage dice.
    pub roll: DiceRoll,
    /// Flat bonuses added to the dice.
    pub modifiers: Vec<Modifier>,
    /// Light wounds dealt.
    pub light: i32,
    /// Serious wounds dealt directly.
    pub serious: i32,
    /// Rolled dice added for exceeding the TN and from triggers.
    pub extra_rolled: i32,
    /// Kept dice added by triggers.
    pub extra_kept: i32,
}

/// A wound check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoundCheckRecord {
    /// Who checked.
    pub fighter: String,
    /// Light wounds from the hit that caused the check.
    pub light_this_hit: i32,
    /// Light wounds checked against, including older ones.
    pub light_total: i32,
    /// Void points spent on the check.
    pub vps_spent: i32,
    /// The wound check dice.
    pub roll: DiceRoll,
    /// Bonuses added to the dice.
    pub modifiers: Vec<Modifier>,
    /// Final check total.
    pub total: i32,
    /// Whether the check met the light wound total.
    pub passed: bool,
    /// Serious wounds taken from the hit and the check together.
    pub serious_taken: i32,
    /// Whether a serious wound was taken voluntarily to clear light wounds.
    pub voluntary_serious: bool,
}

/// Any step of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    /// An attack, possibly a counterattack.
    Attack(AttackRecord),
    /// A parry.
    Parry(ParryRecord),
    /// A damage roll.
    Damage(DamageRecord),
    /// A wound check.
    WoundCheck(WoundCheckRecord),
    /// A fighter died.
    Death {
        /// Who died.
        fighter: String,
    },
}

/// Number of phases in a round, 0 through 10.
pub const PHASES: usize = 11;

/// One combat round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, starting at 1.
    pub number: u32,
    /// Initiative rolls in side order.
    pub initiatives: Vec<InitiativeRecord>,
    /// Actions per phase, indexed 0 through 10.
    pub phases: Vec<Vec<ActionRecord>>,
}

impl RoundRecord {
    pub(crate) fn new(number: u32) -> Self {
        Self {
            number,
            initiatives: Vec::new(),
            phases: vec![Vec::new(); PHASES],
        }
    }

    /// Every top-level action in phase order.
    pub fn actions(&self) -> impl Iterator<Item = &ActionRecord> {
        self.phases.iter().flatten()
    }
}

/// One round of an iaijutsu duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRoundRecord {
    /// Duel round number, starting at 1.
    pub number: u32,
    /// Side A's contested roll.
    pub contested_a: DiceRoll,
    /// Side B's contested roll.
    pub contested_b: DiceRoll,
    /// Whether side A's duelist struck.
    pub a_strikes: bool,
    /// Whether side B's duelist struck.
    pub b_strikes: bool,
    /// Whether the focus limit forced both duelists to strike.
    pub forced: bool,
    /// Strikes in resolution order, with their damage and wound checks.
    pub strikes: Vec<AttackRecord>,
    /// Whether the duelists resheathed after both missed.
    pub resheathe: bool,
}

/// A complete pre-combat duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRecord {
    /// Side A's duelist.
    pub a: String,
    /// Side B's duelist.
    pub b: String,
    /// Duel rounds in order.
    pub rounds: Vec<DuelRoundRecord>,
    /// Deaths caused by the duel.
    pub deaths: Vec<String>,
}

/// A complete combat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatRecord {
    /// The opening duel, if one was fought.
    pub duel: Option<DuelRecord>,
    /// Every round fought.
    pub rounds: Vec<RoundRecord>,
    /// The winning side, once the combat has finished.
    pub winner: Option<Side>,
}
