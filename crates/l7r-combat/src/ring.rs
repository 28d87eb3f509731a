//! The five rings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five core attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ring {
    /// Reflexes; governs parrying.
    Air,
    /// Toughness; governs how many wounds a fighter survives.
    Earth,
    /// Aggression; governs attacks and damage.
    Fire,
    /// Recovery; governs wound checks.
    Water,
    /// Insight; governs initiative and void points.
    Void,
}

impl Ring {
    /// Every ring, in canonical order.
    pub const ALL: [Ring; 5] = [Ring::Air, Ring::Earth, Ring::Fire, Ring::Water, Ring::Void];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Earth => "earth",
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Void => "void",
        }
    }

    /// Parse a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A fighter's five ring values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rings {
    /// Air ring.
    pub air: i32,
    /// Earth ring.
    pub earth: i32,
    /// Fire ring.
    pub fire: i32,
    /// Water ring.
    pub water: i32,
    /// Void ring.
    pub void: i32,
}

impl Rings {
    /// All five rings at the same value.
    pub const fn uniform(value: i32) -> Self {
        Self {
            air: value,
            earth: value,
            fire: value,
            water: value,
            void: value,
        }
    }

    /// Value of one ring.
    pub fn get(&self, ring: Ring) -> i32 {
        match ring {
            Ring::Air => self.air,
            Ring::Earth => self.earth,
            Ring::Fire => self.fire,
            Ring::Water => self.water,
            Ring::Void => self.void,
        }
    }

    /// Mutable access to one ring.
    pub fn get_mut(&mut self, ring: Ring) -> &mut i32 {
        match ring {
            Ring::Air => &mut self.air,
            Ring::Earth => &mut self.earth,
            Ring::Fire => &mut self.fire,
            Ring::Water => &mut self.water,
            Ring::Void => &mut self.void,
        }
    }

    /// The lowest ring value.
    pub fn lowest(&self) -> i32 {
        Ring::ALL.into_iter().map(|r| self.get(r)).min().unwrap_or(0)
    }
}

impl Default for Rings {
    fn default() -> Self {
        Self::uniform(2)
    }
}
