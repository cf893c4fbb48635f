//! Move definitions and elemental matchups

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Tag: finisher-like move that needs the defender already pressured
pub const TAG_REQUIRES_OPENING: &str = "requires_opening";
/// Tag: move that disables the defender
pub const TAG_DEBUFF_DISABLE: &str = "debuff_disable";
/// Tag: move that sets up a later move
pub const TAG_SETUP: &str = "setup";
/// Tag: move that always leaves a mark on the environment
pub const TAG_ENVIRONMENTAL: &str = "environmental";

/// Elemental affinity of a fighter or move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Air,
    Water,
    Earth,
    Fire,
    #[default]
    Nonbending,
}

impl Element {
    pub fn is_bending(self) -> bool {
        !matches!(self, Element::Nonbending)
    }

    /// Damage multiplier of `self` attacking `defender`
    ///
    /// Cycle: water > fire > air > earth > water. Nonbending is neutral both ways.
    pub fn multiplier_against(self, defender: Element) -> f32 {
        use Element::*;
        match (self, defender) {
            (Water, Fire) | (Fire, Air) | (Air, Earth) | (Earth, Water) => 1.5,
            (Fire, Water) | (Air, Fire) | (Earth, Air) | (Water, Earth) => 0.75,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    Offense,
    Defense,
    Utility,
    Finisher,
}

impl MoveType {
    /// Offense and finisher moves deal damage
    pub fn is_damaging(self) -> bool {
        matches!(self, MoveType::Offense | MoveType::Finisher)
    }
}

/// Effect a move leaves behind on use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetupEffect {
    /// Next damaging move is multiplied
    Focus { multiplier: f32 },
    /// Incoming damage reduced by this fraction until the user's next turn
    Guard { reduction: f32 },
    /// Defender loses its next turns
    Disable { turns: u32 },
    /// Energy restored to the user
    Recover { energy: f32 },
}

fn default_accuracy() -> f32 {
    0.9
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub name: String,
    pub move_type: MoveType,
    pub power: f32,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub tags: AHashSet<String>,
    #[serde(default)]
    pub setup_effect: Option<SetupEffect>,
    #[serde(default)]
    pub energy_cost: f32,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default = "default_accuracy")]
    pub accuracy: f32,
}

impl Move {
    pub fn new(name: impl Into<String>, move_type: MoveType, power: f32) -> Self {
        Self {
            name: name.into(),
            move_type,
            power,
            element: Element::Nonbending,
            tags: AHashSet::new(),
            setup_effect: None,
            energy_cost: 0.0,
            cooldown: 0,
            accuracy: default_accuracy(),
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn with_setup(mut self, effect: SetupEffect) -> Self {
        self.setup_effect = Some(effect);
        self
    }

    pub fn with_cost(mut self, energy_cost: f32) -> Self {
        self.energy_cost = energy_cost;
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Usable every turn no matter the fighter's energy
    pub fn is_always_available(&self) -> bool {
        self.energy_cost <= 0.0 && self.cooldown == 0
    }

    /// Leaves an impact on the environment when it lands
    pub fn is_environmental(&self) -> bool {
        self.power >= 50.0 || self.has_tag(TAG_ENVIRONMENTAL)
    }
}
