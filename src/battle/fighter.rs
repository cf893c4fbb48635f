//! Fighters: data-defined combatants and their battle-local state

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::ai::personality::{EscalationBehavior, PersonalityProfile};
use crate::battle::constants::{MAX_MOMENTUM, MAX_VITAL, MIN_MOMENTUM};
use crate::battle::escalation::{EscalationState, EscalationThresholds};
use crate::battle::moves::{Element, Move};
use crate::core::error::ErrorCause;
use crate::core::types::FighterId;

/// Coarse ordinal mental state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentalState {
    #[default]
    Stable,
    Stressed,
    Shaken,
    Broken,
}

impl MentalState {
    /// Worst of the HP-based and escalation-based readings
    pub fn derive(hp_ratio: f32, escalation: EscalationState) -> Self {
        let from_hp = if hp_ratio < 0.15 {
            MentalState::Broken
        } else if hp_ratio < 0.35 {
            MentalState::Shaken
        } else if hp_ratio < 0.6 {
            MentalState::Stressed
        } else {
            MentalState::Stable
        };
        let from_escalation = match escalation {
            EscalationState::Normal => MentalState::Stable,
            EscalationState::Pressured => MentalState::Stressed,
            EscalationState::SeverelyIncapacitated => MentalState::Shaken,
            EscalationState::TerminalCollapse => MentalState::Broken,
        };
        from_hp.max(from_escalation)
    }
}

/// Encyclopedia traits the pre-battle predictor reads
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTraits {
    pub tier: u8,
    pub role: Option<String>,
    pub tone: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub fighting_style: Option<String>,
}

fn default_vital() -> f32 {
    MAX_VITAL
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: FighterId,
    pub name: String,
    #[serde(default)]
    pub element: Element,

    // Vitals
    #[serde(default = "default_vital")]
    pub hp: f32,
    #[serde(default = "default_vital")]
    pub max_hp: f32,
    #[serde(default = "default_vital")]
    pub energy: f32,
    #[serde(default = "default_vital")]
    pub max_energy: f32,
    #[serde(default)]
    pub momentum: f32,

    // Escalation
    #[serde(default)]
    pub incapacitation_score: f32,
    #[serde(default)]
    pub escalation_state: EscalationState,
    #[serde(default)]
    pub stun_duration: u32,
    #[serde(default)]
    pub mental_state: MentalState,

    #[serde(default)]
    pub personality: PersonalityProfile,
    pub moves: Vec<Move>,
    #[serde(default)]
    pub escalation_behavior: Option<EscalationBehavior>,
    #[serde(default)]
    pub traits: CharacterTraits,

    // Battle-local
    /// Fraction of incoming damage absorbed until this fighter's next turn
    #[serde(default)]
    pub guard: Option<f32>,
    /// Multiplier on the next damaging move
    #[serde(default)]
    pub focus: Option<f32>,
    #[serde(default)]
    pub last_move: Option<String>,
    #[serde(default)]
    pub cooldowns: AHashMap<String, u32>,
}

impl Fighter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, element: Element) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            element,
            hp: MAX_VITAL,
            max_hp: MAX_VITAL,
            energy: MAX_VITAL,
            max_energy: MAX_VITAL,
            momentum: 0.0,
            incapacitation_score: 0.0,
            escalation_state: EscalationState::Normal,
            stun_duration: 0,
            mental_state: MentalState::Stable,
            personality: PersonalityProfile::default(),
            moves: Vec::new(),
            escalation_behavior: None,
            traits: CharacterTraits::default(),
            guard: None,
            focus: None,
            last_move: None,
            cooldowns: AHashMap::new(),
        }
    }

    pub fn with_moves(mut self, moves: Vec<Move>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_personality(mut self, personality: PersonalityProfile) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_traits(mut self, traits: CharacterTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Battle copy of a registry template
    ///
    /// Templates are never mutated; every battle gets its own deep copy with
    /// battle-local state cleared and escalation re-derived from the score.
    pub fn instantiate(template: &Fighter, thresholds: &EscalationThresholds) -> Self {
        let mut fighter = template.clone();
        fighter.guard = None;
        fighter.focus = None;
        fighter.last_move = None;
        fighter.cooldowns.clear();
        fighter.escalation_state = thresholds.classify(fighter.incapacitation_score);
        fighter.mental_state = MentalState::derive(fighter.hp_ratio(), fighter.escalation_state);
        fighter
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    pub fn find_move(&self, name: &str) -> Option<&Move> {
        self.moves.iter().find(|m| m.name == name)
    }

    pub fn has_move(&self, name: &str) -> bool {
        self.find_move(name).is_some()
    }

    /// Moves that are affordable and off cooldown
    pub fn available_moves(&self) -> Vec<&Move> {
        self.moves
            .iter()
            .filter(|m| m.energy_cost <= self.energy)
            .filter(|m| self.cooldowns.get(&m.name).copied().unwrap_or(0) == 0)
            .collect()
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_duration > 0
    }

    /// Down by absolute score cap or terminal collapse
    pub fn is_downed(&self, absolute_score_cap: f32) -> bool {
        self.incapacitation_score >= absolute_score_cap
            || self.escalation_state == EscalationState::TerminalCollapse
    }

    /// Raise the score and re-derive the escalation state
    ///
    /// Returns the state before the change. Non-positive and non-finite
    /// amounts are ignored so the score never decreases.
    pub fn add_incapacitation(
        &mut self,
        amount: f32,
        thresholds: &EscalationThresholds,
    ) -> EscalationState {
        let before = self.escalation_state;
        if amount.is_finite() && amount > 0.0 {
            self.incapacitation_score += amount;
        }
        self.escalation_state = thresholds.classify(self.incapacitation_score);
        before
    }

    /// Raise the score to at least `floor`
    pub fn raise_incapacitation_to(
        &mut self,
        floor: f32,
        thresholds: &EscalationThresholds,
    ) -> EscalationState {
        let gap = floor - self.incapacitation_score;
        self.add_incapacitation(gap, thresholds)
    }

    /// Explicit reset, the only way the score goes down
    pub fn reset_escalation(&mut self) {
        self.incapacitation_score = 0.0;
        self.escalation_state = EscalationState::Normal;
    }

    /// Apply damage after clamping; returns HP actually lost
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let before = self.hp;
        self.hp = (self.hp - amount).clamp(0.0, self.max_hp);
        before - self.hp
    }

    pub fn spend_energy(&mut self, amount: f32) {
        self.energy = (self.energy - amount.max(0.0)).clamp(0.0, self.max_energy);
    }

    pub fn restore_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount.max(0.0)).clamp(0.0, self.max_energy);
    }

    pub fn adjust_momentum(&mut self, delta: f32) {
        if delta.is_finite() {
            self.momentum = (self.momentum + delta).clamp(MIN_MOMENTUM, MAX_MOMENTUM);
        }
    }

    pub fn start_cooldown(&mut self, move_name: &str, turns: u32) {
        if turns > 0 {
            self.cooldowns.insert(move_name.to_string(), turns);
        }
    }

    pub fn tick_cooldowns(&mut self) {
        for turns in self.cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
        self.cooldowns.retain(|_, turns| *turns > 0);
    }

    /// Re-derive mental state; returns the previous state when it changed
    pub fn refresh_mental_state(&mut self) -> Option<MentalState> {
        let next = MentalState::derive(self.hp_ratio(), self.escalation_state);
        if next == self.mental_state {
            return None;
        }
        let before = self.mental_state;
        self.mental_state = next;
        Some(before)
    }

    /// Input validation run before a battle starts
    pub fn validate(&self) -> Result<(), ErrorCause> {
        let field = |name: &str| format!("{}.{}", self.id, name);

        if self.id.trim().is_empty() {
            return Err(ErrorCause::validation("fighter.id", "must not be empty"));
        }
        if !(self.max_hp > 0.0 && self.max_hp <= MAX_VITAL) {
            return Err(ErrorCause::validation(field("max_hp"), "must lie in (0, 100]"));
        }
        if !(0.0..=self.max_hp).contains(&self.hp) {
            return Err(ErrorCause::validation(field("hp"), "must lie in [0, max_hp]"));
        }
        if !(self.max_energy > 0.0 && self.max_energy <= MAX_VITAL) {
            return Err(ErrorCause::validation(field("max_energy"), "must lie in (0, 100]"));
        }
        if !(0.0..=self.max_energy).contains(&self.energy) {
            return Err(ErrorCause::validation(field("energy"), "must lie in [0, max_energy]"));
        }
        if !(MIN_MOMENTUM..=MAX_MOMENTUM).contains(&self.momentum) {
            return Err(ErrorCause::validation(field("momentum"), "must lie in [-100, 100]"));
        }
        if !(self.incapacitation_score.is_finite() && self.incapacitation_score >= 0.0) {
            return Err(ErrorCause::validation(field("incapacitation_score"), "must be >= 0"));
        }
        if self.moves.is_empty() {
            return Err(ErrorCause::validation(field("moves"), "must not be empty"));
        }
        let mut names = AHashSet::new();
        for mv in &self.moves {
            if !names.insert(mv.name.as_str()) {
                return Err(ErrorCause::validation(
                    field("moves"),
                    format!("duplicate move name '{}'", mv.name),
                ));
            }
            if !(mv.power.is_finite() && mv.power >= 0.0) {
                return Err(ErrorCause::validation(
                    field(&format!("moves.{}.power", mv.name)),
                    "must be >= 0",
                ));
            }
            if !(mv.accuracy > 0.0 && mv.accuracy <= 1.0) {
                return Err(ErrorCause::validation(
                    field(&format!("moves.{}.accuracy", mv.name)),
                    "must lie in (0, 1]",
                ));
            }
        }
        if !self.moves.iter().any(Move::is_always_available) {
            return Err(ErrorCause::validation(
                field("moves"),
                "needs at least one move with no energy cost and no cooldown",
            ));
        }
        self.personality
            .validate()
            .map_err(|reason| ErrorCause::validation(field("personality"), reason))?;
        Ok(())
    }
}
