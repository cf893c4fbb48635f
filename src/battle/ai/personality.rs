//! Fighter personality configuration loaded from TOML
//!
//! Personalities define behavior tendencies, signature-move preferences and
//! optional escalation overrides that kick in when the fighter itself is
//! close to collapse.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::escalation::EscalationState;

/// Behavioral tendencies (each 0.0 to 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityProfile {
    /// Tendency to attack (0.0 = passive, 1.0 = relentless)
    pub aggression: f32,
    /// Willingness to wait for an opening
    pub patience: f32,
    /// Appetite for high-power, high-variance moves
    pub risk_tolerance: f32,
    /// Tendency to press an advantage once the opponent is hurt
    pub opportunism: f32,
    /// Preference for utility and setup moves
    pub creativity: f32,
    /// Preference for defensive moves
    pub defensive_bias: f32,
    /// Dislike of repeating the previous move
    pub anti_repeater: f32,
    /// How strongly the best-scored move dominates selection
    pub predictability: f32,
    /// Move name -> multiplier (> 0) for signature moves
    pub signature_move_bias: AHashMap<String, f32>,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            patience: 0.5,
            risk_tolerance: 0.5,
            opportunism: 0.5,
            creativity: 0.3,
            defensive_bias: 0.3,
            anti_repeater: 0.5,
            predictability: 0.3,
            signature_move_bias: AHashMap::new(),
        }
    }
}

impl PersonalityProfile {
    pub fn signature_bias(&self, move_name: &str) -> Option<f32> {
        self.signature_move_bias.get(move_name).copied()
    }

    pub fn is_signature(&self, move_name: &str) -> bool {
        self.signature_move_bias.contains_key(move_name)
    }

    /// Trait values by name, for validation
    pub fn traits(&self) -> [(&'static str, f32); 8] {
        [
            ("aggression", self.aggression),
            ("patience", self.patience),
            ("risk_tolerance", self.risk_tolerance),
            ("opportunism", self.opportunism),
            ("creativity", self.creativity),
            ("defensive_bias", self.defensive_bias),
            ("anti_repeater", self.anti_repeater),
            ("predictability", self.predictability),
        ]
    }

    /// First trait outside [0, 1] or signature bias that is not positive
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in self.traits() {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} ({}) must lie in [0, 1]", name, value));
            }
        }
        for (name, bias) in &self.signature_move_bias {
            if !(bias.is_finite() && *bias > 0.0) {
                return Err(format!("signature bias for {} ({}) must be positive", name, bias));
            }
        }
        Ok(())
    }
}

/// Replacement bias constants for the weighting engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasOverrides {
    /// Replaces the signature-move multipliers
    pub signature_bias: Option<f32>,
    /// Replaces the low-power penalty multipliers
    pub offensive_bias: Option<f32>,
    /// Replaces the finisher multipliers
    pub finisher_bias: Option<f32>,
    /// Extra multiplier on utility moves
    pub utility_bias: Option<f32>,
}

/// Character-specific escalation personality
///
/// Only consulted once the fighter's own state is SeverelyIncapacitated or
/// TerminalCollapse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationBehavior {
    pub severely_incapacitated: Option<BiasOverrides>,
    pub terminal_collapse: Option<BiasOverrides>,
}

impl EscalationBehavior {
    pub fn overrides_for(&self, state: EscalationState) -> Option<&BiasOverrides> {
        match state {
            EscalationState::SeverelyIncapacitated => self.severely_incapacitated.as_ref(),
            EscalationState::TerminalCollapse => self.terminal_collapse.as_ref(),
            EscalationState::Normal | EscalationState::Pressured => None,
        }
    }
}
