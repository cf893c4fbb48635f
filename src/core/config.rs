//! Simulation configuration with documented constants
//!
//! Every tunable the engine consults lives here so a host can override it
//! per battle. Values load from TOML with missing keys falling back to the
//! defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::battle::escalation::EscalationThresholds;
use crate::battle::phase::PhaseThresholds;
use crate::core::error::SimError;

/// Configuration for one battle (or one batch of battles)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === LOOP ===
    /// Turn cap before the battle is declared a stalemate
    pub max_turns: u32,

    /// Host step budget. When set and smaller than `max_turns`, the loop
    /// aborts after this many turns with a `terminated` result instead of
    /// running to a natural stalemate.
    pub step_budget: Option<u32>,

    /// Host wall-clock budget in milliseconds, checked between turns.
    pub wall_clock_limit_ms: Option<u64>,

    /// Seed for the battle RNG. `None` draws a fresh seed per battle.
    pub seed: Option<u64>,

    // === STATE MACHINES ===
    /// Incapacitation thresholds for the escalation state machine
    pub escalation: EscalationThresholds,

    /// Turn thresholds for phase transitions
    pub phase: PhaseThresholds,

    /// Incapacitation score at which a fighter is down regardless of state
    pub absolute_score_cap: f32,

    // === AI ===
    /// Defender score at which score-based escalation bias switches on
    ///
    /// Works together with the defender's escalation state: both must hold.
    pub score_bias_threshold: f32,

    /// Decisions whose relative confidence falls below this use the fallback
    pub min_confidence: f32,

    /// Per-decision scoring budget in milliseconds
    pub decision_time_limit_ms: Option<u64>,

    /// Emit per-move scores through tracing at debug level
    pub debug_decisions: bool,

    // === RESOLUTION ===
    /// Energy restored to the active fighter at the start of its turn
    pub energy_regen: f32,

    /// Converts move power to HP damage
    ///
    /// At 0.25 a power-40 move deals ~10 HP before modifiers, so an even
    /// fight lasts roughly 10-20 turns.
    pub damage_scale: f32,

    /// Chance that a landed hit is critical
    pub crit_chance: f32,

    /// HP damage per point of incapacitation score
    pub damage_per_score_point: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_turns: 50,
            step_budget: None,
            wall_clock_limit_ms: None,
            seed: None,

            escalation: EscalationThresholds::default(),
            phase: PhaseThresholds::default(),
            absolute_score_cap: 100.0,

            score_bias_threshold: 5.0,
            min_confidence: 0.3,
            decision_time_limit_ms: None,
            debug_decisions: false,

            energy_regen: 8.0,
            damage_scale: 0.25,
            crit_chance: 0.08,
            damage_per_score_point: 8.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, then validate it
    pub fn from_toml_str(contents: &str) -> Result<Self, SimError> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate().map_err(SimError::Config)?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn wall_clock_limit(&self) -> Option<Duration> {
        self.wall_clock_limit_ms.map(Duration::from_millis)
    }

    pub fn decision_time_limit(&self) -> Option<Duration> {
        self.decision_time_limit_ms.map(Duration::from_millis)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_turns == 0 {
            return Err("max_turns must be at least 1".into());
        }

        let e = &self.escalation;
        if !(0.0 < e.pressured
            && e.pressured < e.severely_incapacitated
            && e.severely_incapacitated < e.terminal_collapse)
        {
            return Err(format!(
                "escalation thresholds must be positive and ascending ({} < {} < {})",
                e.pressured, e.severely_incapacitated, e.terminal_collapse
            ));
        }

        if self.absolute_score_cap < e.terminal_collapse {
            return Err(format!(
                "absolute_score_cap ({}) should be >= terminal_collapse ({})",
                self.absolute_score_cap, e.terminal_collapse
            ));
        }

        let p = &self.phase;
        if !(p.opening_turn_limit < p.climax_turn && p.climax_turn < p.resolution_turn) {
            return Err(format!(
                "phase thresholds must be ascending ({} < {} < {})",
                p.opening_turn_limit, p.climax_turn, p.resolution_turn
            ));
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence ({}) must lie in [0, 1]",
                self.min_confidence
            ));
        }

        if !(0.0..=1.0).contains(&self.crit_chance) {
            return Err("crit_chance must lie in [0, 1]".into());
        }

        if self.damage_scale <= 0.0 || self.damage_per_score_point <= 0.0 {
            return Err("damage_scale and damage_per_score_point must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unordered_escalation_thresholds() {
        let mut config = SimulationConfig::default();
        config.escalation.pressured = 9.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unordered_phase_thresholds() {
        let mut config = SimulationConfig::default();
        config.phase.climax_turn = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimulationConfig::from_toml_str("max_turns = 20\nseed = 7\n").unwrap();
        assert_eq!(config.max_turns, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_confidence, 0.3);
        assert_eq!(config.phase, PhaseThresholds::default());
    }

    #[test]
    fn test_nested_toml_overrides() {
        let toml = r#"
            [escalation]
            pressured = 3.0
            severely_incapacitated = 6.0
            terminal_collapse = 9.0
        "#;
        let config = SimulationConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.escalation.terminal_collapse, 9.0);
    }

    #[test]
    fn test_invalid_toml_config_rejected() {
        let result = SimulationConfig::from_toml_str("max_turns = 0\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}
