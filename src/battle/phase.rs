//! Battle phases
//!
//! Four ordered phases: Opening, Escalation, Climax, Resolution. Phases only
//! move forward, one step per check, and each transition is announced with a
//! `phase_transition` event for the narrative layer.

use serde::{Deserialize, Serialize};

use crate::battle::ai::decision_context::compute_battle_phase;
use crate::battle::escalation::EscalationState;
use crate::battle::events::{BattleEventLog, BattleEventType};
use crate::battle::state::BattleState;
use crate::core::types::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    #[default]
    Opening,
    #[serde(alias = "early")]
    Escalation,
    #[serde(alias = "mid")]
    Climax,
    #[serde(alias = "late")]
    Resolution,
}

impl BattlePhase {
    pub fn next(self) -> Option<BattlePhase> {
        match self {
            BattlePhase::Opening => Some(BattlePhase::Escalation),
            BattlePhase::Escalation => Some(BattlePhase::Climax),
            BattlePhase::Climax => Some(BattlePhase::Resolution),
            BattlePhase::Resolution => None,
        }
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }
}

/// Turn thresholds for phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    /// Opening ends on this turn at the latest
    pub opening_turn_limit: Turn,
    /// Escalation ends on this turn at the latest
    pub climax_turn: Turn,
    /// Climax ends on this turn at the latest
    pub resolution_turn: Turn,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            opening_turn_limit: 3,
            climax_turn: 12,
            resolution_turn: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseState {
    pub current_phase: BattlePhase,
    pub phase_turn_count: u32,
}

/// Evaluates phase guards once per turn
#[derive(Debug, Clone, Default)]
pub struct PhaseManager {
    thresholds: PhaseThresholds,
}

impl PhaseManager {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    /// Whether the guard for leaving `current` holds
    pub fn should_advance(&self, state: &BattleState) -> bool {
        let current = state.phase.current_phase;
        let Some(next) = current.next() else {
            return false;
        };

        let turn = state.turn;
        let worst = state
            .fighters
            .iter()
            .map(|f| f.escalation_state)
            .max()
            .unwrap_or_default();

        let guard = match current {
            BattlePhase::Opening => {
                turn >= self.thresholds.opening_turn_limit || worst != EscalationState::Normal
            }
            BattlePhase::Escalation => {
                turn >= self.thresholds.climax_turn || worst.is_severe()
            }
            BattlePhase::Climax => {
                turn >= self.thresholds.resolution_turn
                    || worst == EscalationState::TerminalCollapse
            }
            BattlePhase::Resolution => false,
        };

        let [first, second] = &state.fighters;
        let hint = compute_battle_phase(turn, first.hp_ratio(), second.hp_ratio(), &self.thresholds);

        guard || hint >= next
    }

    /// Count the turn and advance at most one phase
    ///
    /// On transition the environment's per-phase counters are reset and a
    /// `phase_transition` event is pushed. Returns the new phase.
    pub fn check(&self, state: &mut BattleState, events: &mut BattleEventLog) -> Option<BattlePhase> {
        state.phase.phase_turn_count += 1;

        if !self.should_advance(state) {
            return None;
        }

        let from = state.phase.current_phase;
        let to = from.next()?;
        state.phase = PhaseState {
            current_phase: to,
            phase_turn_count: 0,
        };
        state.environment.reset_phase_counters();
        events.push(BattleEventType::PhaseTransition { from, to }, state.turn);

        tracing::debug!("Turn {}: phase {:?} -> {:?}", state.turn, from, to);
        Some(to)
    }
}
