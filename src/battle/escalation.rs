//! Escalation state machine
//!
//! Maps an accumulated incapacitation score onto four ordered combat-intensity
//! tiers. The mapping is a pure step function with no hysteresis: the same
//! score always yields the same state, whatever the history.

use serde::{Deserialize, Serialize};

/// Ordered escalation tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    #[default]
    Normal,
    Pressured,
    SeverelyIncapacitated,
    TerminalCollapse,
}

impl EscalationState {
    pub const ALL: [EscalationState; 4] = [
        EscalationState::Normal,
        EscalationState::Pressured,
        EscalationState::SeverelyIncapacitated,
        EscalationState::TerminalCollapse,
    ];

    /// Classify a score against the default thresholds
    pub fn from_score(score: f32) -> Self {
        EscalationThresholds::default().classify(score)
    }

    /// Pressured or worse
    pub fn is_escalated(self) -> bool {
        self >= EscalationState::Pressured
    }

    /// SeverelyIncapacitated or TerminalCollapse
    pub fn is_severe(self) -> bool {
        self >= EscalationState::SeverelyIncapacitated
    }

    fn rank(self) -> usize {
        self as usize
    }

    /// Every state strictly after `from` up to and including `to`, in order.
    ///
    /// Empty when `to` is not later than `from`.
    pub fn path(from: EscalationState, to: EscalationState) -> Vec<EscalationState> {
        if to <= from {
            return Vec::new();
        }
        Self::ALL[from.rank() + 1..=to.rank()].to_vec()
    }
}

/// Score thresholds, evaluated highest-first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationThresholds {
    pub pressured: f32,
    pub severely_incapacitated: f32,
    pub terminal_collapse: f32,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            pressured: 4.0,
            severely_incapacitated: 8.0,
            terminal_collapse: 11.0,
        }
    }
}

impl EscalationThresholds {
    /// Total: NaN and negative scores classify as `Normal`.
    pub fn classify(&self, score: f32) -> EscalationState {
        if score >= self.terminal_collapse {
            EscalationState::TerminalCollapse
        } else if score >= self.severely_incapacitated {
            EscalationState::SeverelyIncapacitated
        } else if score >= self.pressured {
            EscalationState::Pressured
        } else {
            EscalationState::Normal
        }
    }
}
