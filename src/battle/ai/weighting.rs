//! Move weighting under escalation
//!
//! Computes a composite selection multiplier for one candidate move from the
//! defender's escalation, the attacker's signature moves, and the attacker's
//! own escalation personality. Steps compose multiplicatively in a fixed
//! order; each applies only when its guard holds.

use serde::{Deserialize, Serialize};

use crate::battle::ai::personality::BiasOverrides;
use crate::battle::constants::{
    SCORE_FINISHER_BIAS, SCORE_LOW_POWER_CUTOFF, SCORE_LOW_POWER_PENALTY, SCORE_SIGNATURE_BIAS,
    STATE_FINISHER_BIAS, STATE_LOW_POWER_CUTOFF, STATE_LOW_POWER_PENALTY, STATE_SIGNATURE_BIAS,
};
use crate::battle::fighter::Fighter;
use crate::battle::moves::{Move, MoveType, TAG_DEBUFF_DISABLE, TAG_REQUIRES_OPENING, TAG_SETUP};

/// Defender score at which score-based bias switches on, absent config
pub const DEFAULT_SCORE_BIAS_THRESHOLD: f32 = 5.0;

/// Diagnostic tag for each weighting step that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightReason {
    ScoreSignature,
    ScoreFinisher,
    ScoreLowPower,
    StateFinisher,
    StateLowPower,
    StateSignature,
    EscalationOverride,
    UtilityOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveWeight {
    pub final_multiplier: f32,
    pub reasons_applied: Vec<WeightReason>,
}

impl MoveWeight {
    pub fn neutral() -> Self {
        Self {
            final_multiplier: 1.0,
            reasons_applied: Vec::new(),
        }
    }

    fn apply(&mut self, factor: f32, reason: WeightReason) {
        self.final_multiplier *= factor;
        self.reasons_applied.push(reason);
    }
}

/// Bias constants after escalation overrides are resolved
#[derive(Debug, Clone, Copy)]
struct BiasTable {
    score_signature: f32,
    score_finisher: f32,
    score_low_power: f32,
    state_finisher: f32,
    state_low_power: f32,
    state_signature: f32,
    utility: Option<f32>,
}

impl Default for BiasTable {
    fn default() -> Self {
        Self {
            score_signature: SCORE_SIGNATURE_BIAS,
            score_finisher: SCORE_FINISHER_BIAS,
            score_low_power: SCORE_LOW_POWER_PENALTY,
            state_finisher: STATE_FINISHER_BIAS,
            state_low_power: STATE_LOW_POWER_PENALTY,
            state_signature: STATE_SIGNATURE_BIAS,
            utility: None,
        }
    }
}

impl BiasTable {
    fn with_overrides(overrides: &BiasOverrides) -> Self {
        let mut table = Self::default();
        if let Some(bias) = overrides.signature_bias {
            table.score_signature = bias;
            table.state_signature = bias;
        }
        if let Some(bias) = overrides.finisher_bias {
            table.score_finisher = bias;
            table.state_finisher = bias;
        }
        if let Some(bias) = overrides.offensive_bias {
            table.score_low_power = bias;
            table.state_low_power = bias;
        }
        table.utility = overrides.utility_bias;
        table
    }
}

/// Weigh `mv` with the default score threshold
pub fn weigh_move(attacker: &Fighter, defender: &Fighter, mv: &Move) -> MoveWeight {
    weigh_move_with(attacker, defender, mv, DEFAULT_SCORE_BIAS_THRESHOLD)
}

/// Weigh `mv` for `attacker` against `defender`
///
/// Total: never panics, and a product that is negative or not finite
/// collapses to the neutral weight.
pub fn weigh_move_with(
    attacker: &Fighter,
    defender: &Fighter,
    mv: &Move,
    score_threshold: f32,
) -> MoveWeight {
    let mut weight = MoveWeight::neutral();

    let overrides = attacker
        .escalation_behavior
        .as_ref()
        .and_then(|behavior| behavior.overrides_for(attacker.escalation_state));
    let table = match overrides {
        Some(overrides) => {
            weight.reasons_applied.push(WeightReason::EscalationOverride);
            BiasTable::with_overrides(overrides)
        }
        None => BiasTable::default(),
    };

    let is_signature = attacker.personality.is_signature(&mv.name);
    let is_finisher = mv.move_type == MoveType::Finisher;
    let defender_state = defender.escalation_state;

    // Score-based escalation bias
    if defender.incapacitation_score >= score_threshold && defender_state.is_escalated() {
        if is_signature {
            weight.apply(table.score_signature, WeightReason::ScoreSignature);
        }
        if is_finisher || mv.has_tag(TAG_REQUIRES_OPENING) {
            weight.apply(table.score_finisher, WeightReason::ScoreFinisher);
        }
        let plain_utility = mv.move_type == MoveType::Utility
            && !mv.has_tag(TAG_DEBUFF_DISABLE)
            && !mv.has_tag(TAG_SETUP);
        if mv.power < SCORE_LOW_POWER_CUTOFF && (mv.move_type == MoveType::Offense || plain_utility) {
            weight.apply(table.score_low_power, WeightReason::ScoreLowPower);
        }
    }

    // Broad escalation-state bias
    if defender_state.is_severe() {
        if is_finisher {
            weight.apply(table.state_finisher, WeightReason::StateFinisher);
        }
        if mv.power < STATE_LOW_POWER_CUTOFF {
            weight.apply(table.state_low_power, WeightReason::StateLowPower);
        }
        if is_signature {
            weight.apply(table.state_signature, WeightReason::StateSignature);
        }
    }

    if let Some(bias) = table.utility {
        if mv.move_type == MoveType::Utility {
            weight.apply(bias, WeightReason::UtilityOverride);
        }
    }

    if !weight.final_multiplier.is_finite() || weight.final_multiplier < 0.0 {
        return MoveWeight::neutral();
    }
    weight
}
