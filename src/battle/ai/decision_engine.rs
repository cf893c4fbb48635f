//! Personality-driven move selection
//!
//! Scores every available move from the actor's personality, multiplies in
//! the escalation weighting, sharpens by predictability and then picks with
//! one weighted-random draw. Arg-max is deliberately avoided so battles keep
//! variety while strong moves stay statistically favored.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::personality::PersonalityProfile;
use crate::battle::ai::weighting::{weigh_move_with, WeightReason};
use crate::battle::ai::BattleAI;
use crate::battle::constants::FALLBACK_CONFIDENCE;
use crate::battle::fighter::MentalState;
use crate::battle::moves::{Move, MoveType, TAG_SETUP};
use crate::battle::phase::BattlePhase;
use crate::battle::rng::{BattleRng, DrawPurpose};
use crate::core::config::SimulationConfig;
use crate::core::error::ErrorCause;

/// Why the engine used its degraded decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackCause {
    LowConfidence,
    ScoringFailed,
    TimeLimit,
    InvalidDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReasoning {
    /// Weighted pick; reasons are the weighting steps that fired for the chosen move
    Weighted { reasons: Vec<WeightReason> },
    Fallback { cause: FallbackCause },
}

impl DecisionReasoning {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionReasoning::Weighted { .. } => "weighted",
            DecisionReasoning::Fallback { .. } => "fallback",
        }
    }
}

/// Score breakdown for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveScore {
    pub move_name: String,
    pub base: f32,
    pub multiplier: f32,
    /// After predictability sharpening
    pub score: f32,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDecision {
    pub move_name: String,
    pub confidence: f32,
    pub reasoning: DecisionReasoning,
    pub move_scores: Vec<MoveScore>,
    pub fallback: bool,
}

/// Personality score before escalation weighting
pub fn base_personality_score(
    mv: &Move,
    personality: &PersonalityProfile,
    context: &DecisionContext,
) -> f32 {
    let p = personality;
    let mut score = match mv.move_type {
        MoveType::Offense => 0.5 + p.aggression + 0.5 * p.risk_tolerance * mv.power / 100.0,
        MoveType::Defense => 0.5 + p.defensive_bias + 0.5 * p.patience,
        MoveType::Utility => {
            let mut s = 0.5 + p.creativity + 0.3 * p.opportunism;
            if mv.has_tag(TAG_SETUP) || mv.setup_effect.is_some() {
                s += 0.3 * p.patience;
            }
            s
        }
        MoveType::Finisher => {
            0.3 + 0.5 * p.aggression + p.opportunism * context.opponent_hp_lost()
        }
    };

    if let Some(bias) = p.signature_bias(&mv.name) {
        score *= bias;
    }

    if context.actor.last_move.as_deref() == Some(mv.name.as_str()) {
        score *= 1.0 - 0.7 * p.anti_repeater;
    }

    if mv.move_type == MoveType::Finisher {
        match context.phase {
            BattlePhase::Opening => score *= 0.5,
            BattlePhase::Resolution => score *= 1.3,
            _ => {}
        }
    }

    match (context.actor.mental_state, mv.move_type) {
        (MentalState::Shaken, MoveType::Defense) => score *= 1.2,
        (MentalState::Broken, MoveType::Offense | MoveType::Finisher) => score *= 1.3,
        _ => {}
    }

    score
}

/// Default `BattleAI`
#[derive(Debug, Clone)]
pub struct AiDecisionEngine {
    min_confidence: f32,
    score_bias_threshold: f32,
    decisions: u32,
    fallbacks: u32,
}

impl Default for AiDecisionEngine {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl AiDecisionEngine {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            score_bias_threshold: config.score_bias_threshold,
            decisions: 0,
            fallbacks: 0,
        }
    }

    pub fn decisions(&self) -> u32 {
        self.decisions
    }

    pub fn fallbacks(&self) -> u32 {
        self.fallbacks
    }

    /// Score and normalize all available moves
    ///
    /// Returns `None` when any score is not finite or the total is zero.
    fn score_moves(&self, context: &DecisionContext) -> Option<(Vec<MoveScore>, Vec<Vec<WeightReason>>)> {
        let personality = context.personality();
        let exponent = 1.0 + 2.0 * personality.predictability;

        let mut scores = Vec::with_capacity(context.available_moves.len());
        let mut reasons = Vec::with_capacity(context.available_moves.len());
        for mv in &context.available_moves {
            let base = base_personality_score(mv, personality, context);
            let weight = weigh_move_with(context.actor, context.opponent, mv, self.score_bias_threshold);
            let score = (base * weight.final_multiplier).max(0.0).powf(exponent);
            if !score.is_finite() {
                return None;
            }
            scores.push(MoveScore {
                move_name: mv.name.clone(),
                base,
                multiplier: weight.final_multiplier,
                score,
                probability: 0.0,
            });
            reasons.push(weight.reasons_applied);
        }

        let total: f32 = scores.iter().map(|s| s.score).sum();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        for s in &mut scores {
            s.probability = s.score / total;
        }
        Some((scores, reasons))
    }

    fn fallback(context: &DecisionContext, cause: FallbackCause, move_scores: Vec<MoveScore>) -> AiDecision {
        let move_name = context
            .available_moves
            .first()
            .map(|m| m.name.clone())
            .unwrap_or_default();
        AiDecision {
            move_name,
            confidence: FALLBACK_CONFIDENCE,
            reasoning: DecisionReasoning::Fallback { cause },
            move_scores,
            fallback: true,
        }
    }

    fn validate(context: &DecisionContext, decision: &AiDecision) -> Result<(), ErrorCause> {
        let fighter_id = context.actor.id.clone();
        if !context.actor.has_move(&decision.move_name) {
            return Err(ErrorCause::DecisionValidation {
                fighter_id,
                reason: format!("move '{}' is not in the moveset", decision.move_name),
            });
        }
        if !(0.0..=1.0).contains(&decision.confidence) {
            return Err(ErrorCause::DecisionValidation {
                fighter_id,
                reason: format!("confidence {} outside [0, 1]", decision.confidence),
            });
        }
        Ok(())
    }
}

impl BattleAI for AiDecisionEngine {
    fn decide(
        &mut self,
        context: &DecisionContext,
        rng: &mut BattleRng,
    ) -> Result<AiDecision, ErrorCause> {
        let started = Instant::now();
        self.decisions += 1;

        let scored = self.score_moves(context);

        // One selection draw per decision, whatever the outcome, so replays
        // consume the log in step.
        let roll = rng.unit(DrawPurpose::MoveSelection)? as f32;

        // The clock cannot be replayed; a replaying rng hands back the
        // recorded fallback flag instead.
        let timed_out = match rng.next_recorded_fallback() {
            Some(recorded) => recorded,
            None => context
                .options
                .time_limit
                .is_some_and(|limit| started.elapsed() > limit),
        };

        let decision = match scored {
            None => Self::fallback(context, FallbackCause::ScoringFailed, Vec::new()),
            Some((scores, _)) if timed_out => Self::fallback(context, FallbackCause::TimeLimit, scores),
            Some((scores, reasons)) => {
                let mut chosen = scores.len() - 1;
                let mut cumulative = 0.0;
                for (i, s) in scores.iter().enumerate() {
                    cumulative += s.probability;
                    if roll < cumulative {
                        chosen = i;
                        break;
                    }
                }

                let max_p = scores.iter().map(|s| s.probability).fold(0.0, f32::max);
                let confidence = if max_p > 0.0 {
                    (scores[chosen].probability / max_p).clamp(0.0, 1.0)
                } else {
                    0.0
                };

                if context.options.debug {
                    for s in &scores {
                        tracing::debug!(
                            "{} scores {}: base {:.3} x{:.3} -> p={:.3}",
                            context.actor.id,
                            s.move_name,
                            s.base,
                            s.multiplier,
                            s.probability
                        );
                    }
                }

                if confidence < self.min_confidence {
                    Self::fallback(context, FallbackCause::LowConfidence, scores)
                } else {
                    AiDecision {
                        move_name: scores[chosen].move_name.clone(),
                        confidence,
                        reasoning: DecisionReasoning::Weighted {
                            reasons: reasons[chosen].clone(),
                        },
                        move_scores: scores,
                        fallback: false,
                    }
                }
            }
        };

        let decision = match Self::validate(context, &decision) {
            Ok(()) => decision,
            Err(err) if !decision.fallback => {
                tracing::warn!("{}: {}; using fallback", context.actor.id, err);
                let fallback =
                    Self::fallback(context, FallbackCause::InvalidDecision, decision.move_scores);
                Self::validate(context, &fallback)?;
                fallback
            }
            Err(err) => return Err(err),
        };

        if decision.fallback {
            self.fallbacks += 1;
            tracing::warn!(
                "Turn {}: {} fell back to {} ({:?})",
                context.turn,
                context.actor.id,
                decision.move_name,
                decision.reasoning
            );
        }

        Ok(decision)
    }

    fn name(&self) -> &str {
        "personality_weighted"
    }
}
