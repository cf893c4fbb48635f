//! Fighter AI for duel decision-making
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines interface for swappable implementations
//! - PersonalityProfile holds TOML-loaded tendencies and signature biases
//! - DecisionContext provides the actor's borrowed view of the battle
//! - weighting adds escalation bias on top of personality scores

pub mod decision_context;
pub mod decision_engine;
pub mod personality;
pub mod weighting;

pub use decision_context::{compute_battle_phase, DecisionContext, DecisionOptions};
pub use decision_engine::{AiDecision, AiDecisionEngine, DecisionReasoning, FallbackCause, MoveScore};
pub use personality::{BiasOverrides, EscalationBehavior, PersonalityProfile};
pub use weighting::{weigh_move, weigh_move_with, MoveWeight, WeightReason};

use crate::battle::rng::BattleRng;
use crate::core::error::ErrorCause;

/// Trait for battle AI implementations
pub trait BattleAI {
    /// Choose a move for the context's actor
    ///
    /// All randomness goes through `rng` so the choice can be replayed.
    fn decide(
        &mut self,
        context: &DecisionContext,
        rng: &mut BattleRng,
    ) -> Result<AiDecision, ErrorCause>;

    /// Short identifier for logs
    fn name(&self) -> &str;
}
