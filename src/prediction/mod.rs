//! Pre-battle prediction
//!
//! Estimates who wins a matchup from encyclopedia traits alone (tier,
//! terrain strengths and weaknesses, role, style), then classifies how the
//! win plays out and the tone the narrative should take.

pub mod victory;
pub mod win_probability;

pub use victory::{classify_tone, classify_victory, ResolutionTone, VictoryType};
pub use win_probability::{
    base_modifiers, calculate_win_probability, tier_contribution, OutcomeReason, WinPrediction,
};
