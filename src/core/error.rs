use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::events::BattleEvent;
use crate::battle::invariants::Violation;
use crate::core::types::{FighterId, Turn};

/// Serializable cause of a fatal battle error
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorCause {
    #[error("invalid input for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("fighter {fighter_id} has no available moves")]
    NoAvailableMoves { fighter_id: FighterId },

    #[error("invalid decision for {fighter_id}: {reason}")]
    DecisionValidation { fighter_id: FighterId, reason: String },

    #[error("critical invariant violated: {violations:?}")]
    InvariantViolation { violations: Vec<Violation> },

    #[error("replay diverged: {reason}")]
    ReplayDivergence { reason: String },
}

impl ErrorCause {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A fatal error surfaced by the battle loop
///
/// Carries the turn it happened on and the committed event log up to and
/// including the `error` event.
#[derive(Error, Debug, Clone)]
#[error("battle aborted on turn {turn}: {cause}")]
pub struct BattleError {
    pub turn: Turn,
    pub cause: ErrorCause,
    pub events: Vec<BattleEvent>,
}

impl BattleError {
    pub fn new(turn: Turn, cause: ErrorCause) -> Self {
        Self {
            turn,
            cause,
            events: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error("Unknown fighter: {0}")]
    UnknownFighter(FighterId),

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_serializes_with_kind_tag() {
        let cause = ErrorCause::NoAvailableMoves {
            fighter_id: "zuko".into(),
        };
        let json = serde_json::to_value(&cause).unwrap();
        assert_eq!(json["kind"], "no_available_moves");
        assert_eq!(json["fighter_id"], "zuko");
    }

    #[test]
    fn test_battle_error_display_includes_turn() {
        let err = BattleError::new(7, ErrorCause::validation("hp", "out of range"));
        let text = err.to_string();
        assert!(text.contains("turn 7"));
        assert!(text.contains("hp"));
    }
}
