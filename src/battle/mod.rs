//! Battle system - turn-based duels between two data-defined fighters
//!
//! Fighters alternate strictly by turn parity. Damage raises an
//! incapacitation score that drives each fighter's escalation state; the AI
//! leans harder into finishers as the opponent escalates, and the battle
//! moves through four narrative phases until someone is downed.
//!
//! The engine produces mechanical events only. Prose is somebody else's job.

pub mod ai;
pub mod constants;
pub mod curbstomp;
pub mod environment;
pub mod escalation;
pub mod events;
pub mod execution;
pub mod fighter;
pub mod invariants;
pub mod moves;
pub mod phase;
pub mod resolution;
pub mod rng;
pub mod state;
pub mod turn;

// Re-exports for convenient access
pub use ai::{AiDecision, AiDecisionEngine, BattleAI, DecisionContext, PersonalityProfile};
pub use constants::*;
pub use curbstomp::{CurbstompOutcome, CurbstompRule, RuleCondition, RuleTable, Subject};
pub use environment::{EnvironmentState, ImpactLevel, Location};
pub use escalation::{EscalationState, EscalationThresholds};
pub use events::{BattleEvent, BattleEventLog, BattleEventType, Effectiveness};
pub use execution::{
    check_battle_termination, replay_battle, simulate_battle, BattleResult, BudgetKind,
    Termination,
};
pub use fighter::{CharacterTraits, Fighter, MentalState};
pub use invariants::{validate_invariants, InvariantReport, Severity, Violation, ViolationKind};
pub use moves::{Element, Move, MoveType, SetupEffect};
pub use phase::{BattlePhase, PhaseManager, PhaseState, PhaseThresholds};
pub use resolution::{execute_move, MoveResult};
pub use rng::{BattleRng, DrawPurpose, RandomDraw};
pub use state::{BattleMetadata, BattleState};
pub use turn::{TurnOutcome, TurnProcessor};
