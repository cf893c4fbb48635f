//! Battle event log - the hand-off contract to the narrative layer
//!
//! Events carry classifications and numbers only. Each serializes with a
//! `type` tag (`move_action`, `phase_transition`, ...) next to its turn.

use serde::{Deserialize, Serialize};

use crate::battle::curbstomp::CurbstompOutcome;
use crate::battle::environment::ImpactLevel;
use crate::battle::escalation::EscalationState;
use crate::battle::execution::Termination;
use crate::battle::fighter::MentalState;
use crate::battle::invariants::{Severity, Violation};
use crate::battle::moves::MoveType;
use crate::battle::phase::BattlePhase;
use crate::battle::rng::DrawPurpose;
use crate::core::error::ErrorCause;
use crate::core::types::{FighterId, LocationId, Turn};

/// How well a move landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effectiveness {
    Miss,
    Weak,
    Normal,
    Strong,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub turn: Turn,
    #[serde(flatten)]
    pub event_type: BattleEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEventType {
    BattleStarted {
        fighter_ids: [FighterId; 2],
        location_id: LocationId,
        seed: u64,
    },
    MoveAction {
        actor: FighterId,
        target: FighterId,
        move_name: String,
        move_type: MoveType,
        effectiveness: Effectiveness,
        damage: f32,
        target_hp: f32,
    },
    Stunned {
        actor: FighterId,
        remaining: u32,
    },
    EscalationChange {
        fighter_id: FighterId,
        from: EscalationState,
        to: EscalationState,
        score: f32,
    },
    MentalStateChange {
        fighter_id: FighterId,
        from: MentalState,
        to: MentalState,
    },
    PhaseTransition {
        from: BattlePhase,
        to: BattlePhase,
    },
    Curbstomp {
        rule_id: String,
        actor: FighterId,
        target: FighterId,
        outcome: CurbstompOutcome,
    },
    EnvironmentImpact {
        move_name: String,
        level: ImpactLevel,
        damage_level: f32,
        narrative_trigger: bool,
    },
    /// Input event: the move an AI committed to
    AiChoice {
        actor: FighterId,
        move_name: String,
        confidence: f32,
        fallback: bool,
    },
    /// Input event: one random draw, in draw order
    RandomDraw {
        purpose: DrawPurpose,
        value: f64,
    },
    InvariantWarning {
        severity: Severity,
        violation: Violation,
    },
    Error {
        cause: ErrorCause,
    },
    Conclusion {
        winner_id: Option<FighterId>,
        loser_id: Option<FighterId>,
        termination: Termination,
    },
}

impl BattleEventType {
    /// Input events drive replay rather than narrative
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            BattleEventType::AiChoice { .. } | BattleEventType::RandomDraw { .. }
        )
    }
}

/// Log of events from a single turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, turn: Turn) {
        self.events.push(BattleEvent { turn, event_type });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }
}
