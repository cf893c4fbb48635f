//! End-of-turn invariant validation
//!
//! Critical violations abort the battle; error and warning severities are
//! reported back to the turn processor, which logs them and carries on.

use serde::{Deserialize, Serialize};

use crate::battle::escalation::EscalationThresholds;
use crate::battle::state::BattleState;
use crate::core::types::FighterId;

/// Stun durations above this are suspicious but legal
pub const STUN_WARNING_TURNS: u32 = 5;
/// Environment damage above this is reported once per turn
pub const ENVIRONMENT_DAMAGE_WARNING: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    HpOutOfRange,
    MaxHpOutOfRange,
    EnergyOutOfRange,
    MomentumOutOfRange,
    EscalationMismatch,
    ScoreDecreased,
    PhaseRegressed,
    TurnNotAdvanced,
    LongStun,
    EnvironmentSaturated,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::HpOutOfRange
            | ViolationKind::MaxHpOutOfRange
            | ViolationKind::EnergyOutOfRange
            | ViolationKind::EscalationMismatch
            | ViolationKind::ScoreDecreased
            | ViolationKind::PhaseRegressed
            | ViolationKind::TurnNotAdvanced => Severity::Critical,
            ViolationKind::MomentumOutOfRange => Severity::Error,
            ViolationKind::LongStun | ViolationKind::EnvironmentSaturated => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub fighter_id: Option<FighterId>,
    pub value: f32,
}

impl Violation {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvariantReport {
    pub violations: Vec<Violation>,
}

impl InvariantReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn critical(&self) -> Vec<Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity() == Severity::Critical)
            .cloned()
            .collect()
    }

    pub fn non_fatal(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity() != Severity::Critical)
    }

    fn push(&mut self, kind: ViolationKind, fighter_id: Option<&str>, value: f32) {
        self.violations.push(Violation {
            kind,
            fighter_id: fighter_id.map(str::to_string),
            value,
        });
    }
}

/// Check `state` at end of turn against the committed `previous` state
pub fn validate_invariants(
    state: &BattleState,
    previous: &BattleState,
    thresholds: &EscalationThresholds,
) -> InvariantReport {
    let mut report = InvariantReport::default();

    for (fighter, before) in state.fighters.iter().zip(previous.fighters.iter()) {
        let id = Some(fighter.id.as_str());

        if !(fighter.max_hp > 0.0 && fighter.max_hp <= 100.0) {
            report.push(ViolationKind::MaxHpOutOfRange, id, fighter.max_hp);
        }
        if !(fighter.hp >= 0.0 && fighter.hp <= fighter.max_hp) {
            report.push(ViolationKind::HpOutOfRange, id, fighter.hp);
        }
        if !(fighter.energy >= 0.0 && fighter.energy <= fighter.max_energy) {
            report.push(ViolationKind::EnergyOutOfRange, id, fighter.energy);
        }
        if !(fighter.momentum >= -100.0 && fighter.momentum <= 100.0) {
            report.push(ViolationKind::MomentumOutOfRange, id, fighter.momentum);
        }
        if thresholds.classify(fighter.incapacitation_score) != fighter.escalation_state {
            report.push(
                ViolationKind::EscalationMismatch,
                id,
                fighter.incapacitation_score,
            );
        }
        if fighter.incapacitation_score < before.incapacitation_score {
            report.push(ViolationKind::ScoreDecreased, id, fighter.incapacitation_score);
        }
        if fighter.stun_duration > STUN_WARNING_TURNS {
            report.push(ViolationKind::LongStun, id, fighter.stun_duration as f32);
        }
    }

    if state.phase.current_phase < previous.phase.current_phase {
        report.push(ViolationKind::PhaseRegressed, None, state.turn as f32);
    }
    if state.turn != previous.turn + 1 {
        report.push(ViolationKind::TurnNotAdvanced, None, state.turn as f32);
    }
    if state.environment.damage_level > ENVIRONMENT_DAMAGE_WARNING {
        report.push(
            ViolationKind::EnvironmentSaturated,
            None,
            state.environment.damage_level,
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::environment::Location;
    use crate::battle::fighter::Fighter;
    use crate::battle::moves::{Element, Move, MoveType};
    use crate::battle::phase::BattlePhase;

    fn states() -> (BattleState, BattleState) {
        let moves = vec![Move::new("Strike", MoveType::Offense, 20.0)];
        let a = Fighter::new("a", "A", Element::Earth).with_moves(moves.clone());
        let b = Fighter::new("b", "B", Element::Air).with_moves(moves);
        let previous = BattleState::new([a, b], &Location::new("arena", &[]), 3);
        let mut next = previous.clone();
        next.turn = 1;
        (previous, next)
    }

    #[test]
    fn test_clean_turn() {
        let (previous, next) = states();
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        assert!(report.is_clean());
    }

    #[test]
    fn test_hp_above_max_is_critical() {
        let (previous, mut next) = states();
        next.fighters[0].hp = 140.0;
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        let critical = report.critical();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].kind, ViolationKind::HpOutOfRange);
        assert_eq!(critical[0].fighter_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_momentum_is_error_not_critical() {
        let (previous, mut next) = states();
        next.fighters[1].momentum = 130.0;
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        assert!(report.critical().is_empty());
        assert_eq!(report.non_fatal().count(), 1);
    }

    #[test]
    fn test_escalation_set_independently_is_critical() {
        let (previous, mut next) = states();
        next.fighters[0].escalation_state = crate::battle::escalation::EscalationState::Pressured;
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        assert_eq!(report.critical()[0].kind, ViolationKind::EscalationMismatch);
    }

    #[test]
    fn test_phase_regression_is_critical() {
        let (mut previous, next) = states();
        previous.phase.current_phase = BattlePhase::Climax;
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        assert!(report
            .critical()
            .iter()
            .any(|v| v.kind == ViolationKind::PhaseRegressed));
    }

    #[test]
    fn test_long_stun_is_warning() {
        let (previous, mut next) = states();
        next.fighters[1].stun_duration = 9;
        let report = validate_invariants(&next, &previous, &EscalationThresholds::default());
        let warnings: Vec<_> = report.non_fatal().collect();
        assert_eq!(warnings[0].severity(), Severity::Warning);
    }
}
