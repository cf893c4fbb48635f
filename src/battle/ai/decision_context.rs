//! AI's view of the battle for one decision
//!
//! Borrowed from the working state for the duration of a single `decide`
//! call. Holds the moves the actor can actually use this turn and the phase
//! hint computed from turn number and HP.

use std::time::Duration;

use crate::battle::ai::personality::PersonalityProfile;
use crate::battle::environment::EnvironmentState;
use crate::battle::fighter::Fighter;
use crate::battle::moves::Move;
use crate::battle::phase::{BattlePhase, PhaseThresholds};
use crate::battle::state::BattleState;
use crate::core::error::ErrorCause;
use crate::core::types::{Slot, Turn};

/// Per-decision knobs supplied by the host
#[derive(Debug, Clone, Default)]
pub struct DecisionOptions {
    /// Emit per-move scores at debug level
    pub debug: bool,
    /// Scoring budget; exceeding it forces the fallback decision
    pub time_limit: Option<Duration>,
    /// Replaces the actor's own profile for this decision
    pub personality_override: Option<PersonalityProfile>,
}

/// AI's decision-making context
pub struct DecisionContext<'a> {
    pub actor: &'a Fighter,
    pub opponent: &'a Fighter,
    pub state: &'a BattleState,
    pub available_moves: Vec<&'a Move>,
    pub turn: Turn,
    pub phase: BattlePhase,
    pub environment: &'a EnvironmentState,
    pub options: DecisionOptions,
}

impl<'a> DecisionContext<'a> {
    /// Build the context for the fighter in `actor_slot`
    ///
    /// Fails with `NoAvailableMoves` when nothing is affordable and off
    /// cooldown; the caller treats that as fatal for the turn.
    pub fn build(
        state: &'a BattleState,
        actor_slot: Slot,
        turn: Turn,
        thresholds: &PhaseThresholds,
        options: DecisionOptions,
    ) -> Result<Self, ErrorCause> {
        let actor = state.fighter(actor_slot);
        let opponent = state.fighter(actor_slot.other());

        let available_moves = actor.available_moves();
        if available_moves.is_empty() {
            return Err(ErrorCause::NoAvailableMoves {
                fighter_id: actor.id.clone(),
            });
        }

        let phase = compute_battle_phase(turn, actor.hp_ratio(), opponent.hp_ratio(), thresholds);

        Ok(Self {
            actor,
            opponent,
            state,
            available_moves,
            turn,
            phase,
            environment: &state.environment,
            options,
        })
    }

    /// Profile in force for this decision
    pub fn personality(&self) -> &PersonalityProfile {
        self.options
            .personality_override
            .as_ref()
            .unwrap_or(&self.actor.personality)
    }

    pub fn is_available(&self, move_name: &str) -> bool {
        self.available_moves.iter().any(|m| m.name == move_name)
    }

    /// Fraction of HP the opponent has lost
    pub fn opponent_hp_lost(&self) -> f32 {
        1.0 - self.opponent.hp_ratio()
    }
}

/// Phase hint from turn number and HP ratios
///
/// Lower HP ratios pull the phase forward; the turn thresholds are the
/// latest point each phase is reached.
pub fn compute_battle_phase(
    turn: Turn,
    hp_ratio_a: f32,
    hp_ratio_b: f32,
    thresholds: &PhaseThresholds,
) -> BattlePhase {
    let lowest = hp_ratio_a.min(hp_ratio_b);

    if lowest < 0.25 || turn >= thresholds.resolution_turn {
        BattlePhase::Resolution
    } else if lowest < 0.5 || turn >= thresholds.climax_turn {
        BattlePhase::Climax
    } else if turn > thresholds.opening_turn_limit {
        BattlePhase::Escalation
    } else {
        BattlePhase::Opening
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::environment::Location;
    use crate::battle::moves::{Element, MoveType};

    fn test_state() -> BattleState {
        let a = Fighter::new("sokka", "Sokka", Element::Nonbending).with_moves(vec![
            Move::new("Boomerang", MoveType::Offense, 25.0),
            Move::new("Space Sword", MoveType::Finisher, 70.0).with_cost(40.0),
        ]);
        let b = Fighter::new("azula", "Azula", Element::Fire)
            .with_moves(vec![Move::new("Fire Jab", MoveType::Offense, 30.0)]);
        BattleState::new([a, b], &Location::new("boiling_rock", &[]), 5)
    }

    #[test]
    fn test_build_filters_unaffordable_moves() {
        let mut state = test_state();
        state.fighters[0].energy = 10.0;
        let ctx = DecisionContext::build(
            &state,
            Slot::First,
            1,
            &PhaseThresholds::default(),
            DecisionOptions::default(),
        )
        .unwrap();
        assert_eq!(ctx.actor.id, "sokka");
        assert_eq!(ctx.opponent.id, "azula");
        assert_eq!(ctx.available_moves.len(), 1);
        assert!(ctx.is_available("Boomerang"));
        assert!(!ctx.is_available("Space Sword"));
    }

    #[test]
    fn test_build_without_moves_fails() {
        let mut state = test_state();
        state.fighters[1].start_cooldown("Fire Jab", 1);
        let result = DecisionContext::build(
            &state,
            Slot::Second,
            2,
            &PhaseThresholds::default(),
            DecisionOptions::default(),
        );
        assert!(matches!(
            result,
            Err(ErrorCause::NoAvailableMoves { fighter_id }) if fighter_id == "azula"
        ));
    }

    #[test]
    fn test_personality_override() {
        let state = test_state();
        let mut profile = PersonalityProfile::default();
        profile.aggression = 1.0;
        let options = DecisionOptions {
            personality_override: Some(profile),
            ..Default::default()
        };
        let ctx =
            DecisionContext::build(&state, Slot::First, 1, &PhaseThresholds::default(), options)
                .unwrap();
        assert_eq!(ctx.personality().aggression, 1.0);
    }

    #[test]
    fn test_phase_hint_by_turn() {
        let t = PhaseThresholds::default();
        assert_eq!(compute_battle_phase(1, 1.0, 1.0, &t), BattlePhase::Opening);
        assert_eq!(compute_battle_phase(3, 1.0, 1.0, &t), BattlePhase::Opening);
        assert_eq!(compute_battle_phase(4, 1.0, 1.0, &t), BattlePhase::Escalation);
        assert_eq!(compute_battle_phase(12, 1.0, 1.0, &t), BattlePhase::Climax);
        assert_eq!(compute_battle_phase(25, 1.0, 1.0, &t), BattlePhase::Resolution);
    }

    #[test]
    fn test_phase_hint_by_hp() {
        let t = PhaseThresholds::default();
        assert_eq!(compute_battle_phase(1, 0.45, 1.0, &t), BattlePhase::Climax);
        assert_eq!(compute_battle_phase(1, 1.0, 0.2, &t), BattlePhase::Resolution);
    }
}
