//! Move resolution
//!
//! Applies one chosen move to the working state: costs, hit/crit/variance
//! draws, damage, setup effects, incapacitation and momentum. Every random
//! value comes from `BattleRng` so the outcome is replayable.

use crate::battle::constants::{
    CRIT_MULTIPLIER, CRIT_SCORE_BONUS, DAMAGE_VARIANCE_MIN, DAMAGE_VARIANCE_SPAN,
    DEFAULT_GUARD_REDUCTION, MOMENTUM_MISS_PENALTY, MOMENTUM_PER_DAMAGE, STUN_SCORE_BONUS,
    UNOPENED_ACCURACY_FACTOR,
};
use crate::battle::escalation::EscalationState;
use crate::battle::events::{BattleEventLog, BattleEventType, Effectiveness};
use crate::battle::moves::{Move, MoveType, SetupEffect, TAG_REQUIRES_OPENING};
use crate::battle::rng::{BattleRng, DrawPurpose};
use crate::battle::state::BattleState;
use crate::core::config::SimulationConfig;
use crate::core::error::ErrorCause;
use crate::core::types::Slot;

/// Result of executing one move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResult {
    pub move_name: String,
    pub effectiveness: Effectiveness,
    /// HP actually removed from the target
    pub damage: f32,
    pub critical: bool,
    /// The move put the user into focus this turn
    pub set_focus: bool,
}

/// Whether the move acts on the opponent (and so rolls to hit)
fn targets_opponent(mv: &Move) -> bool {
    mv.move_type.is_damaging() || matches!(mv.setup_effect, Some(SetupEffect::Disable { .. }))
}

/// Execute `move_name` for the fighter in `actor` against the other slot
pub fn execute_move(
    state: &mut BattleState,
    actor: Slot,
    move_name: &str,
    config: &SimulationConfig,
    rng: &mut BattleRng,
    events: &mut BattleEventLog,
) -> Result<MoveResult, ErrorCause> {
    let turn = state.turn;
    let thresholds = config.escalation;
    let (attacker, defender) = state.pair_mut(actor);

    let mv = attacker
        .find_move(move_name)
        .cloned()
        .ok_or_else(|| ErrorCause::DecisionValidation {
            fighter_id: attacker.id.clone(),
            reason: format!("move '{}' is not in the moveset", move_name),
        })?;

    attacker.spend_energy(mv.energy_cost);
    attacker.start_cooldown(&mv.name, mv.cooldown);
    attacker.last_move = Some(mv.name.clone());

    let mut result = MoveResult {
        move_name: mv.name.clone(),
        effectiveness: Effectiveness::Normal,
        damage: 0.0,
        critical: false,
        set_focus: false,
    };

    // Self-targeted effects
    match mv.setup_effect {
        Some(SetupEffect::Focus { multiplier }) => {
            attacker.focus = Some(multiplier);
            result.set_focus = true;
        }
        Some(SetupEffect::Guard { reduction }) => attacker.guard = Some(reduction.clamp(0.0, 1.0)),
        Some(SetupEffect::Recover { energy }) => attacker.restore_energy(energy),
        None if mv.move_type == MoveType::Defense => attacker.guard = Some(DEFAULT_GUARD_REDUCTION),
        Some(SetupEffect::Disable { .. }) | None => {}
    }

    if targets_opponent(&mv) {
        let mut accuracy = mv.accuracy;
        if mv.has_tag(TAG_REQUIRES_OPENING) && defender.escalation_state == EscalationState::Normal {
            accuracy *= UNOPENED_ACCURACY_FACTOR;
        }

        if !rng.chance(DrawPurpose::HitRoll, accuracy as f64)? {
            attacker.adjust_momentum(-MOMENTUM_MISS_PENALTY);
            result.effectiveness = Effectiveness::Miss;
        } else {
            let mut gained = 0.0;

            if mv.move_type.is_damaging() {
                let critical = rng.chance(DrawPurpose::CritRoll, config.crit_chance as f64)?;
                let variance = rng.range(
                    DrawPurpose::DamageRoll,
                    DAMAGE_VARIANCE_MIN as f64,
                    (DAMAGE_VARIANCE_MIN + DAMAGE_VARIANCE_SPAN) as f64,
                )? as f32;

                let element = if mv.element.is_bending() {
                    mv.element
                } else {
                    attacker.element
                };
                let element_mult = element.multiplier_against(defender.element);
                let momentum_mult = 1.0 + attacker.momentum / 200.0;
                let focus_mult = attacker.focus.take().unwrap_or(1.0);
                let crit_mult = if critical { CRIT_MULTIPLIER } else { 1.0 };
                let guard_mult = 1.0 - defender.guard.unwrap_or(0.0);

                let raw = mv.power
                    * config.damage_scale
                    * element_mult
                    * momentum_mult
                    * variance
                    * focus_mult
                    * crit_mult
                    * guard_mult;
                let raw = if raw.is_finite() { raw.max(0.0) } else { 0.0 };

                let lost = defender.take_damage(raw);
                attacker.adjust_momentum(MOMENTUM_PER_DAMAGE * lost);
                defender.adjust_momentum(-MOMENTUM_PER_DAMAGE * lost);

                gained += raw / config.damage_per_score_point;
                if critical {
                    gained += CRIT_SCORE_BONUS;
                }

                result.damage = lost;
                result.critical = critical;
                result.effectiveness = if critical {
                    Effectiveness::Critical
                } else if element_mult > 1.0 {
                    Effectiveness::Strong
                } else if element_mult < 1.0 {
                    Effectiveness::Weak
                } else {
                    Effectiveness::Normal
                };
            }

            if let Some(SetupEffect::Disable { turns }) = mv.setup_effect {
                if turns > 0 {
                    defender.stun_duration += turns;
                    gained += STUN_SCORE_BONUS;
                }
            }

            defender.add_incapacitation(gained, &thresholds);
            if defender.hp <= 0.0 {
                defender.raise_incapacitation_to(thresholds.terminal_collapse, &thresholds);
            }
        }
    }

    let target_id = defender.id.clone();
    let target_hp = defender.hp;
    let actor_id = attacker.id.clone();

    events.push(
        BattleEventType::MoveAction {
            actor: actor_id,
            target: target_id.clone(),
            move_name: mv.name.clone(),
            move_type: mv.move_type,
            effectiveness: result.effectiveness,
            damage: result.damage,
            target_hp,
        },
        turn,
    );

    if result.effectiveness != Effectiveness::Miss && mv.is_environmental() {
        let impact = state.environment.record_impact(&mv);
        events.push(
            BattleEventType::EnvironmentImpact {
                move_name: mv.name.clone(),
                level: impact.level,
                damage_level: state.environment.damage_level,
                narrative_trigger: impact.triggers_narrative,
            },
            turn,
        );
    }

    tracing::debug!(
        "Turn {}: {} -> {} ({:?}, {:.1} dmg, target hp {:.1})",
        turn,
        mv.name,
        target_id,
        result.effectiveness,
        result.damage,
        target_hp
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::environment::Location;
    use crate::battle::fighter::Fighter;
    use crate::battle::moves::{Element, TAG_ENVIRONMENTAL};
    use crate::battle::rng::RandomDraw;

    fn test_state() -> BattleState {
        let katara = Fighter::new("katara", "Katara", Element::Water).with_moves(vec![
            Move::new("Water Whip", MoveType::Offense, 40.0).with_element(Element::Water),
            Move::new("Ice Shield", MoveType::Defense, 0.0),
            Move::new("Bloodbending", MoveType::Utility, 0.0)
                .with_setup(SetupEffect::Disable { turns: 2 })
                .with_cost(30.0)
                .with_cooldown(3),
            Move::new("Tidal Wave", MoveType::Finisher, 80.0).with_tag(TAG_ENVIRONMENTAL),
            Move::new("Focus", MoveType::Utility, 0.0).with_setup(SetupEffect::Focus { multiplier: 2.0 }),
        ]);
        let zuko = Fighter::new("zuko", "Zuko", Element::Fire)
            .with_moves(vec![Move::new("Fire Fist", MoveType::Offense, 30.0)]);
        BattleState::new([katara, zuko], &Location::new("north_pole", &[]), 2)
    }

    fn scripted(draws: &[(DrawPurpose, f64)]) -> BattleRng {
        BattleRng::replaying(
            0,
            draws
                .iter()
                .map(|&(purpose, value)| RandomDraw { purpose, value })
                .collect(),
        )
    }

    #[test]
    fn test_strong_hit_damage_formula() {
        let mut state = test_state();
        let config = SimulationConfig::default();
        // hit, no crit, variance exactly 1.0
        let mut rng = scripted(&[
            (DrawPurpose::HitRoll, 0.0),
            (DrawPurpose::CritRoll, 0.99),
            (DrawPurpose::DamageRoll, 0.5),
        ]);
        let mut events = BattleEventLog::new();
        let result =
            execute_move(&mut state, Slot::First, "Water Whip", &config, &mut rng, &mut events).unwrap();

        // 40 * 0.25 * 1.5 (water > fire)
        assert!((result.damage - 15.0).abs() < 1e-3);
        assert_eq!(result.effectiveness, Effectiveness::Strong);
        assert!((state.fighters[1].hp - 85.0).abs() < 1e-3);
        assert!((state.fighters[1].incapacitation_score - 15.0 / 8.0).abs() < 1e-3);
        assert!((state.fighters[0].momentum - 12.0).abs() < 1e-3);
        assert!((state.fighters[1].momentum + 12.0).abs() < 1e-3);
        assert_eq!(state.fighters[0].last_move.as_deref(), Some("Water Whip"));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_miss_costs_momentum() {
        let mut state = test_state();
        let mut rng = scripted(&[(DrawPurpose::HitRoll, 0.95)]);
        let mut events = BattleEventLog::new();
        let result = execute_move(
            &mut state,
            Slot::First,
            "Water Whip",
            &SimulationConfig::default(),
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert_eq!(result.effectiveness, Effectiveness::Miss);
        assert_eq!(state.fighters[0].momentum, -5.0);
        assert_eq!(state.fighters[1].hp, 100.0);
    }

    #[test]
    fn test_defense_guards_without_draws() {
        let mut state = test_state();
        let mut rng = BattleRng::seeded(1);
        let mut events = BattleEventLog::new();
        execute_move(
            &mut state,
            Slot::First,
            "Ice Shield",
            &SimulationConfig::default(),
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert_eq!(state.fighters[0].guard, Some(DEFAULT_GUARD_REDUCTION));
        assert!(rng.take_recorded().is_empty());
    }

    #[test]
    fn test_disable_stuns_and_pays_costs() {
        let mut state = test_state();
        let mut rng = scripted(&[(DrawPurpose::HitRoll, 0.1)]);
        let mut events = BattleEventLog::new();
        execute_move(
            &mut state,
            Slot::First,
            "Bloodbending",
            &SimulationConfig::default(),
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert_eq!(state.fighters[1].stun_duration, 2);
        assert_eq!(state.fighters[1].incapacitation_score, STUN_SCORE_BONUS);
        assert_eq!(state.fighters[0].energy, 70.0);
        assert_eq!(state.fighters[0].cooldowns.get("Bloodbending"), Some(&3));
    }

    #[test]
    fn test_focus_and_crit_multiply() {
        let mut state = test_state();
        let config = SimulationConfig::default();
        let mut events = BattleEventLog::new();
        let mut rng = BattleRng::seeded(1);
        let focus = execute_move(&mut state, Slot::First, "Focus", &config, &mut rng, &mut events).unwrap();
        assert!(focus.set_focus);

        let mut rng = scripted(&[
            (DrawPurpose::HitRoll, 0.0),
            (DrawPurpose::CritRoll, 0.0),
            (DrawPurpose::DamageRoll, 0.5),
        ]);
        let result =
            execute_move(&mut state, Slot::First, "Water Whip", &config, &mut rng, &mut events).unwrap();
        // 15 * focus 2.0 * crit 1.5
        assert!((result.damage - 45.0).abs() < 1e-3);
        assert_eq!(result.effectiveness, Effectiveness::Critical);
        assert!(state.fighters[0].focus.is_none());
    }

    #[test]
    fn test_guard_reduces_incoming_damage() {
        let mut state = test_state();
        state.fighters[1].guard = Some(0.5);
        let mut rng = scripted(&[
            (DrawPurpose::HitRoll, 0.0),
            (DrawPurpose::CritRoll, 0.99),
            (DrawPurpose::DamageRoll, 0.5),
        ]);
        let mut events = BattleEventLog::new();
        let result = execute_move(
            &mut state,
            Slot::First,
            "Water Whip",
            &SimulationConfig::default(),
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert!((result.damage - 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_knockout_raises_score_to_terminal() {
        let mut state = test_state();
        state.fighters[1].hp = 5.0;
        let mut rng = scripted(&[
            (DrawPurpose::HitRoll, 0.0),
            (DrawPurpose::CritRoll, 0.99),
            (DrawPurpose::DamageRoll, 0.5),
        ]);
        let mut events = BattleEventLog::new();
        let config = SimulationConfig::default();
        execute_move(&mut state, Slot::First, "Water Whip", &config, &mut rng, &mut events).unwrap();
        assert_eq!(state.fighters[1].hp, 0.0);
        assert_eq!(state.fighters[1].escalation_state, EscalationState::TerminalCollapse);
    }

    #[test]
    fn test_environmental_move_logs_impact() {
        let mut state = test_state();
        let mut rng = scripted(&[
            (DrawPurpose::HitRoll, 0.0),
            (DrawPurpose::CritRoll, 0.99),
            (DrawPurpose::DamageRoll, 0.5),
        ]);
        let mut events = BattleEventLog::new();
        execute_move(
            &mut state,
            Slot::First,
            "Tidal Wave",
            &SimulationConfig::default(),
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events.events[1].event_type,
            BattleEventType::EnvironmentImpact { .. }
        ));
        assert_eq!(state.environment.damage_level, 8.0);
    }

    #[test]
    fn test_unknown_move_rejected() {
        let mut state = test_state();
        let err = execute_move(
            &mut state,
            Slot::Second,
            "Water Whip",
            &SimulationConfig::default(),
            &mut BattleRng::seeded(1),
            &mut BattleEventLog::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ErrorCause::DecisionValidation { .. }));
    }
}
