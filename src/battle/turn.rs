//! Turn processor
//!
//! One turn, strictly sequential:
//! pre-turn effects -> curbstomp rules -> decide and execute -> post-turn
//! effects -> escalation/mental recompute -> phase check -> invariants ->
//! input events.
//!
//! All work happens on a clone of the committed state. Any error aborts the
//! turn and the committed state is left exactly as it was.

use crate::battle::ai::decision_context::{DecisionContext, DecisionOptions};
use crate::battle::ai::BattleAI;
use crate::battle::constants::MOMENTUM_DECAY;
use crate::battle::curbstomp::{apply_outcome, evaluate_rules, CurbstompOutcome, RuleTable};
use crate::battle::environment::Location;
use crate::battle::escalation::EscalationState;
use crate::battle::events::{BattleEvent, BattleEventLog, BattleEventType};
use crate::battle::invariants::validate_invariants;
use crate::battle::phase::PhaseManager;
use crate::battle::resolution::execute_move;
use crate::battle::rng::BattleRng;
use crate::battle::state::BattleState;
use crate::core::config::SimulationConfig;
use crate::core::error::{BattleError, ErrorCause};
use crate::core::types::Slot;

/// Committed result of a successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: BattleState,
    /// This turn's events; also appended to `state.battle_log`
    pub events: Vec<BattleEvent>,
}

pub struct TurnProcessor<'a> {
    config: &'a SimulationConfig,
    location: &'a Location,
    rules: &'a RuleTable,
    phase_manager: PhaseManager,
}

impl<'a> TurnProcessor<'a> {
    pub fn new(config: &'a SimulationConfig, location: &'a Location, rules: &'a RuleTable) -> Self {
        Self {
            config,
            location,
            rules,
            phase_manager: PhaseManager::new(config.phase),
        }
    }

    /// Run the next turn on a working copy of `committed`
    pub fn process_turn(
        &self,
        committed: &BattleState,
        agents: &mut [Box<dyn BattleAI>; 2],
        rng: &mut BattleRng,
    ) -> Result<TurnOutcome, BattleError> {
        let mut working = committed.clone();
        working.turn += 1;
        let turn = working.turn;
        let mut events = BattleEventLog::new();

        self.run_steps(committed, &mut working, agents, rng, &mut events)
            .map_err(|cause| BattleError::new(turn, cause))?;

        working.battle_log.extend(events.events.iter().cloned());
        Ok(TurnOutcome {
            state: working,
            events: events.events,
        })
    }

    fn run_steps(
        &self,
        committed: &BattleState,
        working: &mut BattleState,
        agents: &mut [Box<dyn BattleAI>; 2],
        rng: &mut BattleRng,
        events: &mut BattleEventLog,
    ) -> Result<(), ErrorCause> {
        let turn = working.turn;
        let active = Slot::active_on(turn);

        let can_act = self.apply_pre_turn_effects(working, active, events);

        let mut acts = can_act;
        if can_act {
            if let Some(fired) = evaluate_rules(self.rules, working, active, self.location, rng)? {
                apply_outcome(working, active, &fired, self.config);
                if !matches!(fired.outcome, CurbstompOutcome::Incapacitate { .. }) {
                    acts = false;
                }
                events.push(
                    BattleEventType::Curbstomp {
                        rule_id: fired.rule_id,
                        actor: fired.actor,
                        target: fired.target,
                        outcome: fired.outcome,
                    },
                    turn,
                );
            }
        }

        let mut set_focus = false;
        if acts {
            let options = DecisionOptions {
                debug: self.config.debug_decisions,
                time_limit: self.config.decision_time_limit(),
                personality_override: None,
            };
            let decision = {
                let context =
                    DecisionContext::build(working, active, turn, &self.config.phase, options)?;
                agents[active.index()].decide(&context, rng)?
            };

            if decision.fallback {
                working.metadata.fallback_decisions += 1;
            }
            events.push(
                BattleEventType::AiChoice {
                    actor: working.fighter(active).id.clone(),
                    move_name: decision.move_name.clone(),
                    confidence: decision.confidence,
                    fallback: decision.fallback,
                },
                turn,
            );

            let result =
                execute_move(working, active, &decision.move_name, self.config, rng, events)?;
            set_focus = result.set_focus;
        }

        // Post-turn: focus lasts until the user's next action
        let actor = working.fighter_mut(active);
        if !set_focus {
            actor.focus = None;
        }
        actor.momentum *= MOMENTUM_DECAY;

        self.recompute_states(committed, working, events);

        self.phase_manager.check(working, events);

        let report = validate_invariants(working, committed, &self.config.escalation);
        let critical = report.critical();
        if !critical.is_empty() {
            return Err(ErrorCause::InvariantViolation {
                violations: critical,
            });
        }
        for violation in report.non_fatal() {
            tracing::warn!("Turn {}: invariant {:?}", turn, violation);
            working.metadata.invariant_warnings += 1;
            events.push(
                BattleEventType::InvariantWarning {
                    severity: violation.severity(),
                    violation: violation.clone(),
                },
                turn,
            );
        }

        for draw in rng.take_recorded() {
            events.push(
                BattleEventType::RandomDraw {
                    purpose: draw.purpose,
                    value: draw.value,
                },
                turn,
            );
        }

        Ok(())
    }

    /// Clear guard, regenerate energy, tick cooldowns and burn a stun turn
    ///
    /// Returns false when the fighter is stunned and loses the action.
    fn apply_pre_turn_effects(
        &self,
        working: &mut BattleState,
        active: Slot,
        events: &mut BattleEventLog,
    ) -> bool {
        let turn = working.turn;
        let actor = working.fighter_mut(active);
        actor.guard = None;
        actor.restore_energy(self.config.energy_regen);
        actor.tick_cooldowns();

        if actor.is_stunned() {
            actor.stun_duration -= 1;
            events.push(
                BattleEventType::Stunned {
                    actor: actor.id.clone(),
                    remaining: actor.stun_duration,
                },
                turn,
            );
            return false;
        }
        true
    }

    /// Re-derive escalation and mental state for both fighters
    ///
    /// Escalation changes are logged one step at a time so the log never
    /// skips a state.
    fn recompute_states(
        &self,
        committed: &BattleState,
        working: &mut BattleState,
        events: &mut BattleEventLog,
    ) {
        let turn = working.turn;
        for (fighter, before) in working.fighters.iter_mut().zip(committed.fighters.iter()) {
            fighter.escalation_state = self.config.escalation.classify(fighter.incapacitation_score);

            let mut from = before.escalation_state;
            for to in EscalationState::path(from, fighter.escalation_state) {
                events.push(
                    BattleEventType::EscalationChange {
                        fighter_id: fighter.id.clone(),
                        from,
                        to,
                        score: fighter.incapacitation_score,
                    },
                    turn,
                );
                from = to;
            }

            if let Some(previous) = fighter.refresh_mental_state() {
                events.push(
                    BattleEventType::MentalStateChange {
                        fighter_id: fighter.id.clone(),
                        from: previous,
                        to: fighter.mental_state,
                    },
                    turn,
                );
            }
        }
    }
}
