//! Battle execution loop
//!
//! Each turn: budgets -> turn processor -> commit -> termination check.
//! A battle ends as exactly one of knockout, both downed, stalemate or
//! terminated (host budget exhausted).

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::ai::{AiDecisionEngine, BattleAI};
use crate::battle::curbstomp::RuleTable;
use crate::battle::environment::Location;
use crate::battle::events::{BattleEvent, BattleEventType};
use crate::battle::fighter::Fighter;
use crate::battle::rng::{draws_from_events, fallbacks_from_events, BattleRng};
use crate::battle::state::{BattleMetadata, BattleState};
use crate::battle::turn::TurnProcessor;
use crate::core::config::SimulationConfig;
use crate::core::error::{BattleError, ErrorCause};
use crate::core::types::{BattleId, FighterId, LocationId, Slot, Turn};

/// Host budget that cut a battle short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    StepBudget,
    WallClock,
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Knockout,
    BothDowned,
    Stalemate,
    Terminated { reason: BudgetKind },
}

impl Termination {
    pub fn is_draw(self) -> bool {
        matches!(self, Termination::BothDowned | Termination::Stalemate)
    }
}

/// Natural end of the battle, if any
///
/// Downed means an incapacitation score at the absolute cap or terminal
/// collapse. Returns the termination and, for a knockout, the winner's slot.
pub fn check_battle_termination(
    state: &BattleState,
    absolute_score_cap: f32,
) -> Option<(Termination, Option<Slot>)> {
    let first_down = state.fighter(Slot::First).is_downed(absolute_score_cap);
    let second_down = state.fighter(Slot::Second).is_downed(absolute_score_cap);

    match (first_down, second_down) {
        (true, true) => Some((Termination::BothDowned, None)),
        (true, false) => Some((Termination::Knockout, Some(Slot::Second))),
        (false, true) => Some((Termination::Knockout, Some(Slot::First))),
        (false, false) => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleResult {
    pub battle_id: BattleId,
    pub winner_id: Option<FighterId>,
    pub loser_id: Option<FighterId>,
    pub is_draw: bool,
    pub turn_count: Turn,
    pub final_state: BattleState,
    pub events: Vec<BattleEvent>,
    pub location_id: LocationId,
    pub timestamp: DateTime<Utc>,
    pub metadata: BattleMetadata,
}

impl BattleResult {
    pub fn termination(&self) -> Option<Termination> {
        self.metadata.termination
    }
}

/// Input checks run before the loop starts
pub fn validate_battle_inputs(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
) -> Result<(), ErrorCause> {
    config
        .validate()
        .map_err(|reason| ErrorCause::validation("config", reason))?;
    if location.id.trim().is_empty() {
        return Err(ErrorCause::validation("location.id", "must not be empty"));
    }
    f1.validate()?;
    f2.validate()?;
    if f1.id == f2.id {
        return Err(ErrorCause::validation(
            "fighters",
            format!("both fighters have id '{}'", f1.id),
        ));
    }
    rules.validate()
}

/// Run a full battle between two fighter templates
///
/// Templates are cloned; the caller's values are never mutated.
pub fn simulate_battle(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
) -> Result<BattleResult, BattleError> {
    let mut rng = BattleRng::from_seed_or_entropy(config.seed);
    run_battle(f1, f2, location, config, rules, &mut rng)
}

/// Re-run a recorded battle from its logged inputs
///
/// Random draws come from the `random_draw` events instead of the stream,
/// and each decision reuses the recorded `ai_choice` fallback flag in place
/// of the decision clock. Every draw must match the recorded purpose and every `ai_choice` must
/// match the recorded one, otherwise the replay fails with
/// `ReplayDivergence`.
pub fn replay_battle(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
    recorded: &[BattleEvent],
) -> Result<BattleResult, BattleError> {
    let divergence = |turn: Turn, reason: String| {
        BattleError::new(turn, ErrorCause::ReplayDivergence { reason })
    };

    let seed = recorded
        .iter()
        .find_map(|e| match e.event_type {
            BattleEventType::BattleStarted { seed, .. } => Some(seed),
            _ => None,
        })
        .ok_or_else(|| divergence(0, "log has no battle_started event".into()))?;

    let mut replay_config = config.clone();
    replay_config.seed = Some(seed);
    replay_config.wall_clock_limit_ms = None;
    let recorded_end = recorded.iter().rev().find_map(|e| match e.event_type {
        BattleEventType::Conclusion { termination, .. } => Some((e.turn, termination)),
        _ => None,
    });
    if let Some((turn, Termination::Terminated { .. })) = recorded_end {
        replay_config.step_budget = Some(turn);
    }

    let mut rng = BattleRng::replaying(seed, draws_from_events(recorded))
        .with_recorded_fallbacks(fallbacks_from_events(recorded));
    let result = run_battle(f1, f2, location, &replay_config, rules, &mut rng)?;

    let choices = |events: &[BattleEvent]| -> Vec<BattleEvent> {
        events
            .iter()
            .filter(|e| matches!(e.event_type, BattleEventType::AiChoice { .. }))
            .cloned()
            .collect()
    };
    let expected = choices(recorded);
    let actual = choices(&result.events);
    for (want, got) in expected.iter().zip(actual.iter()) {
        if want != got {
            return Err(divergence(
                got.turn,
                format!("ai choice {:?} differs from recorded {:?}", got.event_type, want.event_type),
            ));
        }
    }
    if expected.len() != actual.len() {
        return Err(divergence(
            result.turn_count,
            format!("{} ai choices recorded, {} replayed", expected.len(), actual.len()),
        ));
    }
    if rng.remaining_replay() > 0 {
        return Err(divergence(
            result.turn_count,
            format!("{} recorded draws were never consumed", rng.remaining_replay()),
        ));
    }

    Ok(result)
}

fn run_battle(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
    rng: &mut BattleRng,
) -> Result<BattleResult, BattleError> {
    if let Err(cause) = validate_battle_inputs(f1, f2, location, config, rules) {
        let mut err = BattleError::new(0, cause.clone());
        err.events.push(BattleEvent {
            turn: 0,
            event_type: BattleEventType::Error { cause },
        });
        return Err(err);
    }

    let fighters = [
        Fighter::instantiate(f1, &config.escalation),
        Fighter::instantiate(f2, &config.escalation),
    ];
    let mut state = BattleState::new(fighters, location, rng.seed());
    state.log_event(BattleEventType::BattleStarted {
        fighter_ids: [f1.id.clone(), f2.id.clone()],
        location_id: location.id.clone(),
        seed: rng.seed(),
    });
    tracing::info!(
        "Battle {} started: {} vs {} at {} (seed {})",
        state.battle_id,
        f1.id,
        f2.id,
        location.id,
        rng.seed()
    );

    let processor = TurnProcessor::new(config, location, rules);
    let mut agents: [Box<dyn BattleAI>; 2] = [
        Box::new(AiDecisionEngine::from_config(config)),
        Box::new(AiDecisionEngine::from_config(config)),
    ];
    let started = Instant::now();
    let wall_clock = config.wall_clock_limit();

    let (termination, winner) = loop {
        if let Some(end) = check_battle_termination(&state, config.absolute_score_cap) {
            break end;
        }
        if state.turn >= config.max_turns {
            break (Termination::Stalemate, None);
        }
        if config.step_budget.is_some_and(|budget| state.turn >= budget) {
            break (Termination::Terminated { reason: BudgetKind::StepBudget }, None);
        }
        if wall_clock.is_some_and(|limit| started.elapsed() >= limit) {
            break (Termination::Terminated { reason: BudgetKind::WallClock }, None);
        }

        match processor.process_turn(&state, &mut agents, rng) {
            Ok(outcome) => state = outcome.state,
            Err(mut err) => {
                tracing::error!("Battle {} aborted: {}", state.battle_id, err);
                state.battle_log.push(BattleEvent {
                    turn: err.turn,
                    event_type: BattleEventType::Error {
                        cause: err.cause.clone(),
                    },
                });
                err.events = state.battle_log;
                return Err(err);
            }
        }
    };

    let winner_id = winner.map(|slot| state.fighter(slot).id.clone());
    let loser_id = winner.map(|slot| state.fighter(slot.other()).id.clone());

    state.metadata.termination = Some(termination);
    state.metadata.duration_ms = started.elapsed().as_millis() as u64;
    state.log_event(BattleEventType::Conclusion {
        winner_id: winner_id.clone(),
        loser_id: loser_id.clone(),
        termination,
    });

    tracing::info!(
        "Battle {} ended on turn {}: {:?}, winner {:?}",
        state.battle_id,
        state.turn,
        termination,
        winner_id
    );

    Ok(BattleResult {
        battle_id: state.battle_id,
        winner_id,
        loser_id,
        is_draw: termination.is_draw(),
        turn_count: state.turn,
        events: state.battle_log.clone(),
        location_id: location.id.clone(),
        timestamp: Utc::now(),
        metadata: state.metadata.clone(),
        final_state: state,
    })
}
