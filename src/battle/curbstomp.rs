//! Curbstomp rules: character-specific instant resolutions
//!
//! A rule belongs to one character and is consulted on that character's
//! turns, before normal action resolution. When every condition holds the
//! rule costs one `curbstomp_trigger` draw and fires with its trigger
//! probability. Each rule fires at most once per battle. Rules that backfire
//! on their owner (`instant_loss`) are ordinary outcomes.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::environment::Location;
use crate::battle::escalation::EscalationState;
use crate::battle::moves::Element;
use crate::battle::phase::BattlePhase;
use crate::battle::rng::{BattleRng, DrawPurpose};
use crate::battle::state::BattleState;
use crate::core::config::SimulationConfig;
use crate::core::error::ErrorCause;
use crate::core::types::{FighterId, Slot, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurbstompOutcome {
    /// Owner downs the opponent outright
    InstantWin,
    /// Owner is downed instead
    InstantLoss,
    /// Opponent is stunned and takes extra incapacitation
    Incapacitate { turns: u32, score: f32 },
}

/// Which fighter a condition reads, relative to the rule owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Actor,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    OpponentElementIs { element: Element },
    OpponentIdIs { id: FighterId },
    LocationTagIncludes { tag: String },
    ScoreThreshold { subject: Subject, min: f32 },
    HpBelow { subject: Subject, ratio: f32 },
    TurnAtLeast { turn: Turn },
    PhaseIs { phase: BattlePhase },
    EscalationAtLeast { subject: Subject, state: EscalationState },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurbstompRule {
    pub id: String,
    pub character_id: FighterId,
    pub outcome: CurbstompOutcome,
    pub trigger_probability: f32,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
}

impl CurbstompRule {
    pub fn validate(&self) -> Result<(), ErrorCause> {
        if !(0.0..=1.0).contains(&self.trigger_probability) {
            return Err(ErrorCause::validation(
                format!("curbstomp.{}.trigger_probability", self.id),
                "must lie in [0, 1]",
            ));
        }
        if let CurbstompOutcome::Incapacitate { score, .. } = self.outcome {
            if !(score.is_finite() && score >= 0.0) {
                return Err(ErrorCause::validation(
                    format!("curbstomp.{}.outcome.score", self.id),
                    "must be >= 0",
                ));
            }
        }
        Ok(())
    }
}

/// Rules keyed by owning character, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: AHashMap<FighterId, Vec<CurbstompRule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = CurbstompRule>) -> Self {
        let mut table = Self::new();
        for rule in rules {
            table.insert(rule);
        }
        table
    }

    pub fn insert(&mut self, rule: CurbstompRule) {
        self.rules
            .entry(rule.character_id.clone())
            .or_default()
            .push(rule);
    }

    pub fn rules_for(&self, character_id: &str) -> &[CurbstompRule] {
        self.rules
            .get(character_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<(), ErrorCause> {
        self.rules
            .values()
            .flatten()
            .try_for_each(CurbstompRule::validate)
    }
}

/// A rule that fired this turn
#[derive(Debug, Clone, PartialEq)]
pub struct FiredRule {
    pub rule_id: String,
    pub actor: FighterId,
    pub target: FighterId,
    pub outcome: CurbstompOutcome,
}

/// Evaluate one condition from the point of view of the fighter in `actor`
pub fn condition_holds(
    condition: &RuleCondition,
    state: &BattleState,
    actor: Slot,
    location: &Location,
) -> bool {
    let subject = |s: Subject| match s {
        Subject::Actor => state.fighter(actor),
        Subject::Opponent => state.fighter(actor.other()),
    };
    let opponent = state.fighter(actor.other());

    match condition {
        RuleCondition::OpponentElementIs { element } => opponent.element == *element,
        RuleCondition::OpponentIdIs { id } => opponent.id == *id,
        RuleCondition::LocationTagIncludes { tag } => location.has_tag(tag),
        RuleCondition::ScoreThreshold { subject: s, min } => {
            subject(*s).incapacitation_score >= *min
        }
        RuleCondition::HpBelow { subject: s, ratio } => subject(*s).hp_ratio() < *ratio,
        RuleCondition::TurnAtLeast { turn } => state.turn >= *turn,
        RuleCondition::PhaseIs { phase } => state.phase.current_phase == *phase,
        RuleCondition::EscalationAtLeast { subject: s, state: min } => {
            subject(*s).escalation_state >= *min
        }
    }
}

/// Rule has not fired yet and all its conditions hold
pub fn is_eligible(rule: &CurbstompRule, state: &BattleState, actor: Slot, location: &Location) -> bool {
    !state.fired_rules.contains(&rule.id)
        && rule
            .conditions
            .iter()
            .all(|c| condition_holds(c, state, actor, location))
}

/// Consult the actor's rules in order; the first one that fires wins
///
/// One `curbstomp_trigger` draw is made per eligible rule until a rule fires.
pub fn evaluate_rules(
    table: &RuleTable,
    state: &BattleState,
    actor: Slot,
    location: &Location,
    rng: &mut BattleRng,
) -> Result<Option<FiredRule>, ErrorCause> {
    let owner = state.fighter(actor);
    for rule in table.rules_for(&owner.id) {
        if !is_eligible(rule, state, actor, location) {
            continue;
        }
        if rng.chance(DrawPurpose::CurbstompTrigger, rule.trigger_probability as f64)? {
            return Ok(Some(FiredRule {
                rule_id: rule.id.clone(),
                actor: owner.id.clone(),
                target: state.fighter(actor.other()).id.clone(),
                outcome: rule.outcome,
            }));
        }
    }
    Ok(None)
}

/// Apply a fired rule to the working state
pub fn apply_outcome(state: &mut BattleState, actor: Slot, fired: &FiredRule, config: &SimulationConfig) {
    state.fired_rules.insert(fired.rule_id.clone());
    let thresholds = &config.escalation;

    match fired.outcome {
        CurbstompOutcome::InstantWin => {
            let target = state.fighter_mut(actor.other());
            target.hp = 0.0;
            target.raise_incapacitation_to(config.absolute_score_cap, thresholds);
        }
        CurbstompOutcome::InstantLoss => {
            let owner = state.fighter_mut(actor);
            owner.hp = 0.0;
            owner.raise_incapacitation_to(config.absolute_score_cap, thresholds);
        }
        CurbstompOutcome::Incapacitate { turns, score } => {
            let target = state.fighter_mut(actor.other());
            target.stun_duration += turns;
            target.add_incapacitation(score, thresholds);
        }
    }

    tracing::info!(
        "Turn {}: curbstomp {} fired ({} vs {}): {:?}",
        state.turn,
        fired.rule_id,
        fired.actor,
        fired.target,
        fired.outcome
    );
}
