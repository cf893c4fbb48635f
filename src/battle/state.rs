//! Complete battle state
//!
//! Owns both fighters in fixed slots. `Clone` is a structural copy of the
//! whole tree, which is what the turn processor uses as its working state.

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::environment::{EnvironmentState, Location};
use crate::battle::events::{BattleEvent, BattleEventType};
use crate::battle::execution::Termination;
use crate::battle::fighter::Fighter;
use crate::battle::phase::PhaseState;
use crate::core::types::{BattleId, Slot, Turn};

/// Metadata bag for timing and bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMetadata {
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub termination: Option<Termination>,
    pub fallback_decisions: u32,
    pub invariant_warnings: u32,
}

impl BattleMetadata {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            started_at: Utc::now(),
            duration_ms: 0,
            termination: None,
            fallback_decisions: 0,
            invariant_warnings: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub turn: Turn,
    pub fighters: [Fighter; 2],
    pub environment: EnvironmentState,
    pub phase: PhaseState,

    /// Append-only, committed turns only
    pub battle_log: Vec<BattleEvent>,
    pub metadata: BattleMetadata,

    /// Curbstomp rules that already fired this battle
    pub fired_rules: AHashSet<String>,
}

impl BattleState {
    pub fn new(fighters: [Fighter; 2], location: &Location, seed: u64) -> Self {
        Self {
            battle_id: BattleId::new(),
            turn: 0,
            fighters,
            environment: EnvironmentState::new(location.id.clone()),
            phase: PhaseState::default(),
            battle_log: Vec::new(),
            metadata: BattleMetadata::new(seed),
            fired_rules: AHashSet::new(),
        }
    }

    pub fn fighter(&self, slot: Slot) -> &Fighter {
        &self.fighters[slot.index()]
    }

    pub fn fighter_mut(&mut self, slot: Slot) -> &mut Fighter {
        &mut self.fighters[slot.index()]
    }

    /// Mutable access to (active, other) at once
    pub fn pair_mut(&mut self, active: Slot) -> (&mut Fighter, &mut Fighter) {
        let [first, second] = &mut self.fighters;
        match active {
            Slot::First => (first, second),
            Slot::Second => (second, first),
        }
    }

    pub fn slot_of(&self, fighter_id: &str) -> Option<Slot> {
        if self.fighters[0].id == fighter_id {
            Some(Slot::First)
        } else if self.fighters[1].id == fighter_id {
            Some(Slot::Second)
        } else {
            None
        }
    }

    /// Log a battle event at the current turn
    pub fn log_event(&mut self, event_type: BattleEventType) {
        self.battle_log.push(BattleEvent {
            turn: self.turn,
            event_type,
        });
    }
}
