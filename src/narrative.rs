//! Hand-off helpers for the narrative layer
//!
//! The engine never renders prose. It does give the renderer two things: a
//! stable pool key per event (which family of sentences fits it) and a
//! per-battle `RepetitionTracker` so the same sentence is not used twice in
//! one battle. Each battle owns its tracker; nothing here is global, so
//! batch battles on different threads cannot see each other's history.

use ahash::{AHashMap, AHashSet};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::battle::escalation::EscalationState;
use crate::battle::events::{BattleEventType, Effectiveness};
use crate::battle::execution::Termination;
use crate::battle::phase::BattlePhase;
use crate::core::types::BattleId;

/// Sentence pool that fits an event, if the event is narrated at all
pub fn pool_for_event(event: &BattleEventType) -> Option<&'static str> {
    let pool = match event {
        BattleEventType::BattleStarted { .. } => "battle_openings",
        BattleEventType::MoveAction { effectiveness, .. } => match effectiveness {
            Effectiveness::Miss => "misses",
            Effectiveness::Weak => "glancing_hits",
            Effectiveness::Normal => "hits",
            Effectiveness::Strong => "strong_hits",
            Effectiveness::Critical => "critical_hits",
        },
        BattleEventType::Stunned { .. } => "stunned",
        BattleEventType::EscalationChange { to, .. } => match to {
            EscalationState::Normal => return None,
            EscalationState::Pressured => "pressured",
            EscalationState::SeverelyIncapacitated => "severely_incapacitated",
            EscalationState::TerminalCollapse => "terminal_collapse",
        },
        BattleEventType::PhaseTransition { to, .. } => match to {
            BattlePhase::Opening => return None,
            BattlePhase::Escalation => "phase_escalation",
            BattlePhase::Climax => "phase_climax",
            BattlePhase::Resolution => "phase_resolution",
        },
        BattleEventType::Curbstomp { .. } => "curbstomps",
        BattleEventType::EnvironmentImpact {
            narrative_trigger: true,
            ..
        } => "environment_collapse",
        BattleEventType::Conclusion { termination, .. } => match termination {
            Termination::Knockout => "knockouts",
            Termination::BothDowned | Termination::Stalemate => "draws",
            Termination::Terminated { .. } => return None,
        },
        _ => return None,
    };
    Some(pool)
}

/// Which sentences one battle has already used, per pool
#[derive(Debug, Clone, Default)]
pub struct RepetitionTracker {
    battle_id: Option<BattleId>,
    used: AHashMap<String, AHashSet<String>>,
}

impl RepetitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_battle(battle_id: BattleId) -> Self {
        Self {
            battle_id: Some(battle_id),
            used: AHashMap::new(),
        }
    }

    pub fn battle_id(&self) -> Option<BattleId> {
        self.battle_id
    }

    pub fn is_used(&self, pool: &str, key: &str) -> bool {
        self.used.get(pool).is_some_and(|keys| keys.contains(key))
    }

    /// Record a sentence; returns false if it was already used
    pub fn mark_used(&mut self, pool: &str, key: &str) -> bool {
        self.used
            .entry(pool.to_string())
            .or_default()
            .insert(key.to_string())
    }

    pub fn used_count(&self, pool: &str) -> usize {
        self.used.get(pool).map_or(0, |set| set.len())
    }

    /// Pick an unused candidate at random and mark it used
    ///
    /// Once every candidate in the pool has been used the pool starts over,
    /// so a long battle repeats only after exhausting the pool.
    pub fn choose<'a, R: Rng + ?Sized>(
        &mut self,
        pool: &str,
        candidates: &'a [String],
        rng: &mut R,
    ) -> Option<&'a str> {
        if candidates.is_empty() {
            return None;
        }
        let mut fresh: Vec<&'a String> = candidates
            .iter()
            .filter(|c| !self.is_used(pool, c))
            .collect();
        if fresh.is_empty() {
            tracing::debug!("Pool '{}' exhausted, starting over", pool);
            self.reset_pool(pool);
            fresh = candidates.iter().collect();
        }
        let picked: &'a String = *fresh.choose(rng)?;
        self.mark_used(pool, picked);
        Some(picked.as_str())
    }

    pub fn reset_pool(&mut self, pool: &str) {
        self.used.remove(pool);
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line_{}", i)).collect()
    }

    #[test]
    fn test_no_repeats_until_pool_exhausted() {
        let mut tracker = RepetitionTracker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates = lines(5);

        let mut seen = AHashSet::new();
        for _ in 0..5 {
            let picked = tracker.choose("hits", &candidates, &mut rng).unwrap();
            assert!(seen.insert(picked.to_string()), "{} repeated", picked);
        }
        assert_eq!(tracker.used_count("hits"), 5);

        // Sixth pick starts the pool over
        tracker.choose("hits", &candidates, &mut rng).unwrap();
        assert_eq!(tracker.used_count("hits"), 1);
    }

    #[test]
    fn test_pools_are_independent() {
        let mut tracker = RepetitionTracker::new();
        assert!(tracker.mark_used("hits", "a"));
        assert!(!tracker.mark_used("hits", "a"));
        assert!(!tracker.is_used("misses", "a"));
    }

    #[test]
    fn test_trackers_do_not_share_history() {
        let mut first = RepetitionTracker::for_battle(BattleId::new());
        let second = RepetitionTracker::for_battle(BattleId::new());
        first.mark_used("knockouts", "down_for_good");
        assert!(!second.is_used("knockouts", "down_for_good"));
        assert_ne!(first.battle_id(), second.battle_id());
    }

    #[test]
    fn test_empty_pool() {
        let mut tracker = RepetitionTracker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(tracker.choose("hits", &[], &mut rng), None);
    }

    #[test]
    fn test_event_pools() {
        let miss = BattleEventType::MoveAction {
            actor: "a".into(),
            target: "b".into(),
            move_name: "Strike".into(),
            move_type: crate::battle::moves::MoveType::Offense,
            effectiveness: Effectiveness::Miss,
            damage: 0.0,
            target_hp: 100.0,
        };
        assert_eq!(pool_for_event(&miss), Some("misses"));

        let ai = BattleEventType::AiChoice {
            actor: "a".into(),
            move_name: "Strike".into(),
            confidence: 0.5,
            fallback: false,
        };
        assert_eq!(pool_for_event(&ai), None);

        let climax = BattleEventType::PhaseTransition {
            from: BattlePhase::Escalation,
            to: BattlePhase::Climax,
        };
        assert_eq!(pool_for_event(&climax), Some("phase_climax"));
    }
}
