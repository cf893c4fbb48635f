//! Parallel batch runner
//!
//! Fans independent battles out across rayon's pool. Battle `i` runs with
//! seed `base_seed + i` and its own cloned templates, so a batch is
//! reproducible regardless of thread count.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::battle::curbstomp::RuleTable;
use crate::battle::environment::Location;
use crate::battle::execution::{simulate_battle, BattleResult, Termination};
use crate::battle::fighter::Fighter;
use crate::core::config::SimulationConfig;
use crate::core::error::BattleError;
use crate::core::types::{FighterId, Turn};

/// Aggregate of a batch of battles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub battles: usize,
    pub wins: AHashMap<FighterId, usize>,
    pub draws: usize,
    pub terminated: usize,
    pub errors: usize,
    pub average_turns: f32,
    pub median_turns: f32,
    pub longest_battle: Turn,
}

impl BatchSummary {
    /// Share of completed battles won by `fighter_id`
    pub fn win_rate(&self, fighter_id: &str) -> f32 {
        let completed = self.battles - self.errors;
        if completed == 0 {
            return 0.0;
        }
        self.wins.get(fighter_id).copied().unwrap_or(0) as f32 / completed as f32
    }

    pub fn from_results(results: &[Result<BattleResult, BattleError>]) -> Self {
        let mut summary = BatchSummary {
            battles: results.len(),
            ..Default::default()
        };
        let mut turns: Vec<Turn> = Vec::with_capacity(results.len());

        for result in results {
            let result = match result {
                Ok(result) => result,
                Err(_) => {
                    summary.errors += 1;
                    continue;
                }
            };
            turns.push(result.turn_count);
            match (&result.winner_id, result.termination()) {
                (Some(winner), _) => *summary.wins.entry(winner.clone()).or_insert(0) += 1,
                (None, Some(Termination::Terminated { .. })) => summary.terminated += 1,
                (None, _) if result.is_draw => summary.draws += 1,
                (None, _) => {}
            }
        }

        turns.sort_unstable();
        if let Some(&longest) = turns.last() {
            let total: u64 = turns.iter().map(|&t| u64::from(t)).sum();
            summary.average_turns = total as f32 / turns.len() as f32;
            let mid = turns.len() / 2;
            summary.median_turns = if turns.len() % 2 == 0 {
                (turns[mid - 1] + turns[mid]) as f32 / 2.0
            } else {
                turns[mid] as f32
            };
            summary.longest_battle = longest;
        }
        summary
    }
}

/// Run `count` battles in parallel and return each result in seed order
pub fn run_batch(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
    count: usize,
    base_seed: u64,
) -> Vec<Result<BattleResult, BattleError>> {
    tracing::info!(
        "Running batch of {} battles: {} vs {} at {} (base seed {})",
        count,
        f1.id,
        f2.id,
        location.id,
        base_seed
    );

    (0..count)
        .into_par_iter()
        .map(|i| {
            let config = config.clone().with_seed(base_seed.wrapping_add(i as u64));
            simulate_battle(f1, f2, location, &config, rules)
        })
        .collect()
}

/// Run a batch and summarize it
pub fn summarize_batch(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    config: &SimulationConfig,
    rules: &RuleTable,
    count: usize,
    base_seed: u64,
) -> BatchSummary {
    let results = run_batch(f1, f2, location, config, rules, count, base_seed);
    let summary = BatchSummary::from_results(&results);
    if summary.errors > 0 {
        tracing::warn!("{} of {} battles aborted", summary.errors, summary.battles);
    }
    summary
}
