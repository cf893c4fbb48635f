//! Recorded random source
//!
//! Every draw the engine makes goes through `BattleRng` with a purpose tag.
//! In record mode draws come from a seeded ChaCha stream and are kept so the
//! turn processor can log them as input events. In replay mode the logged
//! values are handed back in order instead of fresh draws, which makes a
//! captured battle reproducible even if the stream or its consumers change.
//! Replay also carries the recorded fallback flag of every AI choice, since a
//! decision that fell back on the wall clock cannot be re-derived from draws.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::events::{BattleEvent, BattleEventType};
use crate::core::error::ErrorCause;

/// Why a draw was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawPurpose {
    MoveSelection,
    HitRoll,
    CritRoll,
    DamageRoll,
    CurbstompTrigger,
    WinNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomDraw {
    pub purpose: DrawPurpose,
    pub value: f64,
}

#[derive(Debug, Clone)]
enum Mode {
    Record,
    Replay {
        draws: VecDeque<RandomDraw>,
        fallbacks: VecDeque<bool>,
    },
}

/// Purpose-tagged random source.
///
/// Draws accumulate in an internal buffer until `take_recorded` drains them.
/// The turn processor drains once per turn; any other long-lived caller must
/// drain too or the buffer keeps growing.
#[derive(Debug, Clone)]
pub struct BattleRng {
    rng: ChaCha8Rng,
    seed: u64,
    mode: Mode,
    recorded: Vec<RandomDraw>,
}

impl BattleRng {
    /// Create with specific seed for deterministic behavior
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            mode: Mode::Record,
            recorded: Vec::new(),
        }
    }

    /// Seed from the given option, or draw a fresh one
    pub fn from_seed_or_entropy(seed: Option<u64>) -> Self {
        Self::seeded(seed.unwrap_or_else(rand::random))
    }

    /// Hand back `draws` in order instead of drawing
    pub fn replaying(seed: u64, draws: Vec<RandomDraw>) -> Self {
        Self {
            mode: Mode::Replay {
                draws: draws.into(),
                fallbacks: VecDeque::new(),
            },
            ..Self::seeded(seed)
        }
    }

    /// Attach the recorded fallback flag of each AI choice, oldest first.
    /// Ignored when recording.
    pub fn with_recorded_fallbacks(mut self, flags: Vec<bool>) -> Self {
        if let Mode::Replay { fallbacks, .. } = &mut self.mode {
            *fallbacks = flags.into();
        }
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self.mode, Mode::Replay { .. })
    }

    /// Replay draws not yet consumed (always 0 when recording)
    pub fn remaining_replay(&self) -> usize {
        match &self.mode {
            Mode::Record => 0,
            Mode::Replay { draws, .. } => draws.len(),
        }
    }

    /// Whether the next recorded AI choice fell back.
    ///
    /// `None` when recording. While replaying, a log without choice flags
    /// reads as "did not fall back".
    pub fn next_recorded_fallback(&mut self) -> Option<bool> {
        match &mut self.mode {
            Mode::Record => None,
            Mode::Replay { fallbacks, .. } => Some(fallbacks.pop_front().unwrap_or(false)),
        }
    }

    /// Uniform value in [0, 1)
    pub fn unit(&mut self, purpose: DrawPurpose) -> Result<f64, ErrorCause> {
        let value = match &mut self.mode {
            Mode::Record => self.rng.gen::<f64>(),
            Mode::Replay { draws, .. } => {
                let draw = draws.pop_front().ok_or_else(|| ErrorCause::ReplayDivergence {
                    reason: format!("log exhausted at {:?} draw", purpose),
                })?;
                if draw.purpose != purpose {
                    return Err(ErrorCause::ReplayDivergence {
                        reason: format!(
                            "expected {:?} draw, log has {:?}",
                            purpose, draw.purpose
                        ),
                    });
                }
                draw.value
            }
        };
        self.recorded.push(RandomDraw { purpose, value });
        Ok(value)
    }

    /// Uniform value in [lo, hi)
    pub fn range(&mut self, purpose: DrawPurpose, lo: f64, hi: f64) -> Result<f64, ErrorCause> {
        Ok(lo + self.unit(purpose)? * (hi - lo))
    }

    /// True with probability `p`
    pub fn chance(&mut self, purpose: DrawPurpose, p: f64) -> Result<bool, ErrorCause> {
        Ok(self.unit(purpose)? < p)
    }

    /// Draws made since the last call, oldest first
    pub fn take_recorded(&mut self) -> Vec<RandomDraw> {
        std::mem::take(&mut self.recorded)
    }

    /// Number of draws waiting in the buffer
    pub fn recorded_len(&self) -> usize {
        self.recorded.len()
    }

    /// Drop buffered draws past `len`, keeping earlier ones for the caller
    /// that owns them
    pub fn discard_recorded_after(&mut self, len: usize) {
        self.recorded.truncate(len);
    }
}

/// Pull the logged draws out of an event log, in order
pub fn draws_from_events(events: &[BattleEvent]) -> Vec<RandomDraw> {
    events
        .iter()
        .filter_map(|e| match e.event_type {
            BattleEventType::RandomDraw { purpose, value } => Some(RandomDraw { purpose, value }),
            _ => None,
        })
        .collect()
}

/// Pull the fallback flag of every AI choice out of an event log, in order
pub fn fallbacks_from_events(events: &[BattleEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e.event_type {
            BattleEventType::AiChoice { fallback, .. } => Some(fallback),
            _ => None,
        })
        .collect()
}
