//! Battle system constants - fixed values in one place
//!
//! Tunables a host may want to change live in `SimulationConfig`; these are
//! the rule constants of the engine itself.

// Vitals
pub const MAX_VITAL: f32 = 100.0;
pub const MIN_MOMENTUM: f32 = -100.0;
pub const MAX_MOMENTUM: f32 = 100.0;

// Momentum (per point of damage, and flat on a miss)
pub const MOMENTUM_PER_DAMAGE: f32 = 0.8;
pub const MOMENTUM_MISS_PENALTY: f32 = 5.0;
pub const MOMENTUM_DECAY: f32 = 0.9;

// Resolution
pub const CRIT_MULTIPLIER: f32 = 1.5;
pub const DAMAGE_VARIANCE_MIN: f32 = 0.85;
pub const DAMAGE_VARIANCE_SPAN: f32 = 0.30;
pub const DEFAULT_GUARD_REDUCTION: f32 = 0.5;
pub const UNOPENED_ACCURACY_FACTOR: f32 = 0.5;
pub const CRIT_SCORE_BONUS: f32 = 1.0;
pub const STUN_SCORE_BONUS: f32 = 1.0;

// Environment impact levels (power bands)
pub const IMPACT_MODERATE_POWER: f32 = 50.0;
pub const IMPACT_SEVERE_POWER: f32 = 75.0;
pub const NARRATIVE_IMPACT_TRIGGER: u32 = 3;

// Decision engine
pub const FALLBACK_CONFIDENCE: f32 = 0.2;

// Weighting engine multipliers
pub const SCORE_SIGNATURE_BIAS: f32 = 1.5;
pub const SCORE_FINISHER_BIAS: f32 = 2.5;
pub const SCORE_LOW_POWER_PENALTY: f32 = 0.4;
pub const SCORE_LOW_POWER_CUTOFF: f32 = 30.0;
pub const STATE_FINISHER_BIAS: f32 = 1.8;
pub const STATE_LOW_POWER_PENALTY: f32 = 0.6;
pub const STATE_LOW_POWER_CUTOFF: f32 = 40.0;
pub const STATE_SIGNATURE_BIAS: f32 = 1.4;

// Win prediction
pub const BASE_WIN_MODIFIER: f32 = 50.0;
pub const TIER_GAP_LINEAR: f32 = 5.0;
pub const TERRAIN_MODIFIER: f32 = 10.0;
pub const WIN_NOISE: f32 = 5.0;
pub const MIN_WIN_SCORE: f32 = 1.0;
