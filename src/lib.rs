//! Duel Sim - personality-driven two-fighter duel simulation

pub mod batch;
pub mod battle;
pub mod core;
pub mod narrative;
pub mod prediction;
pub mod registry;

pub use battle::{replay_battle, simulate_battle, BattleResult};
pub use core::{BattleError, ErrorCause, Result, SimError, SimulationConfig};
pub use prediction::{calculate_win_probability, WinPrediction};
pub use registry::Registry;
