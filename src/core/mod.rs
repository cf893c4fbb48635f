pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{BattleError, ErrorCause, Result, SimError};
pub use types::{BattleId, FighterId, LocationId, Slot, Turn};
