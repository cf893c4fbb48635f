//! Battle locations and the environment damage they accumulate

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    IMPACT_MODERATE_POWER, IMPACT_SEVERE_POWER, NARRATIVE_IMPACT_TRIGGER,
};
use crate::battle::moves::Move;
use crate::core::types::LocationId;

/// Location record supplied by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub terrain_tags: Vec<String>,
}

impl Location {
    pub fn new(id: impl Into<String>, terrain_tags: &[&str]) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            terrain_tags: terrain_tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.terrain_tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    #[default]
    None,
    Minor,
    Moderate,
    Severe,
}

impl ImpactLevel {
    pub fn from_power(power: f32) -> Self {
        if power >= IMPACT_SEVERE_POWER {
            ImpactLevel::Severe
        } else if power >= IMPACT_MODERATE_POWER {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::Minor
        }
    }
}

/// Result of recording one impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactRecord {
    pub level: ImpactLevel,
    /// This impact pushed the phase over the narrative trigger count
    pub triggers_narrative: bool,
}

/// Cumulative environment state plus per-phase counters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentState {
    pub location_id: LocationId,
    pub damage_level: f32,
    /// Distinct impact keys over the whole battle
    pub impacts: AHashSet<String>,

    // Per-phase counters, reset on every phase transition
    pub impact_count: u32,
    pub phase_impacts: Vec<String>,
    pub highest_impact_level: ImpactLevel,
    pub narrative_triggered: bool,
}

impl EnvironmentState {
    pub fn new(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            ..Default::default()
        }
    }

    /// Record the impact of a landed move
    pub fn record_impact(&mut self, mv: &Move) -> ImpactRecord {
        let level = ImpactLevel::from_power(mv.power);
        self.damage_level += mv.power / 10.0;
        self.impacts.insert(mv.name.clone());

        self.impact_count += 1;
        self.phase_impacts.push(mv.name.clone());
        self.highest_impact_level = self.highest_impact_level.max(level);

        let triggers_narrative =
            !self.narrative_triggered && self.impact_count >= NARRATIVE_IMPACT_TRIGGER;
        if triggers_narrative {
            self.narrative_triggered = true;
        }

        ImpactRecord {
            level,
            triggers_narrative,
        }
    }

    pub fn reset_phase_counters(&mut self) {
        self.impact_count = 0;
        self.phase_impacts.clear();
        self.highest_impact_level = ImpactLevel::None;
        self.narrative_triggered = false;
    }
}
