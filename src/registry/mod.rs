//! Character and location registry
//!
//! Holds the fighter templates, locations, curbstomp rules and relationships
//! loaded from the data directory. Templates are never mutated; battles clone
//! what they need.

pub mod loader;

use ahash::AHashMap;

use crate::battle::curbstomp::{CurbstompRule, RuleTable};
use crate::battle::environment::Location;
use crate::battle::execution::{simulate_battle, BattleResult};
use crate::battle::fighter::Fighter;
use crate::battle::rng::BattleRng;
use crate::core::config::SimulationConfig;
use crate::core::error::{BattleError, Result, SimError};
use crate::core::types::{FighterId, LocationId};
use crate::prediction::{calculate_win_probability, WinPrediction};

pub use loader::{load_registry, Relationship};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    fighters: AHashMap<FighterId, Fighter>,
    locations: AHashMap<LocationId, Location>,
    rules: RuleTable,
    relationships: AHashMap<(FighterId, FighterId), f32>,
}

/// Relationships are symmetric; store under the ordered pair
fn pair_key(a: &str, b: &str) -> (FighterId, FighterId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_fighter(&mut self, fighter: Fighter) -> Result<()> {
        fighter
            .validate()
            .map_err(|cause| SimError::Config(format!("fighter '{}': {}", fighter.id, cause)))?;
        if self.fighters.contains_key(&fighter.id) {
            return Err(SimError::Config(format!("duplicate fighter id '{}'", fighter.id)));
        }
        self.fighters.insert(fighter.id.clone(), fighter);
        Ok(())
    }

    pub fn insert_location(&mut self, location: Location) -> Result<()> {
        if location.id.trim().is_empty() {
            return Err(SimError::Config("location with empty id".into()));
        }
        if self.locations.contains_key(&location.id) {
            return Err(SimError::Config(format!("duplicate location id '{}'", location.id)));
        }
        self.locations.insert(location.id.clone(), location);
        Ok(())
    }

    pub fn insert_rule(&mut self, rule: CurbstompRule) -> Result<()> {
        rule.validate()
            .map_err(|cause| SimError::Config(format!("rule '{}': {}", rule.id, cause)))?;
        if !self.fighters.contains_key(&rule.character_id) {
            tracing::warn!(
                "Curbstomp rule '{}' targets unknown character '{}'",
                rule.id,
                rule.character_id
            );
        }
        self.rules.insert(rule);
        Ok(())
    }

    pub fn insert_relationship(&mut self, relationship: Relationship) -> Result<()> {
        if !(0.0..=1.0).contains(&relationship.strength) {
            return Err(SimError::Config(format!(
                "relationship {}/{} strength {} outside 0..=1",
                relationship.a, relationship.b, relationship.strength
            )));
        }
        self.relationships
            .insert(pair_key(&relationship.a, &relationship.b), relationship.strength);
        Ok(())
    }

    pub fn fighter(&self, id: &str) -> Result<&Fighter> {
        self.fighters
            .get(id)
            .ok_or_else(|| SimError::UnknownFighter(id.to_string()))
    }

    pub fn location(&self, id: &str) -> Result<&Location> {
        self.locations
            .get(id)
            .ok_or_else(|| SimError::UnknownLocation(id.to_string()))
    }

    pub fn relationship(&self, a: &str, b: &str) -> Option<f32> {
        self.relationships.get(&pair_key(a, b)).copied()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Fighter ids in sorted order
    pub fn fighter_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fighters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn fighter_count(&self) -> usize {
        self.fighters.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Resolve ids and run one battle
    pub fn simulate(
        &self,
        f1_id: &str,
        f2_id: &str,
        location_id: &str,
        config: &SimulationConfig,
    ) -> Result<BattleResult> {
        let f1 = self.fighter(f1_id)?;
        let f2 = self.fighter(f2_id)?;
        let location = self.location(location_id)?;
        Ok(simulate_battle(f1, f2, location, config, &self.rules)?)
    }

    /// Resolve ids and predict the matchup
    pub fn predict(
        &self,
        f1_id: &str,
        f2_id: &str,
        location_id: &str,
        seed: Option<u64>,
    ) -> Result<WinPrediction> {
        let f1 = self.fighter(f1_id)?;
        let f2 = self.fighter(f2_id)?;
        let location = self.location(location_id)?;
        let mut rng = BattleRng::from_seed_or_entropy(seed);
        let relationship = self.relationship(f1_id, f2_id);
        calculate_win_probability(f1, f2, location, relationship, &mut rng)
            .map_err(|cause| SimError::Battle(BattleError::new(0, cause)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::moves::{Element, Move, MoveType};

    fn fighter(id: &str) -> Fighter {
        Fighter::new(id, id, Element::Fire).with_moves(vec![
            Move::new("Fire Jab", MoveType::Offense, 30.0),
            Move::new("Fire Shield", MoveType::Defense, 0.0),
        ])
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.insert_fighter(fighter("zuko")).unwrap();
        registry.insert_fighter(fighter("azula")).unwrap();
        registry
            .insert_location(Location::new("agni_kai_arena", &["fire_rich"]))
            .unwrap();
        registry
            .insert_relationship(Relationship {
                a: "zuko".into(),
                b: "azula".into(),
                strength: 0.8,
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_fighter_rejected() {
        let mut registry = registry();
        assert!(matches!(
            registry.insert_fighter(fighter("zuko")),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_fighter_rejected() {
        let mut registry = Registry::new();
        let empty = Fighter::new("empty", "Empty", Element::Air);
        assert!(matches!(registry.insert_fighter(empty), Err(SimError::Config(_))));
    }

    #[test]
    fn test_relationship_is_symmetric() {
        let registry = registry();
        assert_eq!(registry.relationship("azula", "zuko"), Some(0.8));
        assert_eq!(registry.relationship("zuko", "azula"), Some(0.8));
        assert_eq!(registry.relationship("zuko", "iroh"), None);
    }

    #[test]
    fn test_fighter_ids_sorted() {
        assert_eq!(registry().fighter_ids(), vec!["azula", "zuko"]);
    }

    #[test]
    fn test_predict_uses_relationship_for_tone() {
        let registry = registry();
        let prediction = registry
            .predict("zuko", "azula", "agni_kai_arena", Some(9))
            .unwrap();
        assert_eq!(
            prediction.resolution_tone,
            crate::prediction::ResolutionTone::Bittersweet
        );
    }
}
