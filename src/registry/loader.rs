//! Load fighter, location, curbstomp and relationship data from TOML files

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::curbstomp::CurbstompRule;
use crate::battle::environment::Location;
use crate::battle::fighter::Fighter;
use crate::core::error::{Result, SimError};
use crate::core::types::FighterId;
use crate::registry::Registry;

pub const FIGHTERS_FILE: &str = "fighters.toml";
pub const LOCATIONS_FILE: &str = "locations.toml";
pub const CURBSTOMP_FILE: &str = "curbstomp.toml";
pub const RELATIONSHIPS_FILE: &str = "relationships.toml";

/// Bond between two characters, 0.0 (strangers) to 1.0 (family)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub a: FighterId,
    pub b: FighterId,
    pub strength: f32,
}

#[derive(Debug, Default, Deserialize)]
struct FighterFile {
    #[serde(default)]
    fighters: Vec<Fighter>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationFile {
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Debug, Default, Deserialize)]
struct CurbstompFile {
    #[serde(default)]
    rules: Vec<CurbstompRule>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationshipFile {
    #[serde(default)]
    relationships: Vec<Relationship>,
}

pub fn parse_fighters(content: &str) -> Result<Vec<Fighter>> {
    let file: FighterFile = toml::from_str(content)?;
    Ok(file.fighters)
}

pub fn parse_locations(content: &str) -> Result<Vec<Location>> {
    let file: LocationFile = toml::from_str(content)?;
    Ok(file.locations)
}

pub fn parse_curbstomp_rules(content: &str) -> Result<Vec<CurbstompRule>> {
    let file: CurbstompFile = toml::from_str(content)?;
    Ok(file.rules)
}

pub fn parse_relationships(content: &str) -> Result<Vec<Relationship>> {
    let file: RelationshipFile = toml::from_str(content)?;
    Ok(file.relationships)
}

fn read_optional(dir: &Path, filename: &str) -> Result<Option<String>> {
    let path = dir.join(filename);
    if !path.exists() {
        tracing::debug!("{} not found, skipping", path.display());
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(&path)?))
}

/// Load every data file in `data_dir` into a validated registry
///
/// `fighters.toml` is required; the other files are optional.
pub fn load_registry(data_dir: &Path) -> Result<Registry> {
    let mut registry = Registry::new();

    let fighters = read_optional(data_dir, FIGHTERS_FILE)?.ok_or_else(|| {
        SimError::Config(format!("{} missing from {}", FIGHTERS_FILE, data_dir.display()))
    })?;
    for fighter in parse_fighters(&fighters)? {
        registry.insert_fighter(fighter)?;
    }

    if let Some(content) = read_optional(data_dir, LOCATIONS_FILE)? {
        for location in parse_locations(&content)? {
            registry.insert_location(location)?;
        }
    }

    if let Some(content) = read_optional(data_dir, CURBSTOMP_FILE)? {
        for rule in parse_curbstomp_rules(&content)? {
            registry.insert_rule(rule)?;
        }
    }

    if let Some(content) = read_optional(data_dir, RELATIONSHIPS_FILE)? {
        for relationship in parse_relationships(&content)? {
            registry.insert_relationship(relationship)?;
        }
    }

    tracing::info!(
        "Loaded {} fighters, {} locations, {} curbstomp rules from {}",
        registry.fighter_count(),
        registry.location_count(),
        registry.rules().len(),
        data_dir.display()
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::curbstomp::CurbstompOutcome;
    use crate::battle::moves::{Element, MoveType};

    const FIGHTERS: &str = r#"
        [[fighters]]
        id = "toph"
        name = "Toph Beifong"
        element = "earth"

        [fighters.personality]
        aggression = 0.8
        signature_move_bias = { "Seismic Slam" = 1.6 }

        [fighters.traits]
        tier = 8
        strengths = ["earth_rich"]

        [[fighters.moves]]
        name = "Rock Jab"
        move_type = "offense"
        power = 30.0

        [[fighters.moves]]
        name = "Seismic Slam"
        move_type = "finisher"
        power = 85.0
        energy_cost = 35.0
    "#;

    #[test]
    fn test_parse_fighters() {
        let fighters = parse_fighters(FIGHTERS).unwrap();
        assert_eq!(fighters.len(), 1);
        let toph = &fighters[0];
        assert_eq!(toph.element, Element::Earth);
        assert_eq!(toph.hp, 100.0);
        assert_eq!(toph.personality.aggression, 0.8);
        assert_eq!(toph.personality.patience, 0.5);
        assert_eq!(toph.personality.signature_bias("Seismic Slam"), Some(1.6));
        assert_eq!(toph.traits.tier, 8);
        assert_eq!(toph.moves[1].move_type, MoveType::Finisher);
        assert!(toph.validate().is_ok());
    }

    #[test]
    fn test_parse_locations_and_rules() {
        let locations = parse_locations(
            r#"
            [[locations]]
            id = "ba_sing_se"
            name = "Ba Sing Se"
            terrain_tags = ["urban", "earth_rich"]
            "#,
        )
        .unwrap();
        assert!(locations[0].has_tag("urban"));

        let rules = parse_curbstomp_rules(
            r#"
            [[rules]]
            id = "toph_metal"
            character_id = "toph"
            trigger_probability = 0.2
            outcome = { kind = "incapacitate", turns = 2, score = 3.0 }
            "#,
        )
        .unwrap();
        assert_eq!(
            rules[0].outcome,
            CurbstompOutcome::Incapacitate { turns: 2, score: 3.0 }
        );
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let result = parse_fighters("[[fighters]]\nid = ");
        assert!(matches!(result, Err(SimError::TomlError(_))));
    }

    #[test]
    fn test_missing_fighters_file() {
        let result = load_registry(Path::new("/nonexistent/duel-data"));
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}
