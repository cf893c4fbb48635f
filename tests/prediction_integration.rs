//! Pre-battle prediction against the shipped data set

use std::path::Path;

use duel_sim::prediction::{OutcomeReason, ResolutionTone, VictoryType};
use duel_sim::registry::{load_registry, Registry};
use duel_sim::SimError;

fn registry() -> Registry {
    load_registry(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data")).unwrap()
}

#[test]
fn test_higher_tier_on_home_ground_is_favored() {
    let registry = registry();
    for seed in 0..200 {
        let prediction = registry.predict("toph", "sokka", "ba_sing_se", Some(seed)).unwrap();
        assert_eq!(prediction.f1_prob as u32 + prediction.f2_prob as u32, 100);
        assert_eq!(prediction.winner_id, "toph");
        // 106 vs 24 before noise: always strong, never overwhelming
        assert!((75..90).contains(&prediction.win_prob), "{}", prediction.win_prob);
        assert_eq!(prediction.victory_type, VictoryType::TerrainKill);
        assert_eq!(prediction.resolution_tone, ResolutionTone::Tactical);
    }
}

#[test]
fn test_reasons_name_terrain_on_both_sides() {
    let registry = registry();
    let prediction = registry
        .predict("zuko", "katara", "north_pole", Some(1))
        .unwrap();
    assert!(prediction
        .outcome_reasons
        .iter()
        .any(|r| matches!(r, OutcomeReason::TerrainWeakness { fighter_id, .. } if fighter_id == "zuko")));
    assert!(prediction
        .outcome_reasons
        .iter()
        .any(|r| matches!(r, OutcomeReason::TerrainStrength { fighter_id, .. } if fighter_id == "katara")));
    assert_eq!(prediction.winner_id, "katara");
}

#[test]
fn test_family_matchup_is_bittersweet() {
    let registry = registry();
    let prediction = registry.predict("iroh", "zuko", "fire_nation_palace", Some(3)).unwrap();
    assert_eq!(prediction.resolution_tone, ResolutionTone::Bittersweet);
    assert_eq!(prediction.resolution_tone.quote_pool(), "bittersweet_farewells");
}

#[test]
fn test_same_seed_same_prediction() {
    let registry = registry();
    let a = registry.predict("aang", "azula", "western_air_temple", Some(42)).unwrap();
    let b = registry.predict("aang", "azula", "western_air_temple", Some(42)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_ids() {
    let registry = registry();
    assert!(matches!(
        registry.predict("bumi", "aang", "ba_sing_se", None),
        Err(SimError::UnknownFighter(id)) if id == "bumi"
    ));
    assert!(matches!(
        registry.predict("aang", "toph", "omashu", None),
        Err(SimError::UnknownLocation(id)) if id == "omashu"
    ));
}

#[test]
fn test_prediction_serializes() {
    let registry = registry();
    let prediction = registry.predict("ty_lee", "azula", "ba_sing_se", Some(8)).unwrap();
    let json = serde_json::to_value(&prediction).unwrap();
    assert!(json["win_prob"].as_u64().unwrap() >= 50);
    assert!(json["outcome_reasons"].is_array());
    assert!(json["victory_type"].is_string());
}
