//! Pre-battle win probability
//!
//! Each side starts from a base modifier. The tier gap adds `5*gap + gap^2`
//! to the higher tier and takes the same from the lower; every terrain tag
//! matching a fighter's strengths (weaknesses) adds (subtracts) 10 for that
//! fighter only. Each side then gets uniform noise of +/-5 and a floor of 1
//! before the two are normalized to percentages.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    BASE_WIN_MODIFIER, MIN_WIN_SCORE, TERRAIN_MODIFIER, TIER_GAP_LINEAR, WIN_NOISE,
};
use crate::battle::environment::Location;
use crate::battle::fighter::Fighter;
use crate::battle::rng::{BattleRng, DrawPurpose};
use crate::core::error::ErrorCause;
use crate::core::types::FighterId;
use crate::prediction::victory::{classify_tone, classify_victory, ResolutionTone, VictoryType};

/// Why the prediction leans the way it does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeReason {
    TierAdvantage { fighter_id: FighterId, gap: u8 },
    TerrainStrength { fighter_id: FighterId, tag: String },
    TerrainWeakness { fighter_id: FighterId, tag: String },
    EvenMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinPrediction {
    pub winner_id: FighterId,
    /// Winner's probability, 50..=100
    pub win_prob: u8,
    pub f1_prob: u8,
    pub f2_prob: u8,
    pub victory_type: VictoryType,
    pub resolution_tone: ResolutionTone,
    pub outcome_reasons: Vec<OutcomeReason>,
}

/// Modifier contributed by the tier gap
pub fn tier_contribution(gap: u8) -> f32 {
    let gap = gap as f32;
    TIER_GAP_LINEAR * gap + gap * gap
}

/// Deterministic modifiers for both sides, before noise
pub fn base_modifiers(f1: &Fighter, f2: &Fighter, location: &Location) -> ([f32; 2], Vec<OutcomeReason>) {
    let mut modifiers = [BASE_WIN_MODIFIER; 2];
    let mut reasons = Vec::new();

    let (t1, t2) = (f1.traits.tier, f2.traits.tier);
    let gap = t1.abs_diff(t2);
    if gap > 0 {
        let contribution = tier_contribution(gap);
        let (higher, lower, leader) = if t1 > t2 { (0, 1, f1) } else { (1, 0, f2) };
        modifiers[higher] += contribution;
        modifiers[lower] -= contribution;
        reasons.push(OutcomeReason::TierAdvantage {
            fighter_id: leader.id.clone(),
            gap,
        });
    }

    for (i, fighter) in [f1, f2].into_iter().enumerate() {
        for tag in &fighter.traits.strengths {
            if location.has_tag(tag) {
                modifiers[i] += TERRAIN_MODIFIER;
                reasons.push(OutcomeReason::TerrainStrength {
                    fighter_id: fighter.id.clone(),
                    tag: tag.clone(),
                });
            }
        }
        for tag in &fighter.traits.weaknesses {
            if location.has_tag(tag) {
                modifiers[i] -= TERRAIN_MODIFIER;
                reasons.push(OutcomeReason::TerrainWeakness {
                    fighter_id: fighter.id.clone(),
                    tag: tag.clone(),
                });
            }
        }
    }

    if reasons.is_empty() {
        reasons.push(OutcomeReason::EvenMatch);
    }
    (modifiers, reasons)
}

/// Predict the winner of `f1` vs `f2` at `location`
///
/// `relationship` (0..1) only affects the resolution tone. Noise comes from
/// two `win_noise` draws, first fighter first. The noise draws are not
/// logged anywhere, so they are dropped from `rng`'s buffer again.
pub fn calculate_win_probability(
    f1: &Fighter,
    f2: &Fighter,
    location: &Location,
    relationship: Option<f32>,
    rng: &mut BattleRng,
) -> Result<WinPrediction, ErrorCause> {
    let (modifiers, outcome_reasons) = base_modifiers(f1, f2, location);

    let mark = rng.recorded_len();
    let mut scores = [0.0f32; 2];
    for (score, modifier) in scores.iter_mut().zip(modifiers) {
        let noise = rng.range(DrawPurpose::WinNoise, -WIN_NOISE as f64, WIN_NOISE as f64)? as f32;
        *score = (modifier + noise).max(MIN_WIN_SCORE);
    }
    rng.discard_recorded_after(mark);

    let f1_prob = (100.0 * scores[0] / (scores[0] + scores[1])).round() as u8;
    let f2_prob = 100 - f1_prob;

    let (winner, loser, win_prob) = if f1_prob >= 50 {
        (f1, f2, f1_prob)
    } else {
        (f2, f1, f2_prob)
    };

    let victory_type = classify_victory(winner, loser, win_prob);
    let resolution_tone = classify_tone(victory_type, win_prob, relationship);

    tracing::debug!(
        "Prediction {} vs {}: {}% / {}% ({:?}, {:?})",
        f1.id,
        f2.id,
        f1_prob,
        f2_prob,
        victory_type,
        resolution_tone
    );

    Ok(WinPrediction {
        winner_id: winner.id.clone(),
        win_prob,
        f1_prob,
        f2_prob,
        victory_type,
        resolution_tone,
        outcome_reasons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fighter::CharacterTraits;
    use crate::battle::moves::Element;
    use crate::battle::rng::RandomDraw;
    use proptest::prelude::*;

    fn tiered(id: &str, tier: u8, strengths: &[&str], weaknesses: &[&str]) -> Fighter {
        Fighter::new(id, id, Element::Earth).with_traits(CharacterTraits {
            tier,
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_tier_contribution_is_quadratic() {
        assert_eq!(tier_contribution(0), 0.0);
        assert_eq!(tier_contribution(1), 6.0);
        assert_eq!(tier_contribution(2), 14.0);
        assert_eq!(tier_contribution(4), 36.0);
    }

    #[test]
    fn test_base_modifiers_with_terrain() {
        let a = tiered("a", 8, &["vertical"], &[]);
        let b = tiered("b", 6, &[], &["vertical"]);
        let (modifiers, reasons) = base_modifiers(&a, &b, &Location::new("cliffs", &["vertical"]));
        assert_eq!(modifiers, [74.0, 26.0]);
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn test_terrain_only_affects_owner() {
        let a = tiered("a", 5, &["water"], &[]);
        let b = tiered("b", 5, &[], &[]);
        let (modifiers, _) = base_modifiers(&a, &b, &Location::new("lake", &["water"]));
        assert_eq!(modifiers, [60.0, 50.0]);
    }

    #[test]
    fn test_even_match_reason() {
        let a = tiered("a", 5, &[], &[]);
        let b = tiered("b", 5, &[], &[]);
        let (_, reasons) = base_modifiers(&a, &b, &Location::new("field", &[]));
        assert_eq!(reasons, vec![OutcomeReason::EvenMatch]);
    }

    #[test]
    fn test_favorite_wins_most_predictions() {
        let a = tiered("a", 8, &["vertical"], &[]);
        let b = tiered("b", 6, &[], &["vertical"]);
        let location = Location::new("cliffs", &["vertical"]);
        let mut rng = BattleRng::seeded(2024);

        let mut strong = 0;
        for _ in 0..1000 {
            let prediction = calculate_win_probability(&a, &b, &location, None, &mut rng).unwrap();
            assert_eq!(prediction.winner_id, "a");
            if prediction.win_prob > 70 {
                strong += 1;
            }
        }
        assert!(strong > 800, "only {} / 1000 above 70%", strong);
    }

    #[test]
    fn test_identical_tiers_stay_close() {
        let a = tiered("a", 5, &[], &[]);
        let b = tiered("b", 5, &[], &[]);
        let location = Location::new("field", &[]);
        let mut rng = BattleRng::seeded(11);
        for _ in 0..1000 {
            let prediction = calculate_win_probability(&a, &b, &location, None, &mut rng).unwrap();
            assert!((50..=55).contains(&prediction.win_prob));
        }
    }

    #[test]
    fn test_noise_uses_two_draws() {
        let a = tiered("a", 5, &[], &[]);
        let b = tiered("b", 3, &[], &[]);
        let draws = vec![
            RandomDraw { purpose: DrawPurpose::WinNoise, value: 0.5 },
            RandomDraw { purpose: DrawPurpose::WinNoise, value: 0.5 },
        ];
        let mut rng = BattleRng::replaying(5, draws);
        calculate_win_probability(&a, &b, &Location::new("field", &[]), None, &mut rng).unwrap();
        assert_eq!(rng.remaining_replay(), 0);
    }

    #[test]
    fn test_repeated_predictions_leave_no_buffered_draws() {
        let a = tiered("a", 5, &[], &[]);
        let b = tiered("b", 3, &[], &[]);
        let location = Location::new("field", &[]);
        let mut rng = BattleRng::seeded(5);
        rng.unit(DrawPurpose::HitRoll).unwrap();
        for _ in 0..100 {
            calculate_win_probability(&a, &b, &location, None, &mut rng).unwrap();
        }
        let kept = rng.take_recorded();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].purpose, DrawPurpose::HitRoll);
    }

    proptest! {
        #[test]
        fn prop_probabilities_sum_to_100(
            t1 in 0u8..=10,
            t2 in 0u8..=10,
            seed in any::<u64>(),
        ) {
            let a = tiered("a", t1, &[], &[]);
            let b = tiered("b", t2, &[], &[]);
            let mut rng = BattleRng::seeded(seed);
            let p = calculate_win_probability(&a, &b, &Location::new("field", &[]), None, &mut rng).unwrap();
            prop_assert_eq!(p.f1_prob as u16 + p.f2_prob as u16, 100);
            prop_assert!(p.win_prob >= 50);
            prop_assert!(p.win_prob == p.f1_prob.max(p.f2_prob));
        }
    }
}
