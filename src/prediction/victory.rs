//! Victory type and resolution tone classification
//!
//! Both are ordered rule lists: the first matching rule wins.

use serde::{Deserialize, Serialize};

use crate::battle::fighter::Fighter;

const CHI_BLOCKING: &str = "chi_blocking";
const STRATEGIST_ROLES: [&str; 2] = ["tactician", "mentor_strategist"];
const TANK_DISABLER: &str = "tank_disabler";
const RELUCTANT_TONES: [&str; 2] = ["reluctant", "pacifistic"];

/// Relationship strength at which every outcome reads as bittersweet
pub const BITTERSWEET_RELATIONSHIP: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryType {
    DisablingStrike,
    Overwhelm,
    Outsmart,
    TerrainKill,
    MoraleBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTone {
    Bittersweet,
    Merciful,
    Clinical,
    Cunning,
    Tactical,
    Dominant,
    HardFought,
    Decisive,
}

impl ResolutionTone {
    /// Narrative quote pool the presentation layer draws from
    pub fn quote_pool(self) -> &'static str {
        match self {
            ResolutionTone::Bittersweet => "bittersweet_farewells",
            ResolutionTone::Merciful => "merciful_restraint",
            ResolutionTone::Clinical => "clinical_precision",
            ResolutionTone::Cunning => "cunning_gambits",
            ResolutionTone::Tactical => "tactical_mastery",
            ResolutionTone::Dominant => "dominant_displays",
            ResolutionTone::HardFought => "hard_fought_struggles",
            ResolutionTone::Decisive => "decisive_blows",
        }
    }
}

/// How the predicted winner wins
pub fn classify_victory(winner: &Fighter, loser: &Fighter, win_prob: u8) -> VictoryType {
    let traits = &winner.traits;
    let role = traits.role.as_deref().unwrap_or_default();

    if traits.fighting_style.as_deref() == Some(CHI_BLOCKING) && loser.element.is_bending() {
        VictoryType::DisablingStrike
    } else if win_prob >= 90 {
        VictoryType::Overwhelm
    } else if STRATEGIST_ROLES.contains(&role) {
        VictoryType::Outsmart
    } else if role == TANK_DISABLER {
        VictoryType::TerrainKill
    } else if traits
        .tone
        .iter()
        .any(|t| RELUCTANT_TONES.contains(&t.as_str()))
    {
        VictoryType::MoraleBreak
    } else {
        VictoryType::Overwhelm
    }
}

/// Tone of the ending, from victory type, probability and relationship
pub fn classify_tone(victory: VictoryType, win_prob: u8, relationship: Option<f32>) -> ResolutionTone {
    if relationship.is_some_and(|r| r >= BITTERSWEET_RELATIONSHIP) {
        return ResolutionTone::Bittersweet;
    }
    match victory {
        VictoryType::MoraleBreak => ResolutionTone::Merciful,
        VictoryType::DisablingStrike => ResolutionTone::Clinical,
        VictoryType::Outsmart => ResolutionTone::Cunning,
        VictoryType::TerrainKill => ResolutionTone::Tactical,
        VictoryType::Overwhelm if win_prob >= 90 => ResolutionTone::Dominant,
        VictoryType::Overwhelm if win_prob < 65 => ResolutionTone::HardFought,
        VictoryType::Overwhelm => ResolutionTone::Decisive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fighter::CharacterTraits;
    use crate::battle::moves::Element;

    fn with_traits(id: &str, element: Element, traits: CharacterTraits) -> Fighter {
        Fighter::new(id, id, element).with_traits(traits)
    }

    #[test]
    fn test_chi_blocker_beats_bender_clinically() {
        let ty_lee = with_traits(
            "ty_lee",
            Element::Nonbending,
            CharacterTraits {
                fighting_style: Some("chi_blocking".into()),
                ..Default::default()
            },
        );
        let azula = with_traits("azula", Element::Fire, CharacterTraits::default());
        let victory = classify_victory(&ty_lee, &azula, 95);
        assert_eq!(victory, VictoryType::DisablingStrike);
        assert_eq!(classify_tone(victory, 95, None), ResolutionTone::Clinical);
    }

    #[test]
    fn test_chi_blocker_against_nonbender_falls_through() {
        let ty_lee = with_traits(
            "ty_lee",
            Element::Nonbending,
            CharacterTraits {
                fighting_style: Some("chi_blocking".into()),
                ..Default::default()
            },
        );
        let sokka = with_traits("sokka", Element::Nonbending, CharacterTraits::default());
        assert_eq!(classify_victory(&ty_lee, &sokka, 70), VictoryType::Overwhelm);
    }

    #[test]
    fn test_rule_order() {
        let loser = with_traits("loser", Element::Earth, CharacterTraits::default());
        let strategist = with_traits(
            "iroh",
            Element::Fire,
            CharacterTraits {
                role: Some("mentor_strategist".into()),
                ..Default::default()
            },
        );
        assert_eq!(classify_victory(&strategist, &loser, 92), VictoryType::Overwhelm);
        assert_eq!(classify_victory(&strategist, &loser, 70), VictoryType::Outsmart);

        let tank = with_traits(
            "bumi",
            Element::Earth,
            CharacterTraits {
                role: Some("tank_disabler".into()),
                ..Default::default()
            },
        );
        assert_eq!(classify_victory(&tank, &loser, 70), VictoryType::TerrainKill);

        let reluctant = with_traits(
            "aang",
            Element::Air,
            CharacterTraits {
                tone: vec!["playful".into(), "pacifistic".into()],
                ..Default::default()
            },
        );
        assert_eq!(classify_victory(&reluctant, &loser, 70), VictoryType::MoraleBreak);
    }

    #[test]
    fn test_overwhelm_tones_by_probability() {
        assert_eq!(classify_tone(VictoryType::Overwhelm, 95, None), ResolutionTone::Dominant);
        assert_eq!(classify_tone(VictoryType::Overwhelm, 60, None), ResolutionTone::HardFought);
        assert_eq!(classify_tone(VictoryType::Overwhelm, 75, Some(0.2)), ResolutionTone::Decisive);
    }

    #[test]
    fn test_close_relationship_is_bittersweet() {
        let tone = classify_tone(VictoryType::MoraleBreak, 80, Some(0.9));
        assert_eq!(tone, ResolutionTone::Bittersweet);
        assert_eq!(tone.quote_pool(), "bittersweet_farewells");
    }
}
