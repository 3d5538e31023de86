//! Health pillars: the fixed 8-category wellness taxonomy.
//!
//! Ingredient health outcomes are tagged with pillars by the keyword
//! classifier in [`classify`]. Pillar ids are stable (1–8) and are what gets
//! serialized.

pub mod classify;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub use classify::classify;

/// One of the eight wellness categories.
///
/// Variant order matches id order, so sets of pillars iterate ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum HealthPillar {
    Energy = 1,
    Digestion = 2,
    Immunity = 3,
    Sleep = 4,
    MentalClarity = 5,
    Heart = 6,
    MuscleRecovery = 7,
    Inflammation = 8,
}

/// A sorted, duplicate-free set of pillars.
pub type PillarSet = BTreeSet<HealthPillar>;

impl HealthPillar {
    /// All pillars in id order.
    pub const ALL: [HealthPillar; 8] = [
        HealthPillar::Energy,
        HealthPillar::Digestion,
        HealthPillar::Immunity,
        HealthPillar::Sleep,
        HealthPillar::MentalClarity,
        HealthPillar::Heart,
        HealthPillar::MuscleRecovery,
        HealthPillar::Inflammation,
    ];

    /// Numeric pillar id (1–8).
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a pillar by id. Returns `None` outside 1–8.
    pub fn from_id(id: i64) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Energy => "Increased Energy",
            Self::Digestion => "Improved Digestion",
            Self::Immunity => "Enhanced Immunity",
            Self::Sleep => "Better Sleep",
            Self::MentalClarity => "Mental Clarity",
            Self::Heart => "Heart Health",
            Self::MuscleRecovery => "Muscle Recovery",
            Self::Inflammation => "Inflammation Reduction",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Energy => "Supports sustained energy levels and reduces fatigue",
            Self::Digestion => "Promotes healthy digestive function and gut health",
            Self::Immunity => "Strengthens immune system and resilience",
            Self::Sleep => "Supports quality sleep and rest",
            Self::MentalClarity => "Enhances focus, cognitive function, and brain health",
            Self::Heart => "Supports cardiovascular health and circulation",
            Self::MuscleRecovery => "Aids muscle recovery, strength, and athletic performance",
            Self::Inflammation => "Reduces inflammation and supports anti-inflammatory processes",
        }
    }
}

impl TryFrom<i64> for HealthPillar {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_id(value).ok_or(ModelError::InvalidPillar { value })
    }
}

impl From<HealthPillar> for u8 {
    fn from(p: HealthPillar) -> Self {
        p.id()
    }
}

impl std::fmt::Display for HealthPillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

/// Validate a list of raw pillar ids, rejecting the first out-of-range id.
pub fn parse_pillar_ids(ids: &[i64]) -> Result<PillarSet, ModelError> {
    ids.iter().map(|&id| HealthPillar::try_from(id)).collect()
}

/// Serializable summary of a pillar, as listed by `nutri-graph pillars`.
#[derive(Debug, Clone, Serialize)]
pub struct PillarInfo {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// All pillars with their metadata, in id order.
pub fn all_pillars() -> Vec<PillarInfo> {
    HealthPillar::ALL
        .iter()
        .map(|p| PillarInfo {
            id: p.id(),
            name: p.name(),
            description: p.description(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for p in HealthPillar::ALL {
            assert_eq!(HealthPillar::from_id(p.id() as i64), Some(p));
        }
    }

    #[test]
    fn out_of_range_ids_rejected() {
        assert_eq!(HealthPillar::from_id(0), None);
        assert_eq!(HealthPillar::from_id(9), None);
        assert_eq!(HealthPillar::from_id(-3), None);
        assert!(matches!(
            HealthPillar::try_from(99_i64),
            Err(ModelError::InvalidPillar { value: 99 })
        ));
    }

    #[test]
    fn names() {
        assert_eq!(HealthPillar::Energy.name(), "Increased Energy");
        assert_eq!(HealthPillar::Inflammation.name(), "Inflammation Reduction");
    }

    #[test]
    fn parse_pillar_ids_dedups_and_sorts() {
        let set = parse_pillar_ids(&[8, 3, 8]).unwrap();
        let ids: Vec<u8> = set.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![3, 8]);
        assert!(parse_pillar_ids(&[1, 0]).is_err());
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&HealthPillar::Heart).unwrap();
        assert_eq!(json, "6");
        let back: HealthPillar = serde_json::from_str("7").unwrap();
        assert_eq!(back, HealthPillar::MuscleRecovery);
        assert!(serde_json::from_str::<HealthPillar>("9").is_err());
    }

    #[test]
    fn all_pillars_listing() {
        let all = all_pillars();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[7].name, "Inflammation Reduction");
    }
}
