//! Graph data model: entities, ingredient payloads, and relationships.
//!
//! Entities are a single record type whose classification-specific data
//! lives in a tagged [`EntityPayload`]; relationships are directed, typed,
//! confidence-scored edges between entity ids.

pub mod entity;
pub mod ingredient;
pub mod relationship;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub use entity::{
    AttributeValue, Classification, CompoundData, Entity, EntityPayload, NutrientData,
};
pub use ingredient::{CompoundRef, HealthOutcome, IngredientData, UpsertOutcome};
pub use relationship::{Relationship, RelationshipContext, Uncertainty};

/// Evidence strength on a 1–5 scale.
///
/// The range is enforced at construction and deserialization, so a held
/// `Confidence` is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    /// Confidence assigned when the source gives none.
    pub const DEFAULT: Confidence = Confidence(3);

    /// Create a confidence, returning `None` outside 1–5.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Confidence {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(ModelError::InvalidConfidence { value })
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
