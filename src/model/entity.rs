//! Entity records: one node type, tagged by primary classification.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

use super::Confidence;
use super::ingredient::IngredientData;

/// Primary classification of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Ingredient,
    Nutrient,
    Compound,
    Other,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Ingredient,
        Classification::Nutrient,
        Classification::Compound,
        Classification::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ingredient => "ingredient",
            Self::Nutrient => "nutrient",
            Self::Compound => "compound",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Classification {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownClassification {
                value: s.to_string(),
            })
    }
}

/// Nutrient-specific data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Compound-specific data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
}

/// Classification-specific payload. The tag doubles as the entity's
/// `primary_classification` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "primary_classification", rename_all = "snake_case")]
pub enum EntityPayload {
    Ingredient(IngredientData),
    Nutrient(NutrientData),
    Compound(CompoundData),
    Other,
}

impl EntityPayload {
    pub fn classification(&self) -> Classification {
        match self {
            Self::Ingredient(_) => Classification::Ingredient,
            Self::Nutrient(_) => Classification::Nutrient,
            Self::Compound(_) => Classification::Compound,
            Self::Other => Classification::Other,
        }
    }

    /// An empty payload for the given classification.
    pub fn empty(classification: Classification) -> Self {
        match classification {
            Classification::Ingredient => Self::Ingredient(IngredientData::default()),
            Classification::Nutrient => Self::Nutrient(NutrientData::default()),
            Classification::Compound => Self::Compound(CompoundData::default()),
            Classification::Other => Self::Other,
        }
    }
}

/// A typed attribute value with optional provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl AttributeValue {
    /// The value as a number, accepting numeric strings ("52", "1.5").
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub classifications: BTreeSet<String>,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EntityPayload,
}

fn default_active() -> bool {
    true
}

impl Entity {
    /// Create an active entity with an empty payload for `classification`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        classification: Classification,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            slug: None,
            display_name: None,
            classifications: BTreeSet::new(),
            aliases: BTreeSet::new(),
            attributes: BTreeMap::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            payload: EntityPayload::empty(classification),
        }
    }

    pub fn ingredient(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Classification::Ingredient)
    }

    pub fn primary_classification(&self) -> Classification {
        self.payload.classification()
    }

    pub fn is_ingredient(&self) -> bool {
        matches!(self.payload, EntityPayload::Ingredient(_))
    }

    pub fn is_nutrient(&self) -> bool {
        matches!(self.payload, EntityPayload::Nutrient(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.payload, EntityPayload::Compound(_))
    }

    pub fn as_ingredient(&self) -> Option<&IngredientData> {
        match &self.payload {
            EntityPayload::Ingredient(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_ingredient_mut(&mut self) -> Option<&mut IngredientData> {
        match &mut self.payload {
            EntityPayload::Ingredient(data) => Some(data),
            _ => None,
        }
    }

    /// Ingredient payload, or [`ModelError::NotAnIngredient`].
    pub fn require_ingredient_mut(&mut self) -> Result<&mut IngredientData, ModelError> {
        let id = self.id.clone();
        self.as_ingredient_mut()
            .ok_or(ModelError::NotAnIngredient { id })
    }

    /// Add a classification tag. Returns `false` if it was already present.
    pub fn add_classification(&mut self, tag: impl Into<String>) -> bool {
        self.classifications.insert(tag.into())
    }

    pub fn has_classification(&self, tag: &str) -> bool {
        self.classifications.contains(tag)
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) -> bool {
        self.aliases.insert(alias.into())
    }

    /// Set an attribute, replacing any previous value for `key`.
    pub fn add_attribute(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
        source: Option<String>,
        confidence: Option<Confidence>,
    ) {
        self.attributes.insert(
            key.into(),
            AttributeValue {
                value,
                source,
                confidence,
            },
        );
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Numeric view of an attribute, if it holds a number or numeric string.
    pub fn numeric_attribute(&self, key: &str) -> Option<f64> {
        self.attribute(key).and_then(AttributeValue::as_f64)
    }

    /// Presentation name: `display_name` when set, otherwise `name`.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether `needle` (already lowercased) is a substring of name or id.
    pub(crate) fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}
