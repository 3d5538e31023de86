//! Directed, typed, confidence-scored edges between entities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Confidence;

/// Edge label used for "ingredient contains compound/nutrient".
pub const CONTAINS: &str = "contains";
/// Edge label used for "compound/nutrient found in something".
pub const FOUND_IN: &str = "found_in";

/// Conditions under which a relationship holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipContext {
    /// Preparation state, e.g. "raw" or "cooked".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub mechanisms: Vec<String>,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl RelationshipContext {
    /// Look up a context field by key: `state`, or any `params` entry.
    pub fn field(&self, key: &str) -> Option<serde_json::Value> {
        if key == "state" {
            return self.state.clone().map(serde_json::Value::String);
        }
        self.params.get(key).cloned()
    }
}

/// Statistical uncertainty on a quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Uncertainty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A directed edge `source_id → target_id`.
///
/// `id == 0` means "unassigned"; the relationship store allocates ids on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub id: u64,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub context: RelationshipContext,
    #[serde(default)]
    pub uncertainty: Uncertainty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,
    #[serde(default)]
    pub confidence_score: Confidence,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// A new edge with default confidence and no quantity or context.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            quantity: None,
            unit: None,
            context: RelationshipContext::default(),
            uncertainty: Uncertainty::default(),
            source_reference: None,
            confidence_score: Confidence::DEFAULT,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence_score = confidence;
        self
    }

    pub fn with_quantity(mut self, quantity: f64, unit: Option<&str>) -> Self {
        self.quantity = Some(quantity);
        self.unit = unit.map(str::to_string);
        self
    }

    pub fn with_context(mut self, context: RelationshipContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_uncertainty(mut self, uncertainty: Uncertainty) -> Self {
        self.uncertainty = uncertainty;
        self
    }

    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = Some(reference.into());
        self
    }

    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// "5 mg", "5" without a unit, "unknown" without a quantity.
    pub fn quantity_with_unit(&self) -> String {
        match (self.quantity, self.unit.as_deref()) {
            (Some(q), Some(u)) => format!("{q} {u}"),
            (Some(q), None) => q.to_string(),
            (None, _) => "unknown".to_string(),
        }
    }

    pub fn is_contains(&self) -> bool {
        self.relationship_type == CONTAINS
    }

    pub fn is_found_in(&self) -> bool {
        self.relationship_type == FOUND_IN
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} --{}--> {}",
            self.source_id, self.relationship_type, self.target_id
        )
    }
}
