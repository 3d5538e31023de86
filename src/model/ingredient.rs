//! Ingredient payload: health outcomes and compound membership.
//!
//! Both lists are keyed collections with upsert semantics. A health
//! outcome's `pillars` are always the classifier's output for its text at the
//! time of the last write; nothing else may set them.
//!
//! Older datasets stored outcomes as `{"value": ["...", ...]}`. That shape is
//! accepted on deserialization and migrated into full records right there, so
//! the upsert path below never sees it.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pillar::{HealthPillar, PillarSet, classify};

use super::Confidence;

/// One health outcome claimed for an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthOutcome {
    pub outcome: String,
    #[serde(default)]
    pub confidence: Confidence,
    /// Derived from `outcome`. Stored ids outside 1-8 are dropped on read;
    /// loading a dataset recomputes the whole set anyway.
    #[serde(default, deserialize_with = "deserialize_stored_pillars")]
    pub pillars: PillarSet,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn deserialize_stored_pillars<'de, D>(deserializer: D) -> Result<PillarSet, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(serde_json::Value::as_i64)
        .filter_map(HealthPillar::from_id)
        .collect())
}

impl HealthOutcome {
    /// A fresh record with pillars classified from `outcome`.
    pub fn new(outcome: impl Into<String>, confidence: Confidence, now: DateTime<Utc>) -> Self {
        let outcome = outcome.into();
        let pillars = classify(&outcome);
        Self {
            outcome,
            confidence,
            pillars,
            added_at: now,
            updated_at: None,
        }
    }
}

/// A compound contained in an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundRef {
    pub compound_id: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The record already held exactly these values.
    Unchanged,
}

/// Ingredient-specific data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foodb_priority: Option<String>,
    #[serde(default, deserialize_with = "deserialize_outcomes")]
    pub health_outcomes: Vec<HealthOutcome>,
    #[serde(default)]
    pub compounds: Vec<CompoundRef>,
}

impl IngredientData {
    /// Insert or update the outcome keyed by exact `outcome` text.
    ///
    /// Pillars are recomputed from the text on every write. Repeating a call
    /// with the same arguments changes nothing, not even `updated_at`.
    pub fn upsert_health_outcome(
        &mut self,
        outcome: &str,
        confidence: Confidence,
        now: DateTime<Utc>,
    ) -> UpsertOutcome {
        let pillars = classify(outcome);
        match self.health_outcomes.iter_mut().find(|h| h.outcome == outcome) {
            Some(existing) => {
                if existing.confidence == confidence && existing.pillars == pillars {
                    return UpsertOutcome::Unchanged;
                }
                existing.confidence = confidence;
                existing.pillars = pillars;
                existing.updated_at = Some(now);
                UpsertOutcome::Updated
            }
            None => {
                self.health_outcomes.push(HealthOutcome {
                    outcome: outcome.to_string(),
                    confidence,
                    pillars,
                    added_at: now,
                    updated_at: None,
                });
                UpsertOutcome::Inserted
            }
        }
    }

    /// Insert or update the compound entry keyed by `compound_id`.
    pub fn upsert_compound(
        &mut self,
        compound_id: &str,
        quantity: Option<String>,
        unit: Option<String>,
        now: DateTime<Utc>,
    ) -> UpsertOutcome {
        match self
            .compounds
            .iter_mut()
            .find(|c| c.compound_id == compound_id)
        {
            Some(existing) => {
                if existing.quantity == quantity && existing.unit == unit {
                    return UpsertOutcome::Unchanged;
                }
                existing.quantity = quantity;
                existing.unit = unit;
                existing.updated_at = Some(now);
                UpsertOutcome::Updated
            }
            None => {
                self.compounds.push(CompoundRef {
                    compound_id: compound_id.to_string(),
                    quantity,
                    unit,
                    added_at: now,
                    updated_at: None,
                });
                UpsertOutcome::Inserted
            }
        }
    }

    /// Recompute every outcome's pillars from its text.
    ///
    /// Returns how many records changed. Used when loading data written under
    /// an older keyword table.
    pub fn reclassify(&mut self) -> usize {
        let mut changed = 0;
        for record in &mut self.health_outcomes {
            let pillars = classify(&record.outcome);
            if record.pillars != pillars {
                record.pillars = pillars;
                changed += 1;
            }
        }
        changed
    }

    /// Union of pillars across all outcomes.
    pub fn pillars(&self) -> PillarSet {
        self.health_outcomes
            .iter()
            .flat_map(|h| h.pillars.iter().copied())
            .collect()
    }

    /// Whether at least one outcome shares a pillar with `wanted`.
    pub fn supports_any(&self, wanted: &PillarSet) -> bool {
        self.health_outcomes
            .iter()
            .any(|h| !h.pillars.is_disjoint(wanted))
    }

    pub fn has_compound(&self, compound_id: &str) -> bool {
        self.compounds.iter().any(|c| c.compound_id == compound_id)
    }
}

/// Read the outcome list in either on-disk shape: a list of records, or the
/// legacy `{"value": [...]}` bag, which is migrated here.
fn deserialize_outcomes<'de, D>(deserializer: D) -> Result<Vec<HealthOutcome>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .map_err(|e| D::Error::custom(format_args!("health_outcomes[{i}]: {e}")))
            })
            .collect(),
        Some(serde_json::Value::Object(mut map)) => match map.remove("value") {
            Some(serde_json::Value::Array(values)) => Ok(migrate_legacy(&values, Utc::now())),
            _ => Err(D::Error::custom(
                "health_outcomes object must be a legacy bag with a `value` list",
            )),
        },
        Some(other) => Err(D::Error::custom(format_args!(
            "health_outcomes must be a list of records, found {other}"
        ))),
    }
}

/// Turn a legacy bag of outcome strings into full records.
///
/// Non-string entries are dropped; duplicates collapse onto the first.
pub fn migrate_legacy(values: &[serde_json::Value], now: DateTime<Utc>) -> Vec<HealthOutcome> {
    let mut data = IngredientData::default();
    for text in values.iter().filter_map(|v| v.as_str()) {
        data.upsert_health_outcome(text, Confidence::DEFAULT, now);
    }
    data.health_outcomes
}
