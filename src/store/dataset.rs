//! JSON dataset files: `{ "entities": [...], "relationships": [...] }`.
//!
//! Loading is where stored data is normalised. Legacy outcome bags are
//! migrated by the model's deserializer, and every outcome's pillars are then
//! recomputed from its text so records written under an older keyword table
//! agree with the current classifier.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Entity, Relationship};

use super::mem::{MemEntityStore, MemRelationshipStore};
use super::{CoarseFilter, EntityStore, RelationshipStore, StoreResult};

/// A complete graph, as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Dataset {
    /// Parse a dataset from JSON text and normalise it.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        let mut dataset: Dataset =
            serde_json::from_str(text).map_err(|e| StoreError::Serialization {
                message: e.to_string(),
            })?;
        let reclassified = dataset.normalize();
        if reclassified > 0 {
            tracing::info!(reclassified, "recomputed stale health-outcome pillars");
        }
        Ok(dataset)
    }

    /// Read and parse a dataset file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            entities = dataset.entities.len(),
            relationships = dataset.relationships.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Write the dataset as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "dataset saved");
        Ok(())
    }

    /// Recompute every outcome's pillars. Returns the number of records changed.
    pub fn normalize(&mut self) -> usize {
        self.entities
            .iter_mut()
            .filter_map(Entity::as_ingredient_mut)
            .map(|data| data.reclassify())
            .sum()
    }

    /// Populate fresh in-memory stores, preserving file order.
    pub fn into_stores(self) -> StoreResult<(MemEntityStore, MemRelationshipStore)> {
        let entities = MemEntityStore::from_entities(self.entities)?;
        let relationships = MemRelationshipStore::from_relationships(self.relationships)?;
        Ok((entities, relationships))
    }

    /// Capture the full contents of a pair of stores, inactive entities included.
    pub fn from_stores(entities: &dyn EntityStore, relationships: &dyn RelationshipStore) -> Self {
        let all = CoarseFilter {
            include_inactive: true,
            ..Default::default()
        };
        Self {
            entities: entities.scan(&all),
            relationships: relationships.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::HealthPillar;

    const SAMPLE: &str = r#"{
        "entities": [
            {
                "id": "turmeric",
                "name": "Turmeric",
                "primary_classification": "ingredient",
                "health_outcomes": {"value": ["Anti-inflammatory"]}
            },
            {
                "id": "ginger",
                "name": "Ginger",
                "primary_classification": "ingredient",
                "health_outcomes": [
                    {"outcome": "Supports digestion", "confidence": 4, "pillars": [1], "added_at": "2024-05-01T00:00:00Z"}
                ]
            },
            {"id": "curcumin", "name": "Curcumin", "primary_classification": "compound"}
        ],
        "relationships": [
            {"source_id": "turmeric", "target_id": "curcumin", "relationship_type": "contains", "confidence_score": 4}
        ]
    }"#;

    #[test]
    fn load_migrates_and_reclassifies() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(ds.entities.len(), 3);

        let turmeric = ds.entities[0].as_ingredient().unwrap();
        assert_eq!(turmeric.health_outcomes.len(), 1);
        assert_eq!(turmeric.health_outcomes[0].confidence.get(), 3);
        assert!(turmeric.health_outcomes[0].pillars.contains(&HealthPillar::Inflammation));

        let ginger = ds.entities[1].as_ingredient().unwrap();
        let pillars: Vec<u8> = ginger.health_outcomes[0].pillars.iter().map(|p| p.id()).collect();
        assert_eq!(pillars, vec![2]);
    }

    #[test]
    fn stale_pillar_ids_do_not_reject_the_dataset() {
        let json = r#"{"entities": [{
            "id": "kale", "name": "Kale", "primary_classification": "ingredient",
            "health_outcomes": [
                {"outcome": "Boosts immunity", "confidence": 4, "pillars": [9], "added_at": "2024-01-01T00:00:00Z"}
            ]
        }]}"#;
        let ds = Dataset::from_json(json).unwrap();
        let kale = ds.entities[0].as_ingredient().unwrap();
        assert!(kale.health_outcomes[0].pillars.contains(&HealthPillar::Immunity));
        assert_eq!(kale.health_outcomes[0].pillars.len(), 1);
    }

    #[test]
    fn bad_confidence_is_reported_by_name() {
        let json = r#"{"entities": [{
            "id": "kale", "name": "Kale", "primary_classification": "ingredient",
            "health_outcomes": [
                {"outcome": "Boosts immunity", "confidence": 7, "added_at": "2024-01-01T00:00:00Z"}
            ]
        }]}"#;
        let StoreError::Serialization { message } = Dataset::from_json(json).unwrap_err() else {
            panic!("expected a serialization error");
        };
        assert!(message.contains("confidence 7"), "{message}");
        assert!(!message.contains("untagged"), "{message}");
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = Dataset::from_json("{\"entities\": 5}").unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[test]
    fn save_and_reload_through_stores() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.json");

        let (entities, relationships) = Dataset::from_json(SAMPLE).unwrap().into_stores().unwrap();
        entities.deactivate("ginger").unwrap();
        Dataset::from_stores(&entities, &relationships)
            .save(&path)
            .unwrap();

        let back = Dataset::load(&path).unwrap();
        assert_eq!(back.entities.len(), 3);
        assert_eq!(back.relationships.len(), 1);
        assert_eq!(back.relationships[0].id, 1);
        assert!(!back.entities[1].is_active);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Dataset::load(Path::new("/nonexistent/nutri/graph.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
