//! Autocomplete: ranked entity suggestions for a partial name.

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::model::{Classification, Entity};
use crate::store::CoarseFilter;

use super::GraphSearchEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub primary_classification: Classification,
    pub classifications: Vec<String>,
}

impl From<&Entity> for Suggestion {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            primary_classification: e.primary_classification(),
            classifications: e.classifications.iter().cloned().collect(),
        }
    }
}

/// Rank tier for a match: 1 = name prefix, 2 = name substring, 3 = id only.
fn tier(name_lower: &str, needle: &str) -> u8 {
    if name_lower.starts_with(needle) {
        1
    } else if name_lower.contains(needle) {
        2
    } else {
        3
    }
}

impl GraphSearchEngine {
    /// Active entities whose name or id contains `query`, best matches first.
    ///
    /// Within a tier, names sort alphabetically (case-insensitive), then by id.
    pub fn suggest(
        &self,
        query: &str,
        entity_type: Option<Classification>,
        limit: usize,
    ) -> QueryResult<Vec<Suggestion>> {
        let needle = query.trim().to_lowercase();
        let len = needle.chars().count();
        if len == 0 || len > self.config.max_query_length {
            return Err(QueryError::invalid(
                "query",
                format!(
                    "length must be within 1..={} characters",
                    self.config.max_query_length
                ),
            ));
        }
        if limit == 0 || limit > self.config.max_suggestions {
            return Err(QueryError::invalid(
                "limit",
                format!(
                    "{limit} is outside the allowed range 1..={}",
                    self.config.max_suggestions
                ),
            ));
        }

        let candidates = self.entities.scan(&CoarseFilter {
            primary_classification: entity_type,
            text: Some(needle.clone()),
            ..Default::default()
        });

        let mut ranked: Vec<(u8, String, &Entity)> = candidates
            .iter()
            .map(|e| {
                let name_lower = e.name.to_lowercase();
                (tier(&name_lower, &needle), name_lower, e)
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });

        let out: Vec<Suggestion> = ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, e)| Suggestion::from(e))
            .collect();
        tracing::debug!(query, matched = candidates.len(), returned = out.len(), "suggest");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::search::fixtures;
    use crate::store::{EntityStore, MemEntityStore, MemRelationshipStore, RelationshipStore};

    fn engine_with(entities: Vec<Entity>) -> GraphSearchEngine {
        let store = MemEntityStore::from_entities(entities).unwrap();
        let entities: Arc<dyn EntityStore> = Arc::new(store);
        let rels: Arc<dyn RelationshipStore> = Arc::new(MemRelationshipStore::new());
        GraphSearchEngine::new(entities, rels, EngineConfig::default())
    }

    #[test]
    fn prefix_beats_substring_beats_id() {
        let engine = engine_with(vec![
            Entity::ingredient("ing_ab_1", "Zucchini"),
            Entity::ingredient("crab", "Crabapple"),
            Entity::ingredient("abacus", "Abacus"),
        ]);
        let names: Vec<String> = engine
            .suggest("ab", None, 10)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Abacus", "Crabapple", "Zucchini"]);
    }

    #[test]
    fn ties_broken_alphabetically() {
        let engine = engine_with(vec![
            Entity::ingredient("g2", "Ginseng"),
            Entity::ingredient("g1", "Ginger"),
            Entity::ingredient("g3", "ginkgo"),
        ]);
        let names: Vec<String> = engine
            .suggest("gin", None, 10)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Ginger", "ginkgo", "Ginseng"]);
    }

    #[test]
    fn type_filter_and_limit() {
        let engine = fixtures::engine();
        let all = engine.suggest("ginger", None, 10).unwrap();
        assert_eq!(all.len(), 2);
        let compounds = engine
            .suggest("ginger", Some(Classification::Compound), 10)
            .unwrap();
        assert_eq!(compounds.len(), 1);
        assert_eq!(compounds[0].id, "gingerol");
        assert_eq!(engine.suggest("i", None, 3).unwrap().len(), 3);
    }

    #[test]
    fn inactive_entities_are_not_suggested() {
        let engine = fixtures::engine();
        engine.entity_store().deactivate("kale").unwrap();
        assert!(engine.suggest("kale", None, 5).unwrap().is_empty());
    }

    #[test]
    fn bad_query_or_limit_rejected() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.suggest("  ", None, 5),
            Err(QueryError::InvalidFilter { .. })
        ));
        assert!(engine.suggest(&"x".repeat(101), None, 5).is_err());
        assert!(engine.suggest("kale", None, 0).is_err());
        assert!(engine.suggest("kale", None, 21).is_err());
    }

    #[test]
    fn serializes_type_field() {
        let engine = fixtures::engine();
        let s = engine.suggest("curc", None, 1).unwrap();
        let v = serde_json::to_value(&s[0]).unwrap();
        assert_eq!(v["type"], "compound");
        assert_eq!(v["classifications"], serde_json::json!(["polyphenol"]));
    }
}
