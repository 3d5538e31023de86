//! The engine's write operations: ingredient upserts and deactivation.
//!
//! Each call touches exactly one entity through [`EntityStore::update`], so a
//! failure leaves the stored record as it was.
//!
//! [`EntityStore::update`]: crate::store::EntityStore::update

use chrono::Utc;

use crate::error::{QueryError, QueryResult, StoreError};
use crate::model::{Confidence, UpsertOutcome};

use super::GraphSearchEngine;

fn not_found(id: &str, err: StoreError) -> QueryError {
    match err {
        StoreError::EntityNotFound { .. } => QueryError::NotFound { id: id.to_string() },
        other => other.into(),
    }
}

impl GraphSearchEngine {
    /// Insert or update a health outcome on an ingredient.
    ///
    /// Pillars are recomputed from `outcome`. Repeating the call with the same
    /// arguments is a no-op.
    pub fn upsert_health_outcome(
        &self,
        entity_id: &str,
        outcome: &str,
        confidence: Confidence,
    ) -> QueryResult<UpsertOutcome> {
        if outcome.trim().is_empty() {
            return Err(QueryError::invalid("outcome", "outcome text is empty"));
        }
        let mut result = UpsertOutcome::Unchanged;
        self.entities
            .update(entity_id, &mut |entity| {
                let now = Utc::now();
                let data = entity.require_ingredient_mut()?;
                result = data.upsert_health_outcome(outcome, confidence, now);
                let changed = result != UpsertOutcome::Unchanged;
                if changed {
                    entity.updated_at = now;
                }
                Ok(changed)
            })
            .map_err(|e| not_found(entity_id, e))?;
        tracing::info!(entity = entity_id, outcome, ?result, "health outcome upsert");
        Ok(result)
    }

    /// Insert or update a compound entry on an ingredient.
    pub fn upsert_compound(
        &self,
        entity_id: &str,
        compound_id: &str,
        quantity: Option<String>,
        unit: Option<String>,
    ) -> QueryResult<UpsertOutcome> {
        if compound_id.trim().is_empty() {
            return Err(QueryError::invalid("compound_id", "compound id is empty"));
        }
        let mut result = UpsertOutcome::Unchanged;
        self.entities
            .update(entity_id, &mut |entity| {
                let now = Utc::now();
                let data = entity.require_ingredient_mut()?;
                result = data.upsert_compound(compound_id, quantity.clone(), unit.clone(), now);
                let changed = result != UpsertOutcome::Unchanged;
                if changed {
                    entity.updated_at = now;
                }
                Ok(changed)
            })
            .map_err(|e| not_found(entity_id, e))?;
        tracing::info!(entity = entity_id, compound = compound_id, ?result, "compound upsert");
        Ok(result)
    }

    /// Mark an entity inactive. Returns `false` if it already was.
    pub fn deactivate(&self, entity_id: &str) -> QueryResult<bool> {
        let changed = self
            .entities
            .deactivate(entity_id)
            .map_err(|e| not_found(entity_id, e))?;
        if changed {
            tracing::info!(entity = entity_id, "entity deactivated");
        }
        Ok(changed)
    }

    /// Resolve a user-supplied reference: exact id, then case-insensitive
    /// name, then alias. Inactive entities resolve only by id.
    pub fn resolve(&self, name_or_id: &str) -> QueryResult<crate::model::Entity> {
        if let Some(e) = self.entities.get(name_or_id) {
            return Ok(e);
        }
        let needle = name_or_id.trim().to_lowercase();
        let active = self.entities.scan(&Default::default());
        active
            .iter()
            .find(|e| e.name.to_lowercase() == needle)
            .or_else(|| {
                active
                    .iter()
                    .find(|e| e.aliases.iter().any(|a| a.to_lowercase() == needle))
            })
            .cloned()
            .ok_or_else(|| QueryError::NotFound {
                id: name_or_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::search::fixtures::{self, conf};

    #[test]
    fn upsert_is_idempotent_through_the_store() {
        let engine = fixtures::engine();
        let first = engine
            .upsert_health_outcome("turmeric", "Supports joint health", conf(4))
            .unwrap();
        assert_eq!(first, UpsertOutcome::Inserted);
        let snapshot = engine.get_entity("turmeric").unwrap();
        let again = engine
            .upsert_health_outcome("turmeric", "Supports joint health", conf(4))
            .unwrap();
        assert_eq!(again, UpsertOutcome::Unchanged);
        assert_eq!(engine.get_entity("turmeric").unwrap(), snapshot);
    }

    #[test]
    fn existing_outcome_updates_in_place() {
        let engine = fixtures::engine();
        let r = engine
            .upsert_health_outcome("turmeric", "Anti-inflammatory", conf(5))
            .unwrap();
        assert_eq!(r, UpsertOutcome::Updated);
        let e = engine.get_entity("turmeric").unwrap();
        let outcomes = &e.as_ingredient().unwrap().health_outcomes;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].confidence.get(), 5);
    }

    #[test]
    fn non_ingredient_rejected_without_change() {
        let engine = fixtures::engine();
        let before = engine.get_entity("curcumin").unwrap();
        let err = engine
            .upsert_health_outcome("curcumin", "Anti-inflammatory", conf(3))
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Store(StoreError::Model(ModelError::NotAnIngredient { .. }))
        ));
        assert_eq!(engine.get_entity("curcumin").unwrap(), before);
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.upsert_health_outcome("ghost", "Anything", conf(3)),
            Err(QueryError::NotFound { .. })
        ));
        assert!(matches!(
            engine.upsert_compound("ghost", "curcumin", None, None),
            Err(QueryError::NotFound { .. })
        ));
    }

    #[test]
    fn compound_upsert() {
        let engine = fixtures::engine();
        assert_eq!(
            engine
                .upsert_compound("kale", "lutein", Some("6".into()), Some("mg".into()))
                .unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            engine
                .upsert_compound("kale", "lutein", Some("6".into()), Some("mg".into()))
                .unwrap(),
            UpsertOutcome::Unchanged
        );
        let e = engine.get_entity("kale").unwrap();
        assert!(e.as_ingredient().unwrap().has_compound("lutein"));
    }

    #[test]
    fn resolve_by_id_name_alias() {
        let engine = fixtures::engine();
        engine
            .entity_store()
            .update("kale", &mut |e| Ok(e.add_alias("borecole")))
            .unwrap();
        assert_eq!(engine.resolve("kale").unwrap().id, "kale");
        assert_eq!(engine.resolve("vitamin c").unwrap().id, "vitamin_c");
        assert_eq!(engine.resolve("Borecole").unwrap().id, "kale");
        assert!(matches!(
            engine.resolve("nothing"),
            Err(QueryError::NotFound { .. })
        ));
    }

    #[test]
    fn deactivate_reports_change() {
        let engine = fixtures::engine();
        assert!(engine.deactivate("apple").unwrap());
        assert!(!engine.deactivate("apple").unwrap());
        assert!(!engine.get_entity("apple").unwrap().is_active);
        assert!(engine.deactivate("ghost").is_err());
    }
}
