//! Query facade: the public surface of nutri-graph.
//!
//! `QueryFacade` owns the stores and the search engine and forwards each
//! operation to the engine, lifting errors into [`NutriError`](crate::error::NutriError). It holds no
//! business logic; transports (the CLI here, an HTTP layer elsewhere) talk to
//! this type only.

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::NutriResult;
use crate::model::{Classification, Confidence, Entity, UpsertOutcome};
use crate::pillar::{PillarInfo, PillarSet, all_pillars, classify};
use crate::search::{
    ConnectionsResult, EntityStats, FilterSpec, GraphSearchEngine, PathResult, RelationshipFilter,
    RelationshipSearchResult, RelationshipStats, SearchResult, Suggestion,
};
use crate::store::{Dataset, EntityStore, MemEntityStore, MemRelationshipStore, RelationshipStore};

pub struct QueryFacade {
    engine: GraphSearchEngine,
}

impl QueryFacade {
    /// Wrap existing stores.
    pub fn new(
        entities: Arc<dyn EntityStore>,
        relationships: Arc<dyn RelationshipStore>,
        config: EngineConfig,
    ) -> NutriResult<Self> {
        config.validate()?;
        tracing::info!(
            entities = entities.len(),
            relationships = relationships.len(),
            max_path_depth = config.max_path_depth,
            "initializing nutri-graph"
        );
        Ok(Self {
            engine: GraphSearchEngine::new(entities, relationships, config),
        })
    }

    /// An empty in-memory graph.
    pub fn in_memory(config: EngineConfig) -> NutriResult<Self> {
        Self::new(
            Arc::new(MemEntityStore::new()),
            Arc::new(MemRelationshipStore::new()),
            config,
        )
    }

    /// Load a dataset into fresh in-memory stores.
    pub fn from_dataset(dataset: Dataset, config: EngineConfig) -> NutriResult<Self> {
        let (entities, relationships) = dataset.into_stores()?;
        Self::new(Arc::new(entities), Arc::new(relationships), config)
    }

    /// Load a dataset file into fresh in-memory stores.
    pub fn open(path: &Path, config: EngineConfig) -> NutriResult<Self> {
        Self::from_dataset(Dataset::load(path)?, config)
    }

    /// Write the current graph, inactive entities included, to `path`.
    pub fn save(&self, path: &Path) -> NutriResult<()> {
        Ok(self.dataset().save(path)?)
    }

    /// A copy of the current graph.
    pub fn dataset(&self) -> Dataset {
        Dataset::from_stores(
            self.engine.entity_store().as_ref(),
            self.engine.relationship_store().as_ref(),
        )
    }

    pub fn engine(&self) -> &GraphSearchEngine {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn search(&self, filters: &FilterSpec) -> NutriResult<SearchResult> {
        Ok(self.engine.search(filters)?)
    }

    pub fn filter_by_pillars(&self, base: &FilterSpec, pillar_ids: &[i64]) -> NutriResult<SearchResult> {
        Ok(self.engine.filter_by_pillars(base, pillar_ids)?)
    }

    pub fn find_path(&self, source_id: &str, target_id: &str, max_depth: usize) -> NutriResult<PathResult> {
        Ok(self.engine.find_path(source_id, target_id, max_depth)?)
    }

    pub fn get_connections(
        &self,
        entity_id: &str,
        relationship_types: Option<&[String]>,
        max_depth: usize,
    ) -> NutriResult<ConnectionsResult> {
        Ok(self
            .engine
            .get_connections(entity_id, relationship_types, max_depth)?)
    }

    pub fn entity_statistics(&self) -> EntityStats {
        self.engine.entity_statistics()
    }

    pub fn relationship_statistics(&self) -> RelationshipStats {
        self.engine.relationship_statistics()
    }

    pub fn suggest(
        &self,
        query: &str,
        entity_type: Option<Classification>,
        limit: usize,
    ) -> NutriResult<Vec<Suggestion>> {
        Ok(self.engine.suggest(query, entity_type, limit)?)
    }

    pub fn search_relationships(&self, filter: &RelationshipFilter) -> NutriResult<RelationshipSearchResult> {
        Ok(self.engine.search_relationships(filter)?)
    }

    pub fn get_entity(&self, id: &str) -> NutriResult<Entity> {
        Ok(self.engine.get_entity(id)?)
    }

    pub fn resolve(&self, name_or_id: &str) -> NutriResult<Entity> {
        Ok(self.engine.resolve(name_or_id)?)
    }

    // ── mutations ────────────────────────────────────────────────────────

    pub fn upsert_health_outcome(
        &self,
        entity_id: &str,
        outcome: &str,
        confidence: Confidence,
    ) -> NutriResult<UpsertOutcome> {
        Ok(self
            .engine
            .upsert_health_outcome(entity_id, outcome, confidence)?)
    }

    pub fn upsert_compound(
        &self,
        entity_id: &str,
        compound_id: &str,
        quantity: Option<String>,
        unit: Option<String>,
    ) -> NutriResult<UpsertOutcome> {
        Ok(self
            .engine
            .upsert_compound(entity_id, compound_id, quantity, unit)?)
    }

    pub fn deactivate(&self, entity_id: &str) -> NutriResult<bool> {
        Ok(self.engine.deactivate(entity_id)?)
    }

    // ── taxonomy ─────────────────────────────────────────────────────────

    pub fn classify(&self, text: &str) -> PillarSet {
        classify(text)
    }

    pub fn pillars(&self) -> Vec<PillarInfo> {
        all_pillars()
    }

    pub fn info(&self) -> FacadeInfo {
        FacadeInfo {
            entities: self.engine.entity_store().len(),
            relationships: self.engine.relationship_store().len(),
            max_path_depth: self.config().max_path_depth,
        }
    }
}

impl std::fmt::Debug for QueryFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFacade")
            .field("engine", &self.engine)
            .finish()
    }
}

/// Summary of a loaded graph.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FacadeInfo {
    pub entities: usize,
    pub relationships: usize,
    pub max_path_depth: usize,
}

impl std::fmt::Display for FacadeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "nutri-graph")?;
        writeln!(f, "  entities:       {}", self.entities)?;
        writeln!(f, "  relationships:  {}", self.relationships)?;
        writeln!(f, "  max depth:      {}", self.max_path_depth)?;
        Ok(())
    }
}
