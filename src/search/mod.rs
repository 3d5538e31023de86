//! Graph search engine: filtering, traversal, aggregation, and ranking.
//!
//! [`GraphSearchEngine`] reads through the [`EntityStore`] and
//! [`RelationshipStore`] traits and never writes to them, except in the
//! ingredient upsert operations of [`mutate`]. Each operation lives in its own
//! submodule as an `impl GraphSearchEngine` block.
//!
//! Traversals run over a [`GraphSnapshot`]: an adjacency index built from one
//! consistent read of the relationship store. The snapshot is cached and
//! rebuilt whenever the store's generation counter moves.

pub mod connections;
pub mod filter;
pub mod mutate;
pub mod path;
pub mod relationships;
pub mod snapshot;
pub mod stats;
pub mod suggest;

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::model::Entity;
use crate::store::{EntityStore, RelationshipStore};

pub use connections::ConnectionsResult;
pub use filter::{FilterSpec, NumericRange, SearchResult, SortField, SortOrder, filter_by_pillars};
pub use path::PathResult;
pub use relationships::{RelationshipFilter, RelationshipSearchResult, RelationshipSort};
pub use snapshot::GraphSnapshot;
pub use stats::{EntityStats, RelationshipStats};
pub use suggest::Suggestion;

/// Read-mostly query service over a pair of stores.
pub struct GraphSearchEngine {
    entities: Arc<dyn EntityStore>,
    relationships: Arc<dyn RelationshipStore>,
    config: EngineConfig,
    snapshot: RwLock<Option<Arc<GraphSnapshot>>>,
}

impl std::fmt::Debug for GraphSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSearchEngine")
            .field("entities", &self.entities.len())
            .field("relationships", &self.relationships.len())
            .field("config", &self.config)
            .finish()
    }
}

impl GraphSearchEngine {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        relationships: Arc<dyn RelationshipStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            entities,
            relationships,
            config,
            snapshot: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn entity_store(&self) -> &Arc<dyn EntityStore> {
        &self.entities
    }

    pub fn relationship_store(&self) -> &Arc<dyn RelationshipStore> {
        &self.relationships
    }

    /// Fetch an entity by id, active or not.
    pub fn get_entity(&self, id: &str) -> QueryResult<Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| QueryError::NotFound { id: id.to_string() })
    }

    /// The adjacency snapshot for the store's current generation.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        let generation = self.relationships.generation();
        {
            let cached = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(snap) = cached.as_ref().filter(|s| s.generation() == generation) {
                return Arc::clone(snap);
            }
        }

        // Read the generation before the rows: a write racing with the read
        // leaves a snapshot tagged stale, which the next call rebuilds.
        let snap = Arc::new(GraphSnapshot::build(
            generation,
            self.relationships.snapshot(),
        ));
        tracing::debug!(
            generation,
            nodes = snap.node_count(),
            edges = snap.edge_count(),
            "rebuilt adjacency snapshot"
        );
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snap));
        snap
    }

    /// Reject a traversal depth outside `1..=max_path_depth`.
    pub(crate) fn check_depth(&self, max_depth: usize) -> QueryResult<()> {
        let limit = self.config.max_path_depth;
        if max_depth == 0 || max_depth > limit {
            return Err(QueryError::invalid(
                "max_depth",
                format!("{max_depth} is outside the allowed range 1..={limit}"),
            ));
        }
        Ok(())
    }

    /// Reject a page size outside `1..=max_page_size`.
    pub(crate) fn check_limit(&self, limit: usize) -> QueryResult<()> {
        let max = self.config.max_page_size;
        if limit == 0 || limit > max {
            return Err(QueryError::invalid(
                "limit",
                format!("{limit} is outside the allowed range 1..={max}"),
            ));
        }
        Ok(())
    }
}
