//! Storage contracts for entities and relationships.
//!
//! The search engine only talks to the [`EntityStore`] and
//! [`RelationshipStore`] traits. [`mem`] provides the in-process
//! implementations; [`dataset`] loads them from (and saves them to) a JSON
//! file.
//!
//! Stores guarantee per-call consistency only. Each call sees a consistent
//! view of the data, but two calls may observe different states under
//! concurrent writes.

pub mod dataset;
pub mod mem;

use crate::error::StoreError;
use crate::model::{Classification, Entity, Relationship};

pub use dataset::Dataset;
pub use mem::{MemEntityStore, MemRelationshipStore};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Predicates a store can evaluate cheaply during a scan.
///
/// This is the "coarse" half of a two-phase filter: anything a store cannot
/// express (substring matches inside outcome text, numeric comparisons on
/// attribute values) is applied afterwards, in memory, by the engine.
#[derive(Debug, Clone, Default)]
pub struct CoarseFilter {
    /// Include deactivated entities.
    pub include_inactive: bool,
    pub primary_classification: Option<Classification>,
    /// Only ingredients with at least one health-outcome record.
    pub requires_health_outcomes: bool,
    /// Lowercased substring of name or id.
    pub text: Option<String>,
}

impl CoarseFilter {
    /// Whether `entity` passes every coarse predicate.
    pub fn matches(&self, entity: &Entity) -> bool {
        if !self.include_inactive && !entity.is_active {
            return false;
        }
        if self
            .primary_classification
            .is_some_and(|class| entity.primary_classification() != class)
        {
            return false;
        }
        if self.requires_health_outcomes
            && !entity
                .as_ingredient()
                .is_some_and(|i| !i.health_outcomes.is_empty())
        {
            return false;
        }
        self.text
            .as_deref()
            .is_none_or(|text| entity.matches_text(text))
    }
}

/// Entity storage contract.
pub trait EntityStore: Send + Sync {
    /// Fetch one entity by id, active or not.
    fn get(&self, id: &str) -> Option<Entity>;

    fn contains(&self, id: &str) -> bool;

    /// All entities passing `filter`, in insertion order.
    fn scan(&self, filter: &CoarseFilter) -> Vec<Entity>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new entity. Ids share one namespace across classifications.
    fn insert(&self, entity: Entity) -> StoreResult<()>;

    /// Apply `mutate` to one entity atomically.
    ///
    /// The closure runs against a copy; the stored record is replaced only if
    /// it returns `Ok(true)`. An error or `Ok(false)` leaves the store untouched.
    /// Returns whatever the closure returned.
    fn update(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Entity) -> StoreResult<bool>,
    ) -> StoreResult<bool>;

    /// Mark an entity inactive. Returns `false` if it already was.
    fn deactivate(&self, id: &str) -> StoreResult<bool> {
        self.update(id, &mut |entity| {
            if !entity.is_active {
                return Ok(false);
            }
            entity.is_active = false;
            entity.updated_at = chrono::Utc::now();
            Ok(true)
        })
    }
}

/// Relationship storage contract.
///
/// The engine reads edges only through [`snapshot`](Self::snapshot), which
/// returns them in insertion order; that order makes breadth-first path
/// finding deterministic. Adjacency lookups live on the engine's snapshot
/// index.
pub trait RelationshipStore: Send + Sync {
    fn get(&self, id: u64) -> Option<Relationship>;

    /// Every edge, from a single consistent read.
    fn snapshot(&self) -> Vec<Relationship>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an edge, allocating an id when `relationship.id == 0`.
    /// Returns the stored id.
    fn insert(&self, relationship: Relationship) -> StoreResult<u64>;


    /// Counter bumped on every write. Readers cache derived indexes against it.
    fn generation(&self) -> u64;
}
