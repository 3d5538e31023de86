//! In-memory stores.
//!
//! Entities live in a sharded [`DashMap`] tagged with an insertion sequence
//! so scans can return a stable order. Relationships live in a single
//! `RwLock<Vec<_>>`: reads are far more common than writes, and every read
//! path wants insertion order anyway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use crate::model::{Entity, Relationship};

use super::{CoarseFilter, EntityStore, RelationshipStore, StoreResult};

#[derive(Debug, Clone)]
struct StoredEntity {
    seq: u64,
    entity: Entity,
}

/// Concurrent in-memory entity store.
#[derive(Debug, Default)]
pub struct MemEntityStore {
    entities: DashMap<String, StoredEntity>,
    next_seq: AtomicU64,
}

impl MemEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from entities in order, rejecting duplicate ids.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> StoreResult<Self> {
        let store = Self::new();
        for entity in entities {
            store.insert(entity)?;
        }
        Ok(store)
    }
}

impl EntityStore for MemEntityStore {
    fn get(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).map(|e| e.entity.clone())
    }

    fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    fn scan(&self, filter: &CoarseFilter) -> Vec<Entity> {
        let mut hits: Vec<(u64, Entity)> = self
            .entities
            .iter()
            .filter(|e| filter.matches(&e.entity))
            .map(|e| (e.seq, e.entity.clone()))
            .collect();
        hits.sort_unstable_by_key(|(seq, _)| *seq);
        hits.into_iter().map(|(_, e)| e).collect()
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn insert(&self, entity: Entity) -> StoreResult<()> {
        match self.entities.entry(entity.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEntity { id: entity.id }),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(id = %entity.id, seq, "entity inserted");
                slot.insert(StoredEntity { seq, entity });
                Ok(())
            }
        }
    }

    fn update(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Entity) -> StoreResult<bool>,
    ) -> StoreResult<bool> {
        let mut slot = self
            .entities
            .get_mut(id)
            .ok_or_else(|| StoreError::EntityNotFound { id: id.to_string() })?;
        let mut draft = slot.entity.clone();
        let changed = mutate(&mut draft)?;
        if changed {
            slot.entity = draft;
        }
        Ok(changed)
    }
}

#[derive(Debug, Default)]
struct RelationshipTable {
    rows: Vec<Relationship>,
    next_id: u64,
}

/// In-memory relationship store.
#[derive(Debug, Default)]
pub struct MemRelationshipStore {
    table: RwLock<RelationshipTable>,
    generation: AtomicU64,
}

impl MemRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from relationships in order.
    pub fn from_relationships(
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> StoreResult<Self> {
        let store = Self::new();
        for rel in relationships {
            store.insert(rel)?;
        }
        Ok(store)
    }

    // A writer that panicked mid-update can only have left a fully pushed or
    // fully removed row behind, so the table is still usable.
    fn read(&self) -> RwLockReadGuard<'_, RelationshipTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RelationshipTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RelationshipStore for MemRelationshipStore {
    fn get(&self, id: u64) -> Option<Relationship> {
        self.read().rows.iter().find(|r| r.id == id).cloned()
    }

    fn snapshot(&self) -> Vec<Relationship> {
        self.read().rows.clone()
    }

    fn len(&self) -> usize {
        self.read().rows.len()
    }

    fn insert(&self, mut relationship: Relationship) -> StoreResult<u64> {
        let mut table = self.write();
        if relationship.id == 0 {
            table.next_id += 1;
            relationship.id = table.next_id;
        } else if table.rows.iter().any(|r| r.id == relationship.id) {
            return Err(StoreError::DuplicateRelationship {
                id: relationship.id,
            });
        } else {
            table.next_id = table.next_id.max(relationship.id);
        }
        let id = relationship.id;
        table.rows.push(relationship);
        self.generation.fetch_add(1, Ordering::Release);
        Ok(id)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
