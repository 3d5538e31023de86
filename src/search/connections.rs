//! Direct-neighbour aggregation for one entity.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::model::Relationship;

use super::GraphSearchEngine;

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionsResult {
    pub entity_id: String,
    pub entity_name: String,
    pub incoming: Vec<Relationship>,
    pub outgoing: Vec<Relationship>,
    pub total_connections: usize,
    /// Distinct relationship types across both directions, sorted.
    pub relationship_types: Vec<String>,
    /// Depth as requested. Only direct neighbours are inspected regardless.
    pub max_depth: usize,
}

impl GraphSearchEngine {
    /// Incoming and outgoing edges of `entity_id`, optionally restricted to
    /// `relationship_types` (an empty list means no restriction).
    ///
    /// `max_depth` is validated like a path depth and echoed back, but only
    /// depth-1 edges are returned. Edges whose far end no longer resolves are
    /// skipped.
    pub fn get_connections(
        &self,
        entity_id: &str,
        relationship_types: Option<&[String]>,
        max_depth: usize,
    ) -> QueryResult<ConnectionsResult> {
        self.check_depth(max_depth)?;
        let entity = self
            .entities
            .get(entity_id)
            .ok_or_else(|| QueryError::NotFound {
                id: entity_id.to_string(),
            })?;

        let wanted = relationship_types.filter(|t| !t.is_empty());
        let keep = |rel: &Relationship, far_end: &str| -> bool {
            if wanted.is_some_and(|types| !types.contains(&rel.relationship_type)) {
                return false;
            }
            if !self.entities.contains(far_end) {
                tracing::debug!(relationship = rel.id, far_end, "skipping dangling edge");
                return false;
            }
            true
        };

        let snap = self.snapshot();
        let incoming: Vec<Relationship> = snap
            .incoming(entity_id)
            .into_iter()
            .filter(|r| keep(r, &r.source_id))
            .cloned()
            .collect();
        let outgoing: Vec<Relationship> = snap
            .outgoing(entity_id)
            .into_iter()
            .filter(|r| keep(r, &r.target_id))
            .cloned()
            .collect();

        let relationship_types: Vec<String> = incoming
            .iter()
            .chain(&outgoing)
            .map(|r| r.relationship_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(ConnectionsResult {
            entity_id: entity.id,
            entity_name: entity.name,
            total_connections: incoming.len() + outgoing.len(),
            incoming,
            outgoing,
            relationship_types,
            max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relationship;
    use crate::search::fixtures;

    #[test]
    fn direct_neighbours_both_directions() {
        let engine = fixtures::engine();
        let c = engine.get_connections("vitamin_c", None, 2).unwrap();
        assert_eq!(c.entity_name, "Vitamin C");
        let sources: Vec<&str> = c.incoming.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(sources, vec!["kale", "apple"]);
        assert_eq!(c.outgoing.len(), 1);
        assert_eq!(c.total_connections, 3);
        assert_eq!(c.relationship_types, vec!["contains", "found_in"]);
        assert_eq!(c.max_depth, 2);
    }

    #[test]
    fn type_filter() {
        let engine = fixtures::engine();
        let types = vec!["found_in".to_string()];
        let c = engine.get_connections("vitamin_c", Some(&types), 1).unwrap();
        assert!(c.incoming.is_empty());
        assert_eq!(c.outgoing.len(), 1);
        assert_eq!(c.relationship_types, vec!["found_in"]);

        let empty: Vec<String> = Vec::new();
        let c = engine.get_connections("vitamin_c", Some(&empty), 1).unwrap();
        assert_eq!(c.total_connections, 3);
    }

    #[test]
    fn depth_only_inspects_direct_edges() {
        let engine = fixtures::engine();
        let shallow = engine.get_connections("turmeric", None, 1).unwrap();
        let deep = engine.get_connections("turmeric", None, 5).unwrap();
        assert_eq!(shallow.total_connections, deep.total_connections);
        assert_eq!(deep.total_connections, 1);
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.get_connections("ghost", None, 1),
            Err(QueryError::NotFound { .. })
        ));
    }

    #[test]
    fn dangling_edges_skipped() {
        let engine = fixtures::engine();
        engine
            .relationship_store()
            .insert(Relationship::new("kale", "ghost", "contains"))
            .unwrap();
        let c = engine.get_connections("kale", None, 1).unwrap();
        assert!(c.outgoing.iter().all(|r| r.target_id != "ghost"));
        assert_eq!(c.outgoing.len(), 1);
    }
}
