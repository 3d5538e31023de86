//! Bounded-depth path finding over outgoing edges.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::model::Relationship;

use super::GraphSearchEngine;

/// Outcome of [`GraphSearchEngine::find_path`].
///
/// `found == false` is a normal answer: the search ran out of depth or nodes.
#[derive(Debug, Clone, Serialize)]
pub struct PathResult {
    pub source_id: String,
    pub target_id: String,
    pub max_depth: usize,
    pub found: bool,
    pub edges: Vec<Relationship>,
    pub path_length: usize,
    /// Sum of the edges' confidence scores.
    pub total_confidence: u32,
    /// Mean edge confidence; 0.0 when no path was found.
    pub avg_confidence: f64,
}

impl PathResult {
    fn new(source_id: &str, target_id: &str, max_depth: usize, edges: Option<Vec<Relationship>>) -> Self {
        let found = edges.is_some();
        let edges = edges.unwrap_or_default();
        let total_confidence: u32 = edges
            .iter()
            .map(|r| u32::from(r.confidence_score.get()))
            .sum();
        let avg_confidence = if edges.is_empty() {
            0.0
        } else {
            f64::from(total_confidence) / edges.len() as f64
        };
        Self {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            max_depth,
            found,
            path_length: edges.len(),
            edges,
            total_confidence,
            avg_confidence,
        }
    }
}

impl GraphSearchEngine {
    /// Breadth-first search from `source_id` to `target_id`, following
    /// outgoing edges only, returning the first path found.
    ///
    /// Edges are expanded in store insertion order, so the answer is
    /// deterministic for a given store. A path never has more than
    /// `max_depth` edges. Identical endpoints are not special-cased: without a
    /// self-loop the answer is "not found".
    ///
    /// Unknown endpoints are a [`QueryError::NotFound`]; edges into ids that no
    /// longer resolve are skipped.
    pub fn find_path(&self, source_id: &str, target_id: &str, max_depth: usize) -> QueryResult<PathResult> {
        self.check_depth(max_depth)?;
        for id in [source_id, target_id] {
            if !self.entities.contains(id) {
                return Err(QueryError::NotFound { id: id.to_string() });
            }
        }

        let snap = self.snapshot();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(source_id);
        let mut queue: VecDeque<(&str, Vec<&Relationship>)> = VecDeque::new();
        queue.push_back((source_id, Vec::new()));
        let mut expanded = 0usize;

        while let Some((node, path)) = queue.pop_front() {
            if path.len() >= max_depth {
                // Breadth-first: every queued path is at least this long.
                break;
            }
            expanded += 1;
            for rel in snap.outgoing(node) {
                if rel.target_id == target_id {
                    let mut edges: Vec<Relationship> = path.iter().map(|r| (*r).clone()).collect();
                    edges.push(rel.clone());
                    tracing::debug!(
                        source = source_id,
                        target = target_id,
                        hops = edges.len(),
                        expanded,
                        "path found"
                    );
                    return Ok(PathResult::new(source_id, target_id, max_depth, Some(edges)));
                }
                if visited.contains(rel.target_id.as_str()) {
                    continue;
                }
                if !self.entities.contains(&rel.target_id) {
                    tracing::debug!(
                        relationship = rel.id,
                        target = %rel.target_id,
                        "skipping dangling edge"
                    );
                    continue;
                }
                visited.insert(rel.target_id.as_str());
                let mut next = path.clone();
                next.push(rel);
                queue.push_back((rel.target_id.as_str(), next));
            }
        }

        tracing::debug!(source = source_id, target = target_id, expanded, "no path");
        Ok(PathResult::new(source_id, target_id, max_depth, None))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::model::{Entity, Relationship};
    use crate::search::fixtures;
    use crate::store::{EntityStore, MemEntityStore, MemRelationshipStore, RelationshipStore};

    fn hops(result: &PathResult) -> Vec<(&str, &str)> {
        result
            .edges
            .iter()
            .map(|r| (r.source_id.as_str(), r.target_id.as_str()))
            .collect()
    }

    fn chain_engine(ids: &[&str], edges: &[(&str, &str)]) -> GraphSearchEngine {
        let entities = MemEntityStore::new();
        for id in ids {
            entities.insert(Entity::ingredient(*id, *id)).unwrap();
        }
        let rels = MemRelationshipStore::new();
        for (s, t) in edges {
            rels.insert(Relationship::new(*s, *t, "related_to")).unwrap();
        }
        let entities: Arc<dyn EntityStore> = Arc::new(entities);
        let rels: Arc<dyn RelationshipStore> = Arc::new(rels);
        GraphSearchEngine::new(entities, rels, EngineConfig::default())
    }

    #[test]
    fn two_hop_path_with_confidence() {
        let engine = fixtures::engine();
        let r = engine.find_path("turmeric", "inflammation_pathway", 3).unwrap();
        assert!(r.found);
        assert_eq!(r.path_length, 2);
        assert_eq!(
            hops(&r),
            vec![("turmeric", "curcumin"), ("curcumin", "inflammation_pathway")]
        );
        assert_eq!(r.total_confidence, 9);
        assert!((r.avg_confidence - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn depth_bound_is_strict() {
        let engine = fixtures::engine();
        let r = engine.find_path("turmeric", "inflammation_pathway", 1).unwrap();
        assert!(!r.found);
        assert!(r.edges.is_empty());
        assert_eq!(r.avg_confidence, 0.0);
    }

    #[test]
    fn same_endpoint_without_self_loop() {
        let engine = fixtures::engine();
        let r = engine.find_path("turmeric", "turmeric", 3).unwrap();
        assert!(!r.found);
    }

    #[test]
    fn cycle_back_to_source_counts_as_path() {
        let engine = fixtures::engine();
        // kale -> vitamin_c -> kale
        let r = engine.find_path("kale", "kale", 3).unwrap();
        assert!(r.found);
        assert_eq!(r.path_length, 2);
    }

    #[test]
    fn terminates_on_cycles() {
        let engine = chain_engine(&["a", "b", "c", "z"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let r = engine.find_path("a", "z", 5).unwrap();
        assert!(!r.found);
    }

    #[test]
    fn first_path_follows_insertion_order() {
        let engine = chain_engine(
            &["a", "b", "c", "d"],
            &[("a", "c"), ("a", "b"), ("b", "d"), ("c", "d")],
        );
        let r = engine.find_path("a", "d", 3).unwrap();
        assert_eq!(hops(&r), vec![("a", "c"), ("c", "d")]);
    }

    #[test]
    fn path_never_exceeds_depth() {
        let ids = ["n0", "n1", "n2", "n3", "n4", "n5"];
        let edges: Vec<(&str, &str)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
        let engine = chain_engine(&ids, &edges);
        for depth in 1..=5 {
            let r = engine.find_path("n0", "n5", depth).unwrap();
            assert!(r.path_length <= depth);
            assert_eq!(r.found, depth == 5);
        }
    }

    #[test]
    fn dangling_intermediate_is_skipped() {
        let engine = chain_engine(&["a", "z"], &[("a", "ghost"), ("ghost", "z")]);
        let r = engine.find_path("a", "z", 3).unwrap();
        assert!(!r.found);
    }

    #[test]
    fn unknown_endpoint_is_not_found() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.find_path("ghost", "kale", 3),
            Err(QueryError::NotFound { .. })
        ));
        assert!(matches!(
            engine.find_path("kale", "ghost", 3),
            Err(QueryError::NotFound { .. })
        ));
    }

    #[test]
    fn absurd_depth_rejected() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.find_path("turmeric", "curcumin", 6),
            Err(QueryError::InvalidFilter { .. })
        ));
        assert!(engine.find_path("turmeric", "curcumin", 0).is_err());
    }

    #[test]
    fn confidence_uses_edge_scores() {
        let engine = fixtures::engine();
        let r = engine.find_path("ginger", "inflammation_pathway", 2).unwrap();
        assert_eq!(r.total_confidence, 5);
        assert!((r.avg_confidence - 2.5).abs() < f64::EPSILON);
    }
}
