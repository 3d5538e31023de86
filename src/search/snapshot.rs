//! Immutable adjacency index over one read of the relationship store.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::Relationship;

/// Directed graph of entity ids whose edge weights index into `rels`.
///
/// petgraph enumerates a node's edges newest-first, so neighbour lists are
/// re-sorted by row index to recover the store's insertion order.
#[derive(Debug)]
pub struct GraphSnapshot {
    generation: u64,
    graph: DiGraph<String, usize>,
    node_index: HashMap<String, NodeIndex>,
    rels: Vec<Relationship>,
}

impl GraphSnapshot {
    pub fn build(generation: u64, rels: Vec<Relationship>) -> Self {
        let mut graph = DiGraph::with_capacity(rels.len(), rels.len());
        let mut node_index: HashMap<String, NodeIndex> = HashMap::new();

        for (row, rel) in rels.iter().enumerate() {
            let src = *node_index
                .entry(rel.source_id.clone())
                .or_insert_with(|| graph.add_node(rel.source_id.clone()));
            let dst = *node_index
                .entry(rel.target_id.clone())
                .or_insert_with(|| graph.add_node(rel.target_id.clone()));
            graph.add_edge(src, dst, row);
        }

        Self {
            generation,
            graph,
            node_index,
            rels,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.rels
    }

    fn neighbours(&self, id: &str, direction: Direction) -> Vec<&Relationship> {
        let Some(&node) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut rows: Vec<usize> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| *edge.weight())
            .collect();
        rows.sort_unstable();
        rows.into_iter().map(|row| &self.rels[row]).collect()
    }

    /// Edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: &str) -> Vec<&Relationship> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Edges arriving at `id`, in insertion order.
    pub fn incoming(&self, id: &str) -> Vec<&Relationship> {
        self.neighbours(id, Direction::Incoming)
    }
}
