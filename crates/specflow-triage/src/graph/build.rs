//! Graph construction from a work-unit collection.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must be finished before A.
//! One edge is added for every entry of `A.dependsOn`. `blocks` and
//! `blockedBy` are not edges here; they are checked for consistency by
//! [`crate::graph::diagnostics`].
//!
//! ## Dangling references
//!
//! A `dependsOn` entry naming an identifier that is not in the collection
//! cannot become an edge. It is skipped, logged, and kept in
//! [`DependencyGraph::dangling`] so callers can report it.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use specflow_core::WorkUnitCollection;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// A `dependsOn` reference to a work unit that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEdge {
    pub from: String,
    pub to: String,
}

/// Directed dependency graph over every work unit in a collection.
///
/// Nodes are work-unit IDs, added in identifier order so node indices are
/// stable for a given collection. The graph may contain cycles; analyses
/// that need a DAG check for them.
#[derive(Debug)]
pub struct DependencyGraph {
    pub graph: DiGraph<String, ()>,
    pub node_map: HashMap<String, NodeIndex>,
    pub dangling: Vec<DanglingEdge>,
}

impl DependencyGraph {
    /// Build the graph from every unit's `dependsOn` list.
    #[instrument(skip(collection), fields(work_units = collection.len()))]
    pub fn from_collection(collection: &WorkUnitCollection) -> Self {
        let mut graph = DiGraph::<String, ()>::with_capacity(collection.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(collection.len());

        for unit in collection.iter() {
            let idx = graph.add_node(unit.id.clone());
            node_map.insert(unit.id.clone(), idx);
        }

        let mut dangling = Vec::new();
        for unit in collection.iter() {
            let from = node_map[&unit.id];
            for dependency in &unit.relationships.depends_on {
                let Some(&to) = node_map.get(dependency) else {
                    warn!(work_unit = %unit.id, %dependency, "dependsOn target does not exist; edge skipped");
                    dangling.push(DanglingEdge {
                        from: unit.id.clone(),
                        to: dependency.clone(),
                    });
                    continue;
                };
                // petgraph allows parallel edges; keep one per pair.
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dangling = dangling.len(),
            "dependency graph built"
        );

        Self {
            graph,
            node_map,
            dangling,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn item_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Direct dependencies of `id`, sorted.
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Work units that directly depend on `id`, sorted.
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.item_id(n))
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::collection;

    #[test]
    fn one_node_per_unit_one_edge_per_dependency() {
        let c = collection(&[
            ("API-001", &["DB-001"], Some(2)),
            ("DB-001", &[], Some(3)),
            ("UI-001", &["API-001", "DB-001"], None),
        ]);
        let g = DependencyGraph::from_collection(&c);

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.dependencies("UI-001"), vec!["API-001", "DB-001"]);
        assert_eq!(g.dependents("DB-001"), vec!["API-001", "UI-001"]);
        assert!(g.dangling.is_empty());
    }

    #[test]
    fn duplicate_dependencies_collapse() {
        let c = collection(&[("A-001", &["B-001", "B-001"], None), ("B-001", &[], None)]);
        let g = DependencyGraph::from_collection(&c);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn dangling_dependencies_are_recorded_not_added() {
        let c = collection(&[("A-001", &["GONE-001"], None)]);
        let g = DependencyGraph::from_collection(&c);

        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(
            g.dangling,
            vec![DanglingEdge {
                from: "A-001".into(),
                to: "GONE-001".into()
            }]
        );
    }

    #[test]
    fn empty_collection_gives_empty_graph() {
        let g = DependencyGraph::from_collection(&WorkUnitCollection::new());
        assert_eq!(g.node_count(), 0);
        assert!(g.dependencies("X-001").is_empty());
    }
}
