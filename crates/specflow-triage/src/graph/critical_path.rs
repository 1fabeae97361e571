//! Critical path analysis for the dependency graph.
//!
//! # Overview
//!
//! The critical path is the *longest* `dependsOn` chain in the collection,
//! measured in work units. Its estimated effort is the sum of the `estimate`
//! of every unit on it (a missing estimate counts as zero).
//!
//! # Algorithm
//!
//! 1. Reject cyclic graphs up front, naming one concrete cycle.
//! 2. Visit nodes dependencies-first (reverse topological order of the
//!    `dependent → dependency` graph). The best chain ending at a node is the
//!    node alone, or the node appended to the best chain of one of its
//!    dependencies.
//! 3. Pick the node whose best chain is longest and walk back through the
//!    chosen dependencies.
//!
//! # Tie-breaking
//!
//! Whenever two candidates have the same length, the one with the
//! lexicographically smaller ID wins, both when choosing a dependency and
//! when choosing the endpoint. The result therefore depends only on the
//! collection, never on traversal order.

#![allow(clippy::module_name_repetitions)]

use std::cmp::Ordering;
use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use specflow_core::WorkUnitCollection;
use tracing::{debug, instrument};

use crate::GraphError;
use crate::graph::build::DependencyGraph;
use crate::graph::cycles::find_cycle_path;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Longest dependency chain of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    /// Work-unit IDs in execution order: the deepest dependency first, the
    /// unit that waits on everything else last. Empty for an empty
    /// collection.
    pub path: Vec<String>,
    /// Number of work units on `path`.
    pub length: usize,
    pub estimated_effort: u64,
}

impl CriticalPath {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Best chain ending at a node: its length, its effort and the dependency it
/// continues from.
#[derive(Debug, Clone, Copy)]
struct Chain {
    length: usize,
    effort: u64,
    via: Option<NodeIndex>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Compute the critical path over every work unit's `dependsOn` list.
///
/// # Errors
///
/// [`GraphError::CycleDetected`] when the dependencies are cyclic.
#[instrument(skip(collection), fields(work_units = collection.len()))]
pub fn compute_critical_path(collection: &WorkUnitCollection) -> Result<CriticalPath, GraphError> {
    let graph = DependencyGraph::from_collection(collection);
    critical_path_for(&graph, |id| collection.get(id).map_or(0, |unit| unit.effort()))
}

/// Compute the critical path of a prebuilt graph, with per-unit effort
/// supplied by `effort`.
///
/// # Errors
///
/// [`GraphError::CycleDetected`] when the graph is cyclic.
pub fn critical_path_for(
    dg: &DependencyGraph,
    effort: impl Fn(&str) -> u64,
) -> Result<CriticalPath, GraphError> {
    let graph = &dg.graph;
    if graph.node_count() == 0 {
        return Ok(CriticalPath::default());
    }

    let order = toposort(graph, None).map_err(|cycle| {
        let cycle = find_cycle_path(graph).unwrap_or_else(|| {
            // toposort only reports one node; fall back to it
            dg.item_id(cycle.node_id())
                .map(|id| vec![id.to_string()])
                .unwrap_or_default()
        });
        GraphError::CycleDetected { cycle }
    })?;

    let id = |idx: NodeIndex| dg.item_id(idx).unwrap_or_default();
    let mut best: HashMap<NodeIndex, Chain> = HashMap::with_capacity(order.len());

    // `order` lists dependents before dependencies.
    for &node in order.iter().rev() {
        let via = graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter_map(|dep| best.get(&dep).map(|chain| (dep, *chain)))
            .min_by(|(a_idx, a), (b_idx, b)| prefer(a.length, id(*a_idx), b.length, id(*b_idx)));

        let own = effort(id(node));
        let chain = match via {
            Some((dep, prev)) => Chain {
                length: prev.length + 1,
                effort: prev.effort + own,
                via: Some(dep),
            },
            None => Chain {
                length: 1,
                effort: own,
                via: None,
            },
        };
        best.insert(node, chain);
    }

    let Some((&end, &end_chain)) = best
        .iter()
        .min_by(|(a_idx, a), (b_idx, b)| prefer(a.length, id(**a_idx), b.length, id(**b_idx)))
    else {
        return Ok(CriticalPath::default());
    };

    // Walk from the endpoint (waits on everything) down to the deepest
    // dependency, which is already execution order reversed.
    let mut path = Vec::with_capacity(end_chain.length);
    let mut cursor = Some(end);
    while let Some(node) = cursor {
        path.push(id(node).to_string());
        cursor = best.get(&node).and_then(|chain| chain.via);
    }
    path.reverse();

    debug!(
        length = end_chain.length,
        effort = end_chain.effort,
        "critical path computed"
    );

    Ok(CriticalPath {
        length: path.len(),
        path,
        estimated_effort: end_chain.effort,
    })
}

/// Ordering where the preferred candidate sorts first: longer chains, then
/// smaller IDs.
fn prefer(a_len: usize, a_id: &str, b_len: usize, b_id: &str) -> Ordering {
    b_len.cmp(&a_len).then_with(|| a_id.cmp(b_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::collection;

    #[test]
    fn picks_longest_chain_with_summed_effort() {
        let c = collection(&[
            ("FEAT-001", &["UI-001"], Some(2)),
            ("UI-001", &["AUTH-001"], Some(3)),
            ("AUTH-001", &["DB-001"], Some(5)),
            ("DB-001", &[], Some(8)),
            ("DOCS-001", &["DOCS-002"], Some(1)),
            ("DOCS-002", &[], Some(1)),
            ("OPS-001", &["OPS-002"], Some(13)),
            ("OPS-002", &["OPS-003"], Some(13)),
            ("OPS-003", &[], None),
        ]);

        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.length, 4);
        assert_eq!(cp.path, vec!["DB-001", "AUTH-001", "UI-001", "FEAT-001"]);
        assert_eq!(cp.estimated_effort, 18);
    }

    #[test]
    fn isolated_unit_is_its_own_path() {
        let c = collection(&[("SOLO-001", &[], Some(4))]);
        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.path, vec!["SOLO-001"]);
        assert_eq!(cp.length, 1);
        assert_eq!(cp.estimated_effort, 4);
    }

    #[test]
    fn empty_collection_has_empty_path() {
        let cp = compute_critical_path(&WorkUnitCollection::new()).unwrap();
        assert!(cp.is_empty());
        assert_eq!(cp.length, 0);
        assert_eq!(cp.estimated_effort, 0);
    }

    #[test]
    fn ties_go_to_smaller_ids() {
        // Three chains of length 2 end in A-001, B-001 and C-001.
        let c = collection(&[
            ("A-001", &["Z-001"], Some(1)),
            ("B-001", &["Y-001"], Some(100)),
            ("Y-001", &[], None),
            ("Z-001", &[], None),
            ("C-001", &["Z-002", "Y-002"], None),
            ("Y-002", &[], None),
            ("Z-002", &[], None),
        ]);
        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.path, vec!["Z-001", "A-001"]);
        assert_eq!(cp.estimated_effort, 1);
    }

    #[test]
    fn custom_effort_function() {
        let c = collection(&[("A-001", &["B-001"], None), ("B-001", &[], None)]);
        let g = DependencyGraph::from_collection(&c);
        let cp = critical_path_for(&g, |id| if id == "B-001" { 7 } else { 1 }).unwrap();
        assert_eq!(cp.estimated_effort, 8);
    }

    #[test]
    fn dependency_choice_prefers_smaller_id() {
        let c = collection(&[
            ("C-001", &["Z-002", "Y-002"], None),
            ("Y-002", &[], None),
            ("Z-002", &[], None),
        ]);
        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.path, vec!["Y-002", "C-001"]);
    }

    #[test]
    fn diamond_counts_longest_branch() {
        let c = collection(&[
            ("TOP-001", &["L-001", "R-001"], None),
            ("L-001", &["BASE-001"], None),
            ("R-001", &["MID-001"], None),
            ("MID-001", &["BASE-001"], None),
            ("BASE-001", &[], None),
        ]);
        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.path, vec!["BASE-001", "MID-001", "R-001", "TOP-001"]);
    }

    #[test]
    fn cycle_fails_fast_with_the_cycle() {
        let c = collection(&[
            ("A-001", &["B-001"], None),
            ("B-001", &["C-001"], None),
            ("C-001", &["A-001"], None),
            ("D-001", &[], None),
        ]);
        let err = compute_critical_path(&c).unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                cycle: vec!["A-001".into(), "B-001".into(), "C-001".into(), "A-001".into()]
            }
        );
        assert!(err.to_string().contains("A-001 -> B-001 -> C-001 -> A-001"));
    }

    #[test]
    fn dangling_dependency_is_ignored() {
        let c = collection(&[("A-001", &["GONE-001"], Some(2))]);
        let cp = compute_critical_path(&c).unwrap();
        assert_eq!(cp.path, vec!["A-001"]);
    }
}
