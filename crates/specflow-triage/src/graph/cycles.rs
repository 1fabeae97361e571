//! Cycle detection over the dependency graph.
//!
//! Critical path analysis needs a DAG. These helpers find every cycle for
//! reporting and produce one concrete cycle path for error messages.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Find all cycles currently present in `graph`.
///
/// Each entry is a sorted list of item IDs in one strongly connected
/// component (SCC). Self-loops are reported as a one-element cycle.
#[must_use]
pub fn find_all_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = cyclic_components(graph)
        .into_iter()
        .map(|component| {
            let mut ids: Vec<String> = component.into_iter().map(|idx| node_id(graph, idx)).collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

/// One concrete cycle, as `a -> b -> ... -> a`.
///
/// Starts from the smallest ID that lies on any cycle and follows the
/// shortest route back to it, visiting neighbours in ID order, so the result
/// is deterministic. `None` when the graph is acyclic.
#[must_use]
pub fn find_cycle_path(graph: &DiGraph<String, ()>) -> Option<Vec<String>> {
    let component = cyclic_components(graph)
        .into_iter()
        .min_by_key(|component| {
            component
                .iter()
                .map(|idx| node_id(graph, *idx))
                .min()
                .unwrap_or_default()
        })?;

    let start = component
        .iter()
        .copied()
        .min_by_key(|idx| node_id(graph, *idx))?;

    if has_self_loop(graph, start) {
        let id = node_id(graph, start);
        return Some(vec![id.clone(), id]);
    }

    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    shortest_route_back(graph, start, &members)
}

fn cyclic_components(graph: &DiGraph<String, ()>) -> Vec<Vec<NodeIndex>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(graph, *node))
        })
        .collect()
}

/// BFS from `start` within `members` until an edge returns to `start`.
fn shortest_route_back(
    graph: &DiGraph<String, ()>,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
) -> Option<Vec<String>> {
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
    let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        let mut targets: Vec<NodeIndex> = graph
            .edges(current)
            .map(|edge| edge.target())
            .filter(|target| members.contains(target))
            .collect();
        targets.sort_by_key(|idx| node_id(graph, *idx));

        for next in targets {
            if next == start {
                let mut route = vec![current];
                let mut cursor = current;
                while cursor != start {
                    cursor = *parent.get(&cursor)?;
                    route.push(cursor);
                }
                route.reverse();
                route.push(start);
                return Some(route.into_iter().map(|idx| node_id(graph, idx)).collect());
            }
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

#[must_use]
fn has_self_loop(graph: &DiGraph<String, ()>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

fn node_id(graph: &DiGraph<String, ()>, idx: NodeIndex) -> String {
    graph
        .node_weight(idx)
        .cloned()
        .unwrap_or_else(|| format!("#{}", idx.index()))
}
