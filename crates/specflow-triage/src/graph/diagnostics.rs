//! Relationship consistency and graph health diagnostics.
//!
//! Advisory only: nothing here blocks a transition. The `validate` command
//! reports these alongside snapshot invariant checks.
//!
//! - [`relationship_issues`] for unknown targets, self references and
//!   one-sided `blocks`/`blockedBy` pairs
//! - [`graph_health`] for a dashboard summary

use serde::Serialize;
use specflow_core::WorkUnitCollection;
use tracing::instrument;

use crate::graph::build::DependencyGraph;
use crate::graph::critical_path::critical_path_for;
use crate::graph::cycles::find_all_cycles;

/// Which relationship list an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    DependsOn,
    Blocks,
    BlockedBy,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "dependsOn",
            Self::Blocks => "blocks",
            Self::BlockedBy => "blockedBy",
        }
    }

    /// The list the other side is expected to carry, if mirrored.
    #[must_use]
    pub const fn mirror(self) -> Option<Self> {
        match self {
            Self::DependsOn => None,
            Self::Blocks => Some(Self::BlockedBy),
            Self::BlockedBy => Some(Self::Blocks),
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RelationshipIssue {
    UnknownTarget {
        id: String,
        kind: RelationKind,
        target: String,
    },
    SelfReference {
        id: String,
        kind: RelationKind,
    },
    /// `id.kind` names `target`, but `target.expected` does not name `id`.
    MissingMirror {
        id: String,
        kind: RelationKind,
        target: String,
        expected: RelationKind,
    },
}

impl std::fmt::Display for RelationshipIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTarget { id, kind, target } => {
                write!(f, "{id}.{kind} references unknown work unit {target}")
            }
            Self::SelfReference { id, kind } => write!(f, "{id}.{kind} references itself"),
            Self::MissingMirror {
                id,
                kind,
                target,
                expected,
            } => write!(f, "{id}.{kind} lists {target}, but {target}.{expected} does not list {id}"),
        }
    }
}

/// Check every relationship entry in the collection.
///
/// Issues are ordered by work-unit ID, then relationship kind, then target.
#[must_use]
#[instrument(skip(collection), fields(work_units = collection.len()))]
pub fn relationship_issues(collection: &WorkUnitCollection) -> Vec<RelationshipIssue> {
    let mut issues = Vec::new();

    for unit in collection.iter() {
        let rel = &unit.relationships;
        let lists = [
            (RelationKind::DependsOn, &rel.depends_on),
            (RelationKind::Blocks, &rel.blocks),
            (RelationKind::BlockedBy, &rel.blocked_by),
        ];

        for (kind, targets) in lists {
            let mut sorted: Vec<&String> = targets.iter().collect();
            sorted.sort_unstable();
            sorted.dedup();

            for target in sorted {
                if *target == unit.id {
                    issues.push(RelationshipIssue::SelfReference {
                        id: unit.id.clone(),
                        kind,
                    });
                    continue;
                }
                let Some(other) = collection.get(target) else {
                    issues.push(RelationshipIssue::UnknownTarget {
                        id: unit.id.clone(),
                        kind,
                        target: target.clone(),
                    });
                    continue;
                };
                if let Some(expected) = kind.mirror() {
                    let mirrored = match expected {
                        RelationKind::Blocks => &other.relationships.blocks,
                        RelationKind::BlockedBy => &other.relationships.blocked_by,
                        RelationKind::DependsOn => &other.relationships.depends_on,
                    };
                    if !mirrored.contains(&unit.id) {
                        issues.push(RelationshipIssue::MissingMirror {
                            id: unit.id.clone(),
                            kind,
                            target: target.clone(),
                            expected,
                        });
                    }
                }
            }
        }
    }

    issues
}

/// Project-level summary of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphHealth {
    pub work_units: usize,
    pub dependency_edges: usize,
    pub dangling_edges: usize,
    /// Every cycle, as sorted member lists.
    pub cycles: Vec<Vec<String>>,
    /// Longest chain length; `None` when cycles prevent computing it.
    pub critical_path_length: Option<usize>,
    pub orphans: usize,
}

#[must_use]
pub fn graph_health(collection: &WorkUnitCollection) -> GraphHealth {
    let dg = DependencyGraph::from_collection(collection);
    let cycles = find_all_cycles(&dg.graph);
    let critical_path_length = if cycles.is_empty() {
        critical_path_for(&dg, |_| 0).ok().map(|cp| cp.length)
    } else {
        None
    };

    GraphHealth {
        work_units: dg.node_count(),
        dependency_edges: dg.edge_count(),
        dangling_edges: dg.dangling.len(),
        cycles,
        critical_path_length,
        orphans: collection.iter().filter(|u| u.is_orphan()).count(),
    }
}
