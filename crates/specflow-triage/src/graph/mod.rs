//! Dependency graph module.
//!
//! # Overview
//!
//! Builds a petgraph directed graph from the `dependsOn` lists of a
//! work-unit collection and runs read-only analyses over it.
//!
//! ## Pipeline
//!
//! ```text
//! WorkUnitCollection
//!        ↓  build::DependencyGraph::from_collection()
//! DependencyGraph (DiGraph, dependent → dependency, may contain cycles)
//!        ├─ cycles::find_all_cycles()              every SCC cycle
//!        ├─ critical_path::critical_path_for()     longest chain (DAG only)
//!        └─ diagnostics::graph_health()            summary counts
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use specflow_triage::graph::compute_critical_path;
//!
//! let cp = compute_critical_path(&collection)?;
//! println!("{} units, effort {}: {}", cp.length, cp.estimated_effort, cp.path.join(" -> "));
//! ```

pub mod build;
pub mod critical_path;
pub mod cycles;
pub mod diagnostics;

pub use build::{DanglingEdge, DependencyGraph};
pub use critical_path::{CriticalPath, compute_critical_path, critical_path_for};
pub use cycles::{find_all_cycles, find_cycle_path};
pub use diagnostics::{GraphHealth, RelationKind, RelationshipIssue, graph_health, relationship_issues};
