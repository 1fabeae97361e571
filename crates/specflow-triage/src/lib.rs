#![forbid(unsafe_code)]
//! specflow-triage library.
//!
//! Read-only analytics over the dependency relationships of a work-unit
//! collection: critical path, cycles, orphans and relationship diagnostics.
//!
//! # Conventions
//!
//! - **Errors**: graph failures are [`GraphError`]; everything else is
//!   infallible.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod graph;
pub mod orphans;

use specflow_core::ErrorCode;

pub use graph::{CriticalPath, compute_critical_path};
pub use orphans::{Orphan, SUGGESTED_ACTIONS, find_orphans};

/// Failures of graph analyses that need an acyclic graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// `cycle` lists the IDs along one cycle, starting and ending on the same
    /// work unit.
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },
}

impl GraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};
    use specflow_core::WorkUnitCollection;
    use specflow_core::model::{Relationships, StateHistoryEntry, Status, WorkUnit};

    pub fn unit(id: &str, depends_on: &[&str], estimate: Option<u32>) -> WorkUnit {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        WorkUnit {
            id: id.to_string(),
            title: format!("work unit {id}"),
            description: None,
            status: Status::Backlog,
            state_history: vec![StateHistoryEntry {
                state: Status::Backlog,
                timestamp: at,
                reason: None,
            }],
            relationships: Relationships {
                depends_on: depends_on.iter().map(|d| (*d).to_string()).collect(),
                ..Relationships::default()
            },
            estimate,
            epic: None,
            linked_features: Vec::new(),
            blocked_reason: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn collection(spec: &[(&str, &[&str], Option<u32>)]) -> WorkUnitCollection {
        WorkUnitCollection::from_units(spec.iter().map(|(id, deps, est)| unit(id, deps, *est)))
            .unwrap()
    }
}
