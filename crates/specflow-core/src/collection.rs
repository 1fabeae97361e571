//! In-memory work-unit collection and its per-column index.
//!
//! # Overview
//!
//! [`WorkUnitCollection`] is the snapshot the engine operates on: a map from
//! identifier to [`WorkUnit`] plus a [`ColumnIndex`] listing the identifiers in
//! each of the seven Kanban columns, in insertion order.
//!
//! The column index is derived state. It is either built from the statuses
//! (snapshots without a `states` section) or validated against them on load,
//! and afterwards it is only changed by the single mutation path used by the
//! transition validator. Code outside this module cannot touch it.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "workUnits": { "AUTH-001": { "id": "AUTH-001", "status": "testing", ... } },
//!   "states": { "backlog": [], "specifying": [], "testing": ["AUTH-001"], ... }
//! }
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorkflowError;
use crate::model::{StateHistoryEntry, Status, WorkUnit, WorkUnitDraft};

// ---------------------------------------------------------------------------
// ColumnIndex
// ---------------------------------------------------------------------------

/// Ordered identifier lists, one per Kanban column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnIndex {
    backlog: Vec<String>,
    specifying: Vec<String>,
    testing: Vec<String>,
    implementing: Vec<String>,
    validating: Vec<String>,
    done: Vec<String>,
    blocked: Vec<String>,
}

impl ColumnIndex {
    #[must_use]
    pub fn column(&self, status: Status) -> &[String] {
        match status {
            Status::Backlog => &self.backlog,
            Status::Specifying => &self.specifying,
            Status::Testing => &self.testing,
            Status::Implementing => &self.implementing,
            Status::Validating => &self.validating,
            Status::Done => &self.done,
            Status::Blocked => &self.blocked,
        }
    }

    fn column_mut(&mut self, status: Status) -> &mut Vec<String> {
        match status {
            Status::Backlog => &mut self.backlog,
            Status::Specifying => &mut self.specifying,
            Status::Testing => &mut self.testing,
            Status::Implementing => &mut self.implementing,
            Status::Validating => &mut self.validating,
            Status::Done => &mut self.done,
            Status::Blocked => &mut self.blocked,
        }
    }

    /// Every column the identifier appears in (once per occurrence).
    fn columns_containing(&self, id: &str) -> Vec<Status> {
        Status::ALL
            .into_iter()
            .flat_map(|status| {
                self.column(status)
                    .iter()
                    .filter(move |member| member.as_str() == id)
                    .map(move |_| status)
            })
            .collect()
    }

    fn derive(units: &BTreeMap<String, WorkUnit>) -> Self {
        let mut index = Self::default();
        for unit in units.values() {
            index.column_mut(unit.status).push(unit.id.clone());
        }
        index
    }
}

// ---------------------------------------------------------------------------
// Invariant violations
// ---------------------------------------------------------------------------

/// A broken collection invariant found at the load boundary or by
/// [`WorkUnitCollection::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    EmptyId,
    KeyMismatch { key: String, id: String },
    MissingFromIndex { id: String, status: Status },
    DuplicateInIndex { id: String, columns: Vec<Status> },
    ColumnMismatch { id: String, status: Status, column: Status },
    UnknownInIndex { id: String, column: Status },
    HistoryOutOfOrder { id: String, position: usize },
    HistoryStatusMismatch { id: String, last: Status, status: Status },
    EmptyRelationshipTarget { id: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "work unit with empty id"),
            Self::KeyMismatch { key, id } => {
                write!(f, "entry keyed '{key}' carries id '{id}'")
            }
            Self::MissingFromIndex { id, status } => {
                write!(f, "{id} is {status} but absent from every column")
            }
            Self::DuplicateInIndex { id, columns } => {
                let names: Vec<&str> = columns.iter().map(|s| s.as_str()).collect();
                write!(f, "{id} listed more than once: {}", names.join(", "))
            }
            Self::ColumnMismatch { id, status, column } => {
                write!(f, "{id} is {status} but listed under {column}")
            }
            Self::UnknownInIndex { id, column } => {
                write!(f, "{column} column lists unknown work unit {id}")
            }
            Self::HistoryOutOfOrder { id, position } => {
                write!(f, "{id} history entry {position} is older than its predecessor")
            }
            Self::HistoryStatusMismatch { id, last, status } => {
                write!(f, "{id} is {status} but its last history entry is {last}")
            }
            Self::EmptyRelationshipTarget { id } => {
                write!(f, "{id} has an empty relationship target")
            }
        }
    }
}

/// Snapshot rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("work-unit snapshot violates {} invariant(s): {}", .violations.len(), render_violations(.violations))]
pub struct SnapshotError {
    pub violations: Vec<InvariantViolation>,
}

fn render_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// WorkUnitCollection
// ---------------------------------------------------------------------------

/// Wire form of a collection before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub work_units: BTreeMap<String, WorkUnit>,
    #[serde(default)]
    pub states: Option<ColumnIndex>,
}

/// Validated work units plus their column index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Snapshot")]
pub struct WorkUnitCollection {
    work_units: BTreeMap<String, WorkUnit>,
    states: ColumnIndex,
}

impl TryFrom<Snapshot> for WorkUnitCollection {
    type Error = SnapshotError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        Self::from_snapshot(snapshot)
    }
}

impl WorkUnitCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw snapshot and build a collection from it.
    ///
    /// When the snapshot carries no `states` section the index is derived
    /// from the statuses (identifier order).
    ///
    /// # Errors
    ///
    /// Returns every invariant violation found, not just the first.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let states = snapshot
            .states
            .unwrap_or_else(|| ColumnIndex::derive(&snapshot.work_units));
        let collection = Self {
            work_units: snapshot.work_units,
            states,
        };

        let violations = collection.check_invariants();
        if violations.is_empty() {
            debug!(units = collection.len(), "snapshot validated");
            Ok(collection)
        } else {
            Err(SnapshotError { violations })
        }
    }

    /// Build a collection from loose units, deriving the column index.
    ///
    /// # Errors
    ///
    /// Returns the invariant violations of the resulting collection.
    pub fn from_units(units: impl IntoIterator<Item = WorkUnit>) -> Result<Self, SnapshotError> {
        let work_units = units.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self::from_snapshot(Snapshot {
            work_units,
            states: None,
        })
    }

    /// Re-verify every collection invariant.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for (key, unit) in &self.work_units {
            if unit.id.is_empty() {
                violations.push(InvariantViolation::EmptyId);
            } else if key != &unit.id {
                violations.push(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    id: unit.id.clone(),
                });
            }

            match self.states.columns_containing(key).as_slice() {
                [] => violations.push(InvariantViolation::MissingFromIndex {
                    id: key.clone(),
                    status: unit.status,
                }),
                [column] if *column != unit.status => {
                    violations.push(InvariantViolation::ColumnMismatch {
                        id: key.clone(),
                        status: unit.status,
                        column: *column,
                    });
                }
                [_] => {}
                columns => violations.push(InvariantViolation::DuplicateInIndex {
                    id: key.clone(),
                    columns: columns.to_vec(),
                }),
            }

            for (position, pair) in unit.state_history.windows(2).enumerate() {
                if pair[1].timestamp < pair[0].timestamp {
                    violations.push(InvariantViolation::HistoryOutOfOrder {
                        id: key.clone(),
                        position: position + 1,
                    });
                }
            }

            if let Some(last) = unit.last_history() {
                if last.state != unit.status {
                    violations.push(InvariantViolation::HistoryStatusMismatch {
                        id: key.clone(),
                        last: last.state,
                        status: unit.status,
                    });
                }
            }

            if unit.relationships.targets().any(|t| t.trim().is_empty()) {
                violations.push(InvariantViolation::EmptyRelationshipTarget { id: key.clone() });
            }
        }

        for column in Status::ALL {
            for id in self.states.column(column) {
                if !self.work_units.contains_key(id) {
                    violations.push(InvariantViolation::UnknownInIndex {
                        id: id.clone(),
                        column,
                    });
                }
            }
        }

        violations
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WorkUnit> {
        self.work_units.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.work_units.contains_key(id)
    }

    /// Work units in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkUnit> {
        self.work_units.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.work_units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.work_units.is_empty()
    }

    /// Identifiers in one column, in the order they entered it.
    #[must_use]
    pub fn column(&self, status: Status) -> &[String] {
        self.states.column(status)
    }

    #[must_use]
    pub const fn columns(&self) -> &ColumnIndex {
        &self.states
    }

    /// Issue the next identifier for `prefix` (`PREFIX-NNN`).
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidWorkUnit`] when the highest existing
    /// suffix for `prefix` is already `u32::MAX`.
    pub fn next_id(&self, prefix: &str) -> Result<String, WorkflowError> {
        let next = match self
            .work_units
            .keys()
            .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-'))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
        {
            None => 1,
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| invalid(format!("identifier space for {prefix} is exhausted")))?,
        };
        Ok(format!("{prefix}-{next:03}"))
    }

    /// Create a work unit, issuing its identifier from `prefix`.
    ///
    /// The new unit starts with a single history entry for its initial status
    /// and is appended to that column.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidWorkUnit`] for a malformed prefix, an
    /// empty title, a non-initial status, or a relationship to an unknown
    /// work unit.
    pub fn create_work_unit(
        &mut self,
        prefix: &str,
        draft: WorkUnitDraft,
        now: DateTime<Utc>,
    ) -> Result<&WorkUnit, WorkflowError> {
        validate_prefix(prefix)?;
        if draft.title.trim().is_empty() {
            return Err(invalid("title must not be empty"));
        }
        if !draft.status.is_initial() {
            return Err(invalid(format!(
                "new work units start in backlog or specifying, not {}",
                draft.status
            )));
        }
        if let Some(unknown) = draft
            .relationships
            .targets()
            .find(|target| !self.contains(target))
        {
            return Err(invalid(format!("relationship target {unknown} does not exist")));
        }

        let id = self.next_id(prefix)?;
        let unit = WorkUnit {
            id: id.clone(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            state_history: vec![StateHistoryEntry {
                state: draft.status,
                timestamp: now,
                reason: None,
            }],
            relationships: draft.relationships,
            estimate: draft.estimate,
            epic: draft.epic,
            linked_features: draft.linked_features,
            blocked_reason: None,
            created_at: now,
            updated_at: now,
        };

        let Entry::Vacant(slot) = self.work_units.entry(id.clone()) else {
            return Err(invalid(format!("work unit {id} already exists")));
        };
        self.states.column_mut(unit.status).push(id.clone());
        debug!(%id, status = %unit.status, "work unit created");
        Ok(slot.insert(unit))
    }

    /// Apply a validated status change: status, history and column move
    /// together.
    ///
    /// All lookups happen before the first write, so a failure leaves the
    /// collection untouched.
    pub(crate) fn commit_status(
        &mut self,
        id: &str,
        entry: StateHistoryEntry,
        blocked_reason: Option<String>,
    ) -> Result<(), WorkflowError> {
        let Self { work_units, states } = self;
        let unit = work_units
            .get_mut(id)
            .ok_or_else(|| WorkflowError::WorkUnitNotFound { id: id.to_string() })?;

        let from_column = states.column_mut(unit.status);
        let position = from_column
            .iter()
            .position(|member| member == id)
            .ok_or_else(|| invalid(format!("{id} is missing from the {} column", unit.status)))?;

        from_column.remove(position);
        states.column_mut(entry.state).push(id.to_string());

        unit.status = entry.state;
        unit.updated_at = entry.timestamp;
        unit.blocked_reason = blocked_reason;
        unit.state_history.push(entry);
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> WorkflowError {
    WorkflowError::InvalidWorkUnit {
        reason: reason.into(),
    }
}

fn validate_prefix(prefix: &str) -> Result<(), WorkflowError> {
    let ok = (2..=6).contains(&prefix.len()) && prefix.chars().all(|c| c.is_ascii_uppercase());
    if ok {
        Ok(())
    } else {
        Err(invalid(format!(
            "prefix '{prefix}' must be 2-6 uppercase ASCII letters"
        )))
    }
}
