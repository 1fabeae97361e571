use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The seven Kanban columns a work unit can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Backlog,
    Specifying,
    Testing,
    Implementing,
    Validating,
    Done,
    Blocked,
}

/// How a legal transition relates to the forward happy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Exactly one column forward.
    Advance,
    /// More than one column forward (or out of `blocked` straight to `done`).
    Skip,
    /// Any move back along the happy path.
    Retreat,
    /// Into the `blocked` side-track.
    Block,
    /// Out of `blocked` into a non-terminal column.
    Unblock,
}

impl TransitionKind {
    /// Skips and retreats are only legal with an explicit override.
    #[must_use]
    pub const fn requires_override(self) -> bool {
        matches!(self, Self::Skip | Self::Retreat)
    }
}

impl Status {
    /// All columns in board order.
    pub const ALL: [Self; 7] = [
        Self::Backlog,
        Self::Specifying,
        Self::Testing,
        Self::Implementing,
        Self::Validating,
        Self::Done,
        Self::Blocked,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Specifying => "specifying",
            Self::Testing => "testing",
            Self::Implementing => "implementing",
            Self::Validating => "validating",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Statuses a freshly created work unit may start in.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::Backlog | Self::Specifying)
    }

    /// Position on the happy path; `blocked` sits off the path.
    const fn stage(self) -> Option<u8> {
        match self {
            Self::Backlog => Some(0),
            Self::Specifying => Some(1),
            Self::Testing => Some(2),
            Self::Implementing => Some(3),
            Self::Validating => Some(4),
            Self::Done => Some(5),
            Self::Blocked => None,
        }
    }

    /// Classify a transition from `self` to `target`.
    ///
    /// Structural rules:
    /// - no-op transitions are never allowed
    /// - `done` has no outgoing transitions
    /// - `blocked` is reachable from every non-terminal column
    /// - everything else is classified relative to the happy path
    ///
    /// Whether a [`TransitionKind`] additionally needs an override is decided
    /// by [`TransitionKind::requires_override`].
    pub fn classify_transition(self, target: Self) -> Result<TransitionKind, InvalidTransition> {
        if self == target {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }
        if self.is_terminal() {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "done is terminal",
            });
        }

        match (self.stage(), target.stage()) {
            (_, None) => Ok(TransitionKind::Block),
            (None, Some(_)) if target.is_terminal() => Ok(TransitionKind::Skip),
            (None, Some(_)) => Ok(TransitionKind::Unblock),
            (Some(from), Some(to)) if to == from + 1 => Ok(TransitionKind::Advance),
            (Some(from), Some(to)) if to > from => Ok(TransitionKind::Skip),
            (Some(_), Some(_)) => Ok(TransitionKind::Retreat),
        }
    }
}

/// One entry in a work unit's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub state: Status,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Dependency relationships to other work units, by identifier.
///
/// `depends_on` is the authoritative edge direction for graph analytics;
/// `blocks` / `blocked_by` are carried as stated by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Relationships {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
}

impl Relationships {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty() && self.blocks.is_empty() && self.blocked_by.is_empty()
    }

    /// Every referenced identifier across the three kinds.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.depends_on
            .iter()
            .chain(&self.blocks)
            .chain(&self.blocked_by)
            .map(String::as_str)
    }

    /// Append identifiers from `other` that are not already listed.
    fn absorb(&mut self, other: Self) {
        fn merge(into: &mut Vec<String>, from: Vec<String>) {
            for id in from {
                if !into.contains(&id) {
                    into.push(id);
                }
            }
        }
        merge(&mut self.depends_on, other.depends_on);
        merge(&mut self.blocks, other.blocks);
        merge(&mut self.blocked_by, other.blocked_by);
    }
}

/// A trackable item of work with a Kanban-style status.
///
/// Relationships are written as a nested `relationships` object. Older
/// snapshots that list `dependsOn` / `blocks` / `blockedBy` beside the other
/// fields are still read; both forms are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WorkUnitWire")]
pub struct WorkUnit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,
    #[serde(default, skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkUnitWire {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    status: Status,
    #[serde(default)]
    state_history: Vec<StateHistoryEntry>,
    #[serde(default)]
    relationships: Relationships,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    blocks: Vec<String>,
    #[serde(default)]
    blocked_by: Vec<String>,
    #[serde(default)]
    estimate: Option<u32>,
    #[serde(default)]
    epic: Option<String>,
    #[serde(default)]
    linked_features: Vec<String>,
    #[serde(default)]
    blocked_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkUnitWire> for WorkUnit {
    fn from(wire: WorkUnitWire) -> Self {
        let mut relationships = wire.relationships;
        relationships.absorb(Relationships {
            depends_on: wire.depends_on,
            blocks: wire.blocks,
            blocked_by: wire.blocked_by,
        });
        Self {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            status: wire.status,
            state_history: wire.state_history,
            relationships,
            estimate: wire.estimate,
            epic: wire.epic,
            linked_features: wire.linked_features,
            blocked_reason: wire.blocked_reason,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

impl WorkUnit {
    /// Effort contribution; a missing estimate counts as zero.
    #[must_use]
    pub fn effort(&self) -> u64 {
        u64::from(self.estimate.unwrap_or(0))
    }

    #[must_use]
    pub fn has_epic(&self) -> bool {
        self.epic.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// No epic and no relationship of any kind.
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        !self.has_epic() && self.relationships.is_empty()
    }

    #[must_use]
    pub fn last_history(&self) -> Option<&StateHistoryEntry> {
        self.state_history.last()
    }
}

/// Caller-supplied fields for a new work unit. The identifier is issued by
/// the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnitDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub relationships: Relationships,
    pub estimate: Option<u32>,
    pub epic: Option<String>,
    pub linked_features: Vec<String>,
}

impl Default for WorkUnitDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            status: Status::Backlog,
            relationships: Relationships::default(),
            estimate: None,
            epic: None,
            linked_features: Vec::new(),
        }
    }
}

/// Error returned when a state transition is structurally invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

/// Error returned when parsing a status from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub got: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status: '{}' (expected one of backlog, specifying, testing, implementing, validating, done, blocked)",
            self.got
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError { got: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidTransition, Relationships, Status, TransitionKind, WorkUnit};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn unit(json: &str) -> WorkUnit {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn status_json_and_display_roundtrip() {
        for status in Status::ALL {
            let rendered = serde_json::to_string(&status).unwrap();
            assert_eq!(rendered, format!("\"{status}\""));
            assert_eq!(Status::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(Status::from_str("  Testing ").unwrap(), Status::Testing);
        assert!(Status::from_str("review").is_err());
    }

    #[test]
    fn happy_path_advances_one_column_at_a_time() {
        let path = [
            Status::Backlog,
            Status::Specifying,
            Status::Testing,
            Status::Implementing,
            Status::Validating,
            Status::Done,
        ];
        for pair in path.windows(2) {
            assert_eq!(
                pair[0].classify_transition(pair[1]),
                Ok(TransitionKind::Advance),
                "{} -> {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn skips_and_retreats_require_override() {
        let skip = Status::Backlog.classify_transition(Status::Testing).unwrap();
        assert_eq!(skip, TransitionKind::Skip);
        assert!(skip.requires_override());

        let back = Status::Implementing
            .classify_transition(Status::Specifying)
            .unwrap();
        assert_eq!(back, TransitionKind::Retreat);
        assert!(back.requires_override());

        assert!(!TransitionKind::Advance.requires_override());
    }

    #[test]
    fn blocked_side_track() {
        for status in Status::ALL {
            if status.is_terminal() || status == Status::Blocked {
                continue;
            }
            assert_eq!(
                status.classify_transition(Status::Blocked),
                Ok(TransitionKind::Block)
            );
            assert_eq!(
                Status::Blocked.classify_transition(status),
                Ok(TransitionKind::Unblock)
            );
        }
        assert_eq!(
            Status::Blocked.classify_transition(Status::Done),
            Ok(TransitionKind::Skip)
        );
    }

    #[test]
    fn done_is_terminal_and_noop_rejected() {
        for target in Status::ALL {
            assert!(matches!(
                Status::Done.classify_transition(target),
                Err(InvalidTransition {
                    from: Status::Done,
                    ..
                })
            ));
        }
        assert!(Status::Testing.classify_transition(Status::Testing).is_err());
    }

    #[test]
    fn relationships_read_from_nested_object() {
        let wu = unit(
            r#"{
                "id": "AUTH-001",
                "title": "Login",
                "status": "backlog",
                "relationships": {"dependsOn": ["DB-001"], "blocks": ["UI-001"]},
                "estimate": 3,
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            }"#,
        );
        assert_eq!(wu.relationships.depends_on, vec!["DB-001"]);
        assert_eq!(wu.relationships.blocks, vec!["UI-001"]);
        assert!(wu.relationships.blocked_by.is_empty());
        assert!(!wu.is_orphan());
        assert_eq!(wu.effort(), 3);
        assert_eq!(
            wu.created_at,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );

        let rendered = serde_json::to_value(&wu).unwrap();
        assert_eq!(rendered["relationships"]["dependsOn"][0], "DB-001");
        assert!(rendered["relationships"].get("blockedBy").is_none());
        assert!(rendered.get("dependsOn").is_none());
        assert_eq!(serde_json::from_value::<WorkUnit>(rendered).unwrap(), wu);
    }

    #[test]
    fn top_level_relationship_keys_merge_with_nested() {
        let wu = unit(
            r#"{"id":"AUTH-002","status":"backlog",
                "dependsOn": ["DB-001", "DB-002"],
                "blockedBy": ["OPS-001"],
                "relationships": {"dependsOn": ["DB-002"]},
                "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#,
        );
        assert_eq!(wu.relationships.depends_on, vec!["DB-002", "DB-001"]);
        assert_eq!(wu.relationships.blocked_by, vec!["OPS-001"]);
    }

    #[test]
    fn unknown_relationship_kind_is_rejected() {
        let err = serde_json::from_str::<WorkUnit>(
            r#"{"id":"AUTH-003","status":"backlog",
                "relationships": {"depends_on": ["DB-001"]},
                "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("depends_on"), "{err}");

        let empty = unit(
            r#"{"id":"AUTH-004","status":"backlog","relationships":{},
                "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#,
        );
        assert_eq!(empty.relationships, Relationships::default());
        assert!(serde_json::to_value(&empty).unwrap().get("relationships").is_none());
    }

    #[test]
    fn orphan_requires_no_epic_and_no_relationships() {
        let mut wu = unit(
            r#"{"id":"X-001","status":"backlog",
                "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#,
        );
        assert!(wu.is_orphan());

        wu.epic = Some("   ".into());
        assert!(wu.is_orphan(), "blank epic does not count");

        wu.epic = Some("auth".into());
        assert!(!wu.is_orphan());

        wu.epic = None;
        wu.relationships = Relationships {
            blocked_by: vec!["Y-001".into()],
            ..Relationships::default()
        };
        assert!(!wu.is_orphan());
    }
}
