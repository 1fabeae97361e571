use std::fmt;

use serde::Serialize;

use crate::model::Status;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    WorkUnitNotFound,
    IllegalTransition,
    MissingBlockedReason,
    TimestampRegression,
    InvalidWorkUnit,
    CoverageGateFailed,
    MultipleTestFiles,
    CoverageUnreadable,
    CycleDetected,
    CorruptSnapshot,
    SnapshotWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::WorkUnitNotFound => "E2001",
            Self::IllegalTransition => "E2002",
            Self::MissingBlockedReason => "E2003",
            Self::TimestampRegression => "E2004",
            Self::InvalidWorkUnit => "E2005",
            Self::CoverageGateFailed => "E3001",
            Self::MultipleTestFiles => "E3002",
            Self::CoverageUnreadable => "E3003",
            Self::CycleDetected => "E4001",
            Self::CorruptSnapshot => "E5001",
            Self::SnapshotWriteFailed => "E5002",
            Self::LockContention => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::WorkUnitNotFound => "Work unit not found",
            Self::IllegalTransition => "Illegal status transition",
            Self::MissingBlockedReason => "Blocked reason required",
            Self::TimestampRegression => "Transition timestamp precedes history",
            Self::InvalidWorkUnit => "Invalid work unit",
            Self::CoverageGateFailed => "Uncovered scenarios block completion",
            Self::MultipleTestFiles => "Feature maps to multiple test files",
            Self::CoverageUnreadable => "Coverage file could not be parsed",
            Self::CycleDetected => "Dependency cycle detected",
            Self::CorruptSnapshot => "Corrupt work-unit snapshot",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Create a work unit with `specflow create` first."),
            Self::ConfigParseError => Some("Fix syntax in .specflow/config.toml and retry."),
            Self::WorkUnitNotFound => None,
            Self::IllegalTransition => Some(
                "Follow the workflow: backlog -> specifying -> testing -> implementing -> validating -> done, or pass --override.",
            ),
            Self::MissingBlockedReason => Some("Pass --reason describing what blocks the work unit."),
            Self::TimestampRegression => Some("Check the system clock; history timestamps must not go backwards."),
            Self::InvalidWorkUnit => None,
            Self::CoverageGateFailed => {
                Some("Link the uncovered scenarios to tests, then regenerate coverage.")
            }
            Self::MultipleTestFiles => {
                Some("Split feature file so each feature maps to exactly one test file.")
            }
            Self::CoverageUnreadable => Some("Regenerate or fix the .feature.coverage file."),
            Self::CycleDetected => Some("Remove a dependsOn link to keep the graph acyclic."),
            Self::CorruptSnapshot => Some("Run `specflow validate` and repair the listed entries."),
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `specflow` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures raised by the status transition validator and its gates.
///
/// Every variant is fatal to the requested operation and guarantees that no
/// part of the mutation was applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("work unit not found: {id}")]
    WorkUnitNotFound { id: String },

    #[error("illegal transition for {id}: {from} -> {to} ({reason})")]
    IllegalTransition {
        id: String,
        from: Status,
        to: Status,
        reason: &'static str,
    },

    #[error("a reason is required to move {id} to blocked")]
    MissingBlockedReason { id: String },

    #[error("transition for {id} at {attempted} precedes last history entry at {last}")]
    TimestampRegression {
        id: String,
        last: chrono::DateTime<chrono::Utc>,
        attempted: chrono::DateTime<chrono::Utc>,
    },

    #[error("invalid work unit: {reason}")]
    InvalidWorkUnit { reason: String },

    /// `uncovered` holds scenario names in discovery order (feature order,
    /// then scenario order within the feature).
    #[error("Cannot mark work unit done: {count} scenarios uncovered")]
    CoverageGate { count: usize, uncovered: Vec<String> },

    #[error(
        "Multiple test files detected for feature '{feature}': {}. Split feature file so each feature maps to a single test file.",
        files.join(", ")
    )]
    MultipleTestFiles { feature: String, files: Vec<String> },

    #[error("coverage file for feature '{feature}' could not be parsed: {detail}")]
    CoverageResolution { feature: String, detail: String },
}

impl WorkflowError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::WorkUnitNotFound { .. } => ErrorCode::WorkUnitNotFound,
            Self::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            Self::MissingBlockedReason { .. } => ErrorCode::MissingBlockedReason,
            Self::TimestampRegression { .. } => ErrorCode::TimestampRegression,
            Self::InvalidWorkUnit { .. } => ErrorCode::InvalidWorkUnit,
            Self::CoverageGate { .. } => ErrorCode::CoverageGateFailed,
            Self::MultipleTestFiles { .. } => ErrorCode::MultipleTestFiles,
            Self::CoverageResolution { .. } => ErrorCode::CoverageUnreadable,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
