//! Status transition validator.
//!
//! [`TransitionValidator::request_transition`] is the only way a work unit
//! changes column. Every check runs against immutable borrows first; the
//! collection is touched only once all of them pass, so a rejected request
//! leaves status, history and column index exactly as they were.

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::clock::Clock;
use super::reminders::system_reminder;
use crate::collection::WorkUnitCollection;
use crate::config::WorkflowConfig;
use crate::coverage::{CoverageSource, enforce_single_test_file, evaluate_done_gate, resolve_coverage};
use crate::error::WorkflowError;
use crate::model::{StateHistoryEntry, Status, TransitionKind};

/// Caller-supplied flags for one transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    /// Permit skips and backward moves.
    pub allow_override: bool,
    /// Recorded on the history entry. Required when entering `blocked`.
    pub reason: Option<String>,
}

impl TransitionOptions {
    #[must_use]
    pub fn with_override() -> Self {
        Self {
            allow_override: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            allow_override: false,
            reason: Some(reason.into()),
        }
    }
}

/// A committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub success: bool,
    pub work_unit: String,
    pub from: Status,
    pub to: Status,
    pub kind: TransitionKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_reminder: Option<String>,
}

/// Validates and applies status changes against a coverage source.
pub struct TransitionValidator<'a> {
    coverage: &'a dyn CoverageSource,
    clock: &'a dyn Clock,
    config: WorkflowConfig,
}

impl<'a> TransitionValidator<'a> {
    #[must_use]
    pub fn new(coverage: &'a dyn CoverageSource, clock: &'a dyn Clock) -> Self {
        Self {
            coverage,
            clock,
            config: WorkflowConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Move work unit `id` to `target`.
    ///
    /// Checks, in order: the unit exists; the move is structurally legal and,
    /// for skips and backward moves, overridden; a blocked reason is present;
    /// the timestamp does not precede the last history entry; leaving
    /// `testing` keeps one test file per feature; entering `done` passes the
    /// coverage gate.
    ///
    /// # Errors
    ///
    /// Any [`WorkflowError`]; on error nothing was mutated.
    #[instrument(skip(self, collection, options))]
    pub fn request_transition(
        &self,
        collection: &mut WorkUnitCollection,
        id: &str,
        target: Status,
        options: &TransitionOptions,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let unit = collection
            .get(id)
            .ok_or_else(|| WorkflowError::WorkUnitNotFound { id: id.to_string() })?;
        let from = unit.status;

        let illegal = |reason: &'static str| WorkflowError::IllegalTransition {
            id: id.to_string(),
            from,
            to: target,
            reason,
        };

        let kind = from
            .classify_transition(target)
            .map_err(|invalid| illegal(invalid.reason))?;

        if kind.requires_override() {
            if !options.allow_override {
                return Err(illegal(match kind {
                    TransitionKind::Retreat => "moving backward requires an override",
                    _ => "skipping states requires an override",
                }));
            }
            if !self.config.allow_override {
                return Err(illegal("overrides are disabled by project config"));
            }
            warn!(%id, %from, to = %target, ?kind, "override applied");
        }

        let reason = options
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if target == Status::Blocked && self.config.require_blocked_reason && reason.is_none() {
            return Err(WorkflowError::MissingBlockedReason { id: id.to_string() });
        }

        let now = self.clock.now();
        if let Some(last) = unit.last_history().map(|entry| entry.timestamp) {
            if now < last {
                return Err(WorkflowError::TimestampRegression {
                    id: id.to_string(),
                    last,
                    attempted: now,
                });
            }
        }

        let mut warnings = Vec::new();

        if from == Status::Testing && target != Status::Blocked {
            warnings.extend(enforce_single_test_file(unit, self.coverage)?);
        }

        if target == Status::Done {
            let report = resolve_coverage(unit, self.coverage);
            warnings.extend(evaluate_done_gate(&report)?.warnings);
        }

        let blocked_reason = (target == Status::Blocked).then(|| reason.clone()).flatten();
        collection.commit_status(
            id,
            StateHistoryEntry {
                state: target,
                timestamp: now,
                reason,
            },
            blocked_reason,
        )?;

        for warning in &warnings {
            warn!(%id, %warning, "transition warning");
        }
        info!(%id, %from, to = %target, ?kind, "work unit transitioned");

        let system_reminder = if self.config.system_reminders {
            system_reminder(id, target)
        } else {
            None
        };

        Ok(TransitionOutcome {
            success: true,
            work_unit: id.to_string(),
            from,
            to: target,
            kind,
            message: format!("Work unit {id} is now {target}"),
            warnings,
            system_reminder,
        })
    }
}
