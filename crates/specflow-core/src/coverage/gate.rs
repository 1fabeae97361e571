//! Completion gate for the `done` transition.

use tracing::{info, warn};

use super::CoverageReport;
use crate::error::WorkflowError;

/// A passing gate decision. Warnings never block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateOutcome {
    pub warnings: Vec<String>,
}

/// Decide whether a work unit with this coverage may be marked done.
///
/// - a malformed coverage record fails the gate, naming the first such
///   feature
/// - any uncovered scenario fails the gate; the error carries the exact
///   count and the names in discovery order
/// - otherwise the gate passes, with one warning per feature whose coverage
///   record is missing
///
/// # Errors
///
/// [`WorkflowError::CoverageResolution`] or [`WorkflowError::CoverageGate`].
pub fn evaluate_done_gate(report: &CoverageReport) -> Result<GateOutcome, WorkflowError> {
    if let Some((feature, detail)) = report.malformed_features().next() {
        warn!(work_unit = %report.work_unit, %feature, "coverage record unreadable");
        return Err(WorkflowError::CoverageResolution {
            feature: feature.to_string(),
            detail: detail.to_string(),
        });
    }

    let uncovered = report.uncovered_names();
    if !uncovered.is_empty() {
        info!(
            work_unit = %report.work_unit,
            count = uncovered.len(),
            "done gate failed on uncovered scenarios"
        );
        return Err(WorkflowError::CoverageGate {
            count: uncovered.len(),
            uncovered,
        });
    }

    let warnings = report
        .missing_features()
        .map(|feature| format!("Coverage file not found for {feature}"))
        .collect();
    Ok(GateOutcome { warnings })
}
