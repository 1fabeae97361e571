//! `specflow validate`: structural health of the stored collection.
//!
//! Checks, in order: collection invariants (column index, history order),
//! relationship diagnostics (unknown targets, self references, missing
//! mirrors) and dependency cycles. Relationship diagnostics are advisory;
//! invariant violations and cycles fail the command.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use specflow_core::collection::InvariantViolation;
use specflow_core::error::ErrorCode;
use specflow_core::store::{Repository, StoreError};
use specflow_triage::graph::{RelationshipIssue, graph_health, relationship_issues};

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ValidateArgs {}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    valid: bool,
    work_units: usize,
    invariant_violations: Vec<InvariantViolation>,
    relationship_issues: Vec<RelationshipIssue>,
    cycles: Vec<Vec<String>>,
    orphans: usize,
}

fn write_pretty(report: &ValidationReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Validation")?;
    pretty_kv(w, "Work units", report.work_units.to_string())?;
    pretty_kv(w, "Orphans", report.orphans.to_string())?;
    for violation in &report.invariant_violations {
        writeln!(w, "  ✗ {violation}")?;
    }
    for cycle in &report.cycles {
        writeln!(w, "  ✗ cycle: {}", cycle.join(", "))?;
    }
    for issue in &report.relationship_issues {
        writeln!(w, "  ! {issue}")?;
    }
    if report.valid {
        writeln!(w, "✓ collection is valid")?;
    }
    Ok(())
}

fn write_text(report: &ValidationReport, w: &mut dyn Write) -> io::Result<()> {
    for violation in &report.invariant_violations {
        writeln!(w, "invariant  {violation}")?;
    }
    for cycle in &report.cycles {
        writeln!(w, "cycle  {}", cycle.join(" "))?;
    }
    for issue in &report.relationship_issues {
        writeln!(w, "relationship  {issue}")?;
    }
    writeln!(w, "valid  {}", report.valid)
}

pub fn run_validate(
    _args: &ValidateArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let report = match workspace.repo.load() {
        Ok(collection) => {
            let health = graph_health(&collection);
            let invariant_violations = collection.check_invariants();
            ValidationReport {
                valid: invariant_violations.is_empty() && health.cycles.is_empty(),
                work_units: collection.len(),
                invariant_violations,
                relationship_issues: relationship_issues(&collection),
                cycles: health.cycles,
                orphans: health.orphans,
            }
        }
        Err(StoreError::Invalid(err)) => ValidationReport {
            invariant_violations: err.violations,
            ..ValidationReport::default()
        },
        Err(other) => return Err(other.into()),
    };
    render_mode(output, &report, write_text, write_pretty)?;

    if report.valid {
        return Ok(());
    }
    let problems = report.invariant_violations.len() + report.cycles.len();
    let code = if report.invariant_violations.is_empty() {
        ErrorCode::CycleDetected
    } else {
        ErrorCode::CorruptSnapshot
    };
    Err(CliError::coded(format!("validation failed: {problems} problem(s)"), code))
}
