//! `specflow coverage`: per-feature scenario coverage for one work unit,
//! plus the verdicts of the done gate and the single-test-file check.
//!
//! Read-only: nothing is persisted and a failing gate is reported, not
//! raised.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use specflow_core::WorkflowError;
use specflow_core::coverage::{
    CoverageReport, FeatureCoverageStatus, enforce_single_test_file, evaluate_done_gate,
    resolve_coverage,
};

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Work unit ID, e.g. `AUTH-001`.
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverageView {
    #[serde(flatten)]
    report: CoverageReport,
    total_scenarios: usize,
    covered_scenarios: usize,
    ready_for_done: bool,
    /// Why the done gate would refuse, if it would.
    #[serde(skip_serializing_if = "Option::is_none")]
    gate_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_file_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

fn write_pretty(view: &CoverageView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Coverage for {}", view.report.work_unit))?;
    if view.report.features.is_empty() {
        writeln!(w, "No linked features.")?;
    }
    for feature in &view.report.features {
        match feature.status {
            FeatureCoverageStatus::Resolved {
                total,
                covered,
                ref uncovered,
            } => {
                writeln!(w, "{}  {covered}/{total} scenarios covered", feature.feature)?;
                for name in uncovered {
                    writeln!(w, "    ✗ {name}")?;
                }
            }
            FeatureCoverageStatus::Missing => {
                writeln!(w, "{}  no coverage file", feature.feature)?;
            }
            FeatureCoverageStatus::Malformed { ref detail } => {
                writeln!(w, "{}  unreadable: {detail}", feature.feature)?;
            }
        }
    }
    writeln!(w)?;
    pretty_kv(
        w,
        "Total",
        format!("{}/{}", view.covered_scenarios, view.total_scenarios),
    )?;
    pretty_kv(w, "Done gate", view.gate_error.as_deref().unwrap_or("passes"))?;
    pretty_kv(w, "Test files", view.test_file_error.as_deref().unwrap_or("one per feature"))?;
    for warning in &view.warnings {
        writeln!(w, "  warning: {warning}")?;
    }
    Ok(())
}

fn write_text(view: &CoverageView, w: &mut dyn Write) -> io::Result<()> {
    for feature in &view.report.features {
        match feature.status {
            FeatureCoverageStatus::Resolved { total, covered, .. } => {
                writeln!(w, "{}  {covered}/{total}", feature.feature)?;
            }
            FeatureCoverageStatus::Missing => writeln!(w, "{}  missing", feature.feature)?,
            FeatureCoverageStatus::Malformed { .. } => {
                writeln!(w, "{}  malformed", feature.feature)?;
            }
        }
    }
    writeln!(w, "ready_for_done  {}", view.ready_for_done)
}

pub fn run_coverage(
    args: &CoverageArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let collection = workspace.load_existing()?;
    let unit = collection
        .get(&args.id)
        .ok_or_else(|| WorkflowError::WorkUnitNotFound { id: args.id.clone() })?;
    let catalog = workspace.coverage()?;

    let report = resolve_coverage(unit, &catalog);
    let mut warnings = Vec::new();
    let gate_error = match evaluate_done_gate(&report) {
        Ok(gate) => {
            warnings.extend(gate.warnings);
            None
        }
        Err(err) => Some(err.to_string()),
    };
    let test_file_error = match enforce_single_test_file(unit, &catalog) {
        Ok(extra) => {
            warnings.extend(extra);
            None
        }
        Err(err) => Some(err.to_string()),
    };

    let view = CoverageView {
        total_scenarios: report.total_scenarios(),
        covered_scenarios: report.covered_scenarios(),
        ready_for_done: gate_error.is_none(),
        report,
        gate_error,
        test_file_error,
        warnings,
    };
    render_mode(output, &view, write_text, write_pretty)?;
    Ok(())
}
