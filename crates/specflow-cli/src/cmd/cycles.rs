//! `specflow cycles`: every dependency cycle in the collection.
//!
//! Finding cycles is not an error here; `critical-path` is the command that
//! refuses a cyclic graph. Exits non-zero when any cycle exists so scripts
//! can gate on it.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use specflow_core::error::ErrorCode;
use specflow_triage::graph::{DanglingEdge, DependencyGraph, find_all_cycles};

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CyclesArgs {}

#[derive(Debug, Serialize)]
struct CyclesView {
    cycles: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dangling: Vec<DanglingEdge>,
}

fn write_pretty(view: &CyclesView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Dependency cycles ({})", view.cycles.len()))?;
    for cycle in &view.cycles {
        writeln!(w, "{}", cycle.join(", "))?;
    }
    for edge in &view.dangling {
        writeln!(w, "  warning: {} depends on unknown {}", edge.from, edge.to)?;
    }
    Ok(())
}

fn write_text(view: &CyclesView, w: &mut dyn Write) -> io::Result<()> {
    for cycle in &view.cycles {
        writeln!(w, "{}", cycle.join(" "))?;
    }
    Ok(())
}

pub fn run_cycles(
    _args: &CyclesArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let collection = workspace.load()?;
    let graph = DependencyGraph::from_collection(&collection);
    let view = CyclesView {
        cycles: find_all_cycles(&graph.graph),
        dangling: graph.dangling,
    };
    render_mode(output, &view, write_text, write_pretty)?;

    if view.cycles.is_empty() {
        Ok(())
    } else {
        Err(CliError::coded(
            format!("{} dependency cycle(s) found", view.cycles.len()),
            ErrorCode::CycleDetected,
        )
        .with_detail("cycles", &view.cycles))
    }
}
