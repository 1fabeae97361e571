//! `specflow show`: one work unit with its full status history.

use clap::Args;
use std::io::{self, Write};

use specflow_core::WorkflowError;
use specflow_core::model::WorkUnit;

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Work unit ID, e.g. `AUTH-001`.
    pub id: String,
}

fn joined(ids: &[String]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}

/// Human rendering shared with `create`.
pub fn write_unit(unit: &WorkUnit, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{}  {}", unit.id, unit.title))?;
    pretty_kv(w, "Status", unit.status.as_str())?;
    if let Some(ref reason) = unit.blocked_reason {
        pretty_kv(w, "Blocked", reason)?;
    }
    pretty_kv(w, "Epic", unit.epic.as_deref().unwrap_or("-"))?;
    pretty_kv(
        w,
        "Estimate",
        unit.estimate.map_or_else(|| "-".to_string(), |e| e.to_string()),
    )?;
    pretty_kv(w, "Features", joined(&unit.linked_features))?;
    pretty_kv(w, "Depends on", joined(&unit.relationships.depends_on))?;
    pretty_kv(w, "Blocks", joined(&unit.relationships.blocks))?;
    pretty_kv(w, "Blocked by", joined(&unit.relationships.blocked_by))?;
    if let Some(ref description) = unit.description {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }
    writeln!(w)?;
    writeln!(w, "History:")?;
    for entry in &unit.state_history {
        match entry.reason {
            Some(ref reason) => writeln!(
                w,
                "  {}  {:<12} {reason}",
                entry.timestamp.to_rfc3339(),
                entry.state.as_str()
            )?,
            None => writeln!(w, "  {}  {}", entry.timestamp.to_rfc3339(), entry.state.as_str())?,
        }
    }
    Ok(())
}

fn write_unit_text(unit: &WorkUnit, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}  {}  {}", unit.id, unit.status, unit.title)?;
    if let Some(ref reason) = unit.blocked_reason {
        writeln!(w, "blocked_reason  {reason}")?;
    }
    for entry in &unit.state_history {
        writeln!(w, "history  {}  {}", entry.timestamp.to_rfc3339(), entry.state)?;
    }
    Ok(())
}

pub fn run_show(args: &ShowArgs, output: OutputMode, workspace: &Workspace) -> Result<(), CliError> {
    let collection = workspace.load_existing()?;
    let unit = collection
        .get(&args.id)
        .ok_or_else(|| WorkflowError::WorkUnitNotFound { id: args.id.clone() })?;

    render(output, unit, |unit, w| match output {
        OutputMode::Text => write_unit_text(unit, w),
        _ => write_unit(unit, w),
    })?;
    Ok(())
}
