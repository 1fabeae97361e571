//! `specflow critical-path`: the longest `dependsOn` chain, in execution
//! order, with its summed estimate.

use clap::Args;
use std::io::{self, Write};

use specflow_triage::{CriticalPath, compute_critical_path};

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CriticalPathArgs {}

fn write_pretty(cp: &CriticalPath, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Critical path")?;
    if cp.is_empty() {
        return writeln!(w, "No work units.");
    }
    for (step, id) in cp.path.iter().enumerate() {
        writeln!(w, "{:>3}. {id}", step + 1)?;
    }
    writeln!(w)?;
    pretty_kv(w, "Length", cp.length.to_string())?;
    pretty_kv(w, "Effort", cp.estimated_effort.to_string())
}

fn write_text(cp: &CriticalPath, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}  length={}  effort={}",
        cp.path.join(" -> "),
        cp.length,
        cp.estimated_effort
    )
}

pub fn run_critical_path(
    _args: &CriticalPathArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let collection = workspace.load()?;
    let cp = compute_critical_path(&collection)?;
    render_mode(output, &cp, write_text, write_pretty)?;
    Ok(())
}
