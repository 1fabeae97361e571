//! `specflow orphans`: work units with neither an epic nor a relationship.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use specflow_triage::{Orphan, find_orphans};

use super::Workspace;
use crate::output::{CliError, OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct OrphansArgs {}

#[derive(Debug, Serialize)]
struct OrphansView {
    orphans: Vec<Orphan>,
}

fn write_pretty(view: &OrphansView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Orphans ({})", view.orphans.len()))?;
    for orphan in &view.orphans {
        writeln!(w, "{}", orphan.id)?;
        writeln!(w, "    suggested: {}", orphan.suggested_actions.join(" | "))?;
    }
    Ok(())
}

fn write_text(view: &OrphansView, w: &mut dyn Write) -> io::Result<()> {
    for orphan in &view.orphans {
        writeln!(w, "{}", orphan.id)?;
    }
    Ok(())
}

pub fn run_orphans(
    _args: &OrphansArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let collection = workspace.load()?;
    let view = OrphansView {
        orphans: find_orphans(&collection),
    };
    render_mode(output, &view, write_text, write_pretty)?;
    Ok(())
}
