//! `specflow status`: move a work unit to another column.
//!
//! Runs the full transition validator (state machine, blocked reason,
//! single-test-file check when leaving testing, coverage gate when entering
//! done) and persists the collection only when the move succeeds.

use clap::Args;
use std::io::{self, Write};

use specflow_core::model::Status;
use specflow_core::workflow::{SystemClock, TransitionOptions, TransitionOutcome, TransitionValidator};

use super::Workspace;
use crate::output::{CliError, OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Work unit ID, e.g. `AUTH-001`.
    pub id: String,

    /// Target column.
    pub status: Status,

    /// Permit skipping forward or moving backward.
    #[arg(long = "override")]
    pub allow_override: bool,

    /// Reason recorded in history; required when moving to blocked.
    #[arg(long)]
    pub reason: Option<String>,
}

fn write_outcome(outcome: &TransitionOutcome, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "✓ {}", outcome.message)?;
    for warning in &outcome.warnings {
        writeln!(w, "  warning: {warning}")?;
    }
    if let Some(ref reminder) = outcome.system_reminder {
        writeln!(w)?;
        writeln!(w, "{reminder}")?;
    }
    Ok(())
}

fn write_outcome_text(outcome: &TransitionOutcome, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}  {} -> {}", outcome.work_unit, outcome.from, outcome.to)?;
    for warning in &outcome.warnings {
        writeln!(w, "warning  {warning}")?;
    }
    if let Some(ref reminder) = outcome.system_reminder {
        writeln!(w, "{reminder}")?;
    }
    Ok(())
}

pub fn run_status(
    args: &StatusArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let mut collection = workspace.load_existing()?;
    let catalog = workspace.coverage()?;
    let clock = SystemClock;

    let validator = TransitionValidator::new(&catalog, &clock)
        .with_config(workspace.config.project.workflow.clone());
    let options = TransitionOptions {
        allow_override: args.allow_override,
        reason: args.reason.clone(),
    };

    let outcome = validator.request_transition(&mut collection, &args.id, args.status, &options)?;
    workspace.save(&collection)?;

    render_mode(output, &outcome, write_outcome_text, write_outcome)?;
    Ok(())
}
