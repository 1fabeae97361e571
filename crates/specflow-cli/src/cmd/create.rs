//! `specflow create`: register a new work unit.
//!
//! The identifier is issued by the collection as `<PREFIX>-NNN`. All
//! relationship targets must already exist.

use clap::Args;

use specflow_core::model::{Relationships, Status, WorkUnitDraft};
use specflow_core::workflow::{Clock, SystemClock};

use super::Workspace;
use super::show::write_unit;
use crate::output::{CliError, OutputMode, render};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Identifier prefix, e.g. `AUTH` for `AUTH-001`.
    pub prefix: String,

    /// Short title.
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Epic the work unit belongs to.
    #[arg(long)]
    pub epic: Option<String>,

    /// Effort estimate in abstract units.
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Starting column: backlog or specifying.
    #[arg(long, default_value = "backlog")]
    pub status: Status,

    /// Linked feature name (repeatable).
    #[arg(long = "feature", value_name = "FEATURE")]
    pub features: Vec<String>,

    /// Work unit this one depends on (repeatable).
    #[arg(long = "depends-on", value_name = "ID")]
    pub depends_on: Vec<String>,

    /// Work unit this one blocks (repeatable).
    #[arg(long = "blocks", value_name = "ID")]
    pub blocks: Vec<String>,

    /// Work unit blocking this one (repeatable).
    #[arg(long = "blocked-by", value_name = "ID")]
    pub blocked_by: Vec<String>,
}

impl CreateArgs {
    fn draft(&self) -> WorkUnitDraft {
        WorkUnitDraft {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            status: self.status,
            relationships: Relationships {
                depends_on: self.depends_on.clone(),
                blocks: self.blocks.clone(),
                blocked_by: self.blocked_by.clone(),
            },
            estimate: self.estimate,
            epic: self.epic.clone(),
            linked_features: self.features.clone(),
        }
    }
}

pub fn run_create(
    args: &CreateArgs,
    output: OutputMode,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let mut collection = workspace.load()?;
    let unit = collection
        .create_work_unit(&args.prefix, args.draft(), SystemClock.now())?
        .clone();
    workspace.save(&collection)?;
    tracing::info!(id = %unit.id, status = %unit.status, "work unit created");

    render(output, &unit, |unit, w| match output {
        OutputMode::Text => writeln!(w, "{}", unit.id),
        _ => {
            writeln!(w, "✓ Created {}", unit.id)?;
            write_unit(unit, w)
        }
    })?;
    Ok(())
}
