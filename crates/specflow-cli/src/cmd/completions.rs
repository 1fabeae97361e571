use clap::Args;
use clap_complete::{Shell, generate};

use crate::output::CliError;

/// Arguments for `specflow completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate shell completion script to stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<(), CliError> {
    let mut out = std::io::stdout();
    generate(shell, command, "specflow", &mut out);
    Ok(())
}
