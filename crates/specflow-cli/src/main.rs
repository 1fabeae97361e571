#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use specflow_core::config::{resolve_config, resolve_output};
use specflow_core::error::ErrorCode;
use std::env;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "specflow: spec-driven work-unit workflow",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Explicit output choice from flags, if any.
    fn format_flag(&self) -> Option<&'static str> {
        self.format
            .map(OutputMode::as_str)
            .or_else(|| self.json.then_some("json"))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a new work unit",
        long_about = "Create a new work unit in backlog (or specifying) with optional epic, estimate, linked features and relationships.",
        after_help = "EXAMPLES:\n    # Create a unit that depends on another\n    specflow create AUTH --title \"Login flow\" --estimate 3 --depends-on DB-001\n\n    # Link acceptance features\n    specflow create AUTH --title \"Logout\" --feature logout --epic accounts"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a work unit to another status",
        long_about = "Request a status transition. Skips and retreats need --override; blocked needs --reason; done needs full scenario coverage.",
        after_help = "EXAMPLES:\n    # Advance one step\n    specflow status AUTH-001 specifying\n\n    # Park a unit\n    specflow status AUTH-001 blocked --reason \"waiting on API keys\"\n\n    # Jump back with an override\n    specflow status AUTH-001 testing --override --reason \"spec changed\""
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one work unit with its history",
        after_help = "EXAMPLES:\n    specflow show AUTH-001\n\n    # Machine-readable\n    specflow show AUTH-001 --format json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Report scenario coverage for a work unit",
        after_help = "EXAMPLES:\n    # Would AUTH-001 pass the done gate?\n    specflow coverage AUTH-001"
    )]
    Coverage(cmd::coverage::CoverageArgs),

    #[command(
        name = "critical-path",
        next_help_heading = "Analysis",
        about = "Show the longest dependency chain",
        after_help = "EXAMPLES:\n    specflow critical-path\n    specflow critical-path --format json"
    )]
    CriticalPath(cmd::critical_path::CriticalPathArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List work units with no epic and no relationships",
        after_help = "EXAMPLES:\n    specflow orphans"
    )]
    Orphans(cmd::orphans::OrphansArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List dependency cycles",
        after_help = "EXAMPLES:\n    # Non-zero exit when any cycle exists\n    specflow cycles"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Check collection invariants and relationships",
        after_help = "EXAMPLES:\n    specflow validate"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Generate zsh completions\n    specflow completions zsh > ~/.zfunc/_specflow"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SPECFLOW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "specflow=debug,info"
        } else {
            "specflow=info,warn"
        })
    });

    let format = env::var("SPECFLOW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: &mut OutputMode) -> Result<(), CliError> {
    let project_root = env::current_dir()?;
    let config = resolve_config(&project_root, cli.format_flag()).map_err(|err| {
        CliError::coded(format!("{err:#}"), ErrorCode::ConfigParseError)
    })?;
    *output = OutputMode::from_resolved(&config.resolved_output);
    let output = *output;
    let workspace = cmd::Workspace::open(&project_root, config);

    match cli.command {
        Commands::Create(ref args) => cmd::create::run_create(args, output, &workspace),
        Commands::Status(ref args) => cmd::status::run_status(args, output, &workspace),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &workspace),
        Commands::Coverage(ref args) => cmd::coverage::run_coverage(args, output, &workspace),
        Commands::CriticalPath(ref args) => {
            cmd::critical_path::run_critical_path(args, output, &workspace)
        }
        Commands::Orphans(ref args) => cmd::orphans::run_orphans(args, output, &workspace),
        Commands::Cycles(ref args) => cmd::cycles::run_cycles(args, output, &workspace),
        Commands::Validate(ref args) => cmd::validate::run_validate(args, output, &workspace),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    // Errors raised before config resolution still honor explicit flags.
    let env_format = env::var("FORMAT").ok();
    let mut output = OutputMode::from_resolved(&resolve_output(
        cli.format_flag(),
        None,
        env_format.as_deref(),
    ));

    match run(cli, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = %err.message, code = ?err.error_code, "command failed");
            if render_error(output, &err).is_err() {
                eprintln!("error: {}", err.message);
            }
            ExitCode::FAILURE
        }
    }
}
