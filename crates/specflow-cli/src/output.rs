//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for agents, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.
//!
//! Steps 2-4 live in `specflow_core::config::resolve_output`; this module
//! only maps the resolved name back onto [`OutputMode`].
//!
//! # Errors
//!
//! Failures are rendered exactly once, by `main`, through [`render_error`].
//! In JSON mode the shape is `{"error": {"message", "suggestion",
//! "error_code", ...details}}` on stderr.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::io::{self, Write};

use specflow_core::WorkflowError;
use specflow_core::error::ErrorCode;
use specflow_core::store::StoreError;
use specflow_triage::GraphError;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a name produced by `resolve_output` back onto a mode.
    ///
    /// Unknown names fall back to text, the agent-safe choice.
    pub fn from_resolved(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Text,
        }
    }

    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A structured error with optional suggestion, error code and details.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Machine-readable context, e.g. the uncovered scenario names.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
            details: Map::new(),
        }
    }

    /// Error carrying the code and hint of `code`.
    pub fn coded(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
            details: Map::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        self.details
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }
}

impl From<&WorkflowError> for CliError {
    fn from(err: &WorkflowError) -> Self {
        let base = Self::coded(err.to_string(), err.code());
        match err {
            WorkflowError::WorkUnitNotFound { id } => base.with_detail("id", id),
            WorkflowError::IllegalTransition { id, from, to, .. } => base
                .with_detail("id", id)
                .with_detail("from", from)
                .with_detail("to", to),
            WorkflowError::CoverageGate { count, uncovered } => base
                .with_detail("count", count)
                .with_detail("uncovered", uncovered),
            WorkflowError::MultipleTestFiles { feature, files } => base
                .with_detail("feature", feature)
                .with_detail("files", files),
            WorkflowError::CoverageResolution { feature, .. } => base.with_detail("feature", feature),
            WorkflowError::MissingBlockedReason { .. }
            | WorkflowError::TimestampRegression { .. }
            | WorkflowError::InvalidWorkUnit { .. } => base,
        }
    }
}

impl From<WorkflowError> for CliError {
    fn from(err: WorkflowError) -> Self {
        Self::from(&err)
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let base = Self::coded(err.to_string(), err.code());
        match err {
            StoreError::Invalid(invalid) => base.with_detail("violations", invalid.violations),
            StoreError::Lock(_) | StoreError::Io { .. } | StoreError::Corrupt { .. } => base,
        }
    }
}

impl From<GraphError> for CliError {
    fn from(err: GraphError) -> Self {
        let base = Self::coded(err.to_string(), err.code());
        match err {
            GraphError::CycleDetected { cycle } => base.with_detail("cycle", cycle),
        }
    }
}

/// Anything not already mapped is an internal failure.
impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::coded(format!("{err:#}"), ErrorCode::InternalUnexpected)
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::from(anyhow::Error::from(err))
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text mode,
/// the provided `human_fn` closure is called to produce text output.
/// For distinct text/pretty rendering, use [`render_mode`].
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = json!({ "error": error });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(Value::Array(items)) = error
                .details
                .get("uncovered")
                .or_else(|| error.details.get("files"))
            {
                for item in items {
                    if let Some(text) = item.as_str() {
                        writeln!(out, "  - {text}")?;
                    }
                }
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}
