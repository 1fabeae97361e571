use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Directory holding project state, relative to the project root.
pub const PROJECT_DIR: &str = ".specflow";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Knobs for the status transition validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Attach phase guidance to successful transitions.
    #[serde(default = "default_true")]
    pub system_reminders: bool,
    /// When false, skips and backward moves are refused even with `--override`.
    #[serde(default = "default_true")]
    pub allow_override: bool,
    #[serde(default = "default_true")]
    pub require_blocked_reason: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            system_reminders: default_true(),
            allow_override: default_true(),
            require_blocked_reason: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Directory of `<feature>.feature.coverage` files, relative to the
    /// project root.
    #[serde(default = "default_coverage_dir")]
    pub dir: PathBuf,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            dir: default_coverage_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("specflow/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config and output-mode sources.
///
/// `cli_format` is an explicit `--format`/`--json` choice and wins over
/// everything else.
pub fn resolve_config(project_root: &Path, cli_format: Option<&str>) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Output mode precedence: CLI flag, `FORMAT` env, user config, then TTY
/// detection. Unrecognized values fall through to the next source.
#[must_use]
pub fn resolve_output(
    cli_format: Option<&str>,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    [cli_format, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .map_or_else(
            || {
                if std::io::stdout().is_terminal() {
                    "pretty".to_string()
                } else {
                    "text".to_string()
                }
            },
            str::to_string,
        )
}

const fn default_true() -> bool {
    true
}

fn default_coverage_dir() -> PathBuf {
    PathBuf::from("spec/features")
}

fn default_store_path() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("work-units.json")
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}
