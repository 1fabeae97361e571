pub mod completions;
pub mod coverage;
pub mod create;
pub mod critical_path;
pub mod cycles;
pub mod orphans;
pub mod show;
pub mod status;
pub mod validate;

use std::path::Path;
use std::time::Duration;

use specflow_core::WorkUnitCollection;
use specflow_core::config::EffectiveConfig;
use specflow_core::coverage::CoverageCatalog;
use specflow_core::error::ErrorCode;
use specflow_core::store::{self, JsonFileRepository, Repository};

use crate::output::CliError;

/// Store and coverage locations for one invocation, resolved against the
/// project root.
pub struct Workspace {
    pub config: EffectiveConfig,
    pub repo: JsonFileRepository,
    coverage_dir: std::path::PathBuf,
}

impl Workspace {
    pub fn open(project_root: &Path, config: EffectiveConfig) -> Self {
        let store_cfg = &config.project.store;
        let repo = JsonFileRepository::new(
            project_root.join(&store_cfg.path),
            Duration::from_millis(store_cfg.lock_timeout_ms),
        );
        let coverage_dir = project_root.join(&config.project.coverage.dir);
        Self {
            config,
            repo,
            coverage_dir,
        }
    }

    /// Load the collection; a missing store is an empty collection.
    pub fn load(&self) -> Result<WorkUnitCollection, CliError> {
        Ok(self.repo.load()?)
    }

    /// Load the collection, refusing when no store has been written yet.
    pub fn load_existing(&self) -> Result<WorkUnitCollection, CliError> {
        if !self.repo.exists() {
            return Err(CliError::coded(
                format!("no work units yet: {} does not exist", self.repo.path().display()),
                ErrorCode::NotInitialized,
            ));
        }
        self.load()
    }

    pub fn save(&self, collection: &WorkUnitCollection) -> Result<(), CliError> {
        Ok(self.repo.save(collection)?)
    }

    pub fn coverage(&self) -> Result<CoverageCatalog, CliError> {
        Ok(store::load_coverage_catalog(&self.coverage_dir)?)
    }
}
