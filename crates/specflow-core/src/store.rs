//! Persistence of the work-unit collection and loading of coverage records.
//!
//! The engine never performs I/O itself: commands load a
//! [`WorkUnitCollection`] through a [`Repository`], build a
//! [`CoverageCatalog`] with [`load_coverage_catalog`], run the validator and
//! save the result.
//!
//! Concurrency: [`JsonFileRepository`] serializes individual loads and saves
//! with an advisory lock, and replaces the snapshot atomically. It does not
//! hold the lock across a load-mutate-save cycle, so two concurrent writers
//! are last-writer-wins.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::collection::{SnapshotError, WorkUnitCollection};
use crate::coverage::{COVERAGE_SUFFIX, CoverageCatalog};
use crate::error::ErrorCode;
use crate::lock::{LockError, StoreLock};

/// Failures loading or saving a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Lock(#[from] LockError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(#[from] SnapshotError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Lock(err) => err.code(),
            Self::Io { .. } => ErrorCode::SnapshotWriteFailed,
            Self::Corrupt { .. } | Self::Invalid(_) => ErrorCode::CorruptSnapshot,
        }
    }
}

/// Load/save access to the work-unit collection.
pub trait Repository {
    /// Load the collection. A store that has never been written yields an
    /// empty collection.
    ///
    /// # Errors
    ///
    /// I/O failures, lock timeouts, unparsable JSON and snapshot invariant
    /// violations.
    fn load(&self) -> Result<WorkUnitCollection, StoreError>;

    /// Persist the whole collection.
    ///
    /// # Errors
    ///
    /// I/O failures and lock timeouts.
    fn save(&self, collection: &WorkUnitCollection) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Camel-case JSON snapshot on disk, guarded by an advisory lock file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileRepository {
    /// `path` is the snapshot file; the lock file lives beside it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        let path = path.into();
        let lock_path = path
            .parent()
            .map_or_else(|| PathBuf::from("lock"), |dir| dir.join("lock"));
        Self {
            path,
            lock_path,
            lock_timeout,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Repository for JsonFileRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<WorkUnitCollection, StoreError> {
        if !self.path.exists() {
            debug!("no snapshot yet; starting empty");
            return Ok(WorkUnitCollection::new());
        }

        let _lock = StoreLock::shared(&self.lock_path, self.lock_timeout)?;
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let snapshot = serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let collection = WorkUnitCollection::from_snapshot(snapshot)?;
        debug!(work_units = collection.len(), "snapshot loaded");
        Ok(collection)
    }

    #[instrument(skip(self, collection), fields(path = %self.path.display()))]
    fn save(&self, collection: &WorkUnitCollection) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let _lock = StoreLock::exclusive(&self.lock_path, self.lock_timeout)?;

        let mut json = serde_json::to_string_pretty(collection).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        json.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        let write_tmp = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        if let Err(err) = write_tmp() {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(err));
        }

        info!(work_units = collection.len(), "snapshot saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Repository kept in memory, for embedding callers and tests that need no disk.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    collection: RefCell<WorkUnitCollection>,
    saves: RefCell<usize>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new(collection: WorkUnitCollection) -> Self {
        Self {
            collection: RefCell::new(collection),
            saves: RefCell::new(0),
        }
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl Repository for InMemoryRepository {
    fn load(&self) -> Result<WorkUnitCollection, StoreError> {
        Ok(self.collection.borrow().clone())
    }

    fn save(&self, collection: &WorkUnitCollection) -> Result<(), StoreError> {
        *self.collection.borrow_mut() = collection.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coverage files
// ---------------------------------------------------------------------------

/// Read every `*.feature.coverage` file in `dir` into a catalog.
///
/// A missing directory yields an empty catalog, so every linked feature
/// resolves as missing. Files that cannot be read or parsed are kept as
/// malformed entries with the error text.
///
/// # Errors
///
/// Only when `dir` exists but cannot be listed.
#[instrument]
pub fn load_coverage_catalog(dir: &Path) -> anyhow::Result<CoverageCatalog> {
    let mut catalog = CoverageCatalog::new();
    if !dir.is_dir() {
        debug!("coverage directory absent");
        return Ok(catalog);
    }

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(feature) = name.strip_suffix(COVERAGE_SUFFIX) else {
            continue;
        };

        match fs::read_to_string(&path) {
            Ok(text) => catalog.insert_json(feature, &text),
            Err(err) => {
                warn!(file = %path.display(), %err, "unreadable coverage file");
                catalog.insert_malformed(feature, err.to_string());
            }
        }
    }

    debug!(records = catalog.len(), "coverage catalog loaded");
    Ok(catalog)
}
