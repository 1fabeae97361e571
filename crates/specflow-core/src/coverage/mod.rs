//! Acceptance-coverage checks applied to status transitions.
//!
//! ## Submodules
//!
//! - [`resolver`]: turns a work unit's linked features into per-feature
//!   coverage summaries.
//! - [`gate`]: decides whether a unit may enter `done`.
//! - [`uniqueness`]: enforces one test file per feature.
//!
//! All three consult a [`CoverageSource`]; the engine never reads coverage
//! files itself. [`CoverageCatalog`] is the in-memory source the repository
//! layer fills.

pub mod gate;
pub mod resolver;
pub mod uniqueness;

use std::collections::BTreeMap;

use crate::model::CoverageRecord;

pub use gate::{GateOutcome, evaluate_done_gate};
pub use resolver::{CoverageReport, FeatureCoverage, FeatureCoverageStatus, resolve_coverage};
pub use uniqueness::enforce_single_test_file;

/// File suffix of per-feature coverage records.
pub const COVERAGE_SUFFIX: &str = ".feature.coverage";

/// Result of looking up one feature's coverage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageLookup<'a> {
    Found(&'a CoverageRecord),
    Missing,
    /// A record exists but could not be parsed; carries the parse error.
    Malformed(&'a str),
}

/// Read-only access to coverage records by feature.
pub trait CoverageSource {
    fn lookup(&self, feature: &str) -> CoverageLookup<'_>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CatalogEntry {
    Parsed(CoverageRecord),
    Malformed(String),
}

/// In-memory coverage records keyed by normalized feature name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl CoverageCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(&mut self, feature: &str, record: CoverageRecord) {
        self.entries
            .insert(feature_key(feature).to_string(), CatalogEntry::Parsed(record));
    }

    pub fn insert_malformed(&mut self, feature: &str, detail: impl Into<String>) {
        self.entries.insert(
            feature_key(feature).to_string(),
            CatalogEntry::Malformed(detail.into()),
        );
    }

    /// Parse `text` as a record; unparsable text is kept as a malformed entry.
    pub fn insert_json(&mut self, feature: &str, text: &str) {
        match CoverageRecord::from_json(text) {
            Ok(record) => self.insert_record(feature, record),
            Err(detail) => self.insert_malformed(feature, detail),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CoverageSource for CoverageCatalog {
    fn lookup(&self, feature: &str) -> CoverageLookup<'_> {
        match self.entries.get(feature_key(feature)) {
            Some(CatalogEntry::Parsed(record)) => CoverageLookup::Found(record),
            Some(CatalogEntry::Malformed(detail)) => CoverageLookup::Malformed(detail),
            None => CoverageLookup::Missing,
        }
    }
}

/// Normalize a feature reference to its bare name.
///
/// `spec/features/user-login.feature`, `user-login.feature.coverage` and
/// `user-login` all map to `user-login`.
#[must_use]
pub fn feature_key(feature: &str) -> &str {
    let name = feature.rsplit(['/', '\\']).next().unwrap_or(feature);
    name.strip_suffix(COVERAGE_SUFFIX)
        .or_else(|| name.strip_suffix(".feature"))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_key_normalizes_paths_and_suffixes() {
        assert_eq!(feature_key("user-login"), "user-login");
        assert_eq!(feature_key("user-login.feature"), "user-login");
        assert_eq!(feature_key("spec/features/user-login.feature"), "user-login");
        assert_eq!(feature_key("user-login.feature.coverage"), "user-login");
        assert_eq!(feature_key(r"spec\features\user-login.feature"), "user-login");
    }

    #[test]
    fn catalog_distinguishes_found_missing_and_malformed() {
        let mut catalog = CoverageCatalog::new();
        catalog.insert_json("ok", r#"{"scenarios": []}"#);
        catalog.insert_json("broken", "{ not json");

        assert!(matches!(catalog.lookup("ok"), CoverageLookup::Found(_)));
        assert!(matches!(
            catalog.lookup("spec/features/broken.feature"),
            CoverageLookup::Malformed(_)
        ));
        assert_eq!(catalog.lookup("absent"), CoverageLookup::Missing);
        assert_eq!(catalog.len(), 2);
    }
}
