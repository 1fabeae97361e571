//! One-feature-to-one-test-file enforcement.
//!
//! A feature whose scenarios are implemented across several test files
//! fragments coverage reasoning, so leaving `testing` requires every linked
//! feature to map to at most one distinct test file. This check is
//! independent of coverage completeness.

use tracing::{debug, warn};

use super::{CoverageLookup, CoverageSource};
use crate::error::WorkflowError;
use crate::model::WorkUnit;

/// Check every linked feature of `unit` maps to at most one test file.
///
/// Features without a coverage record have nothing to check. Features whose
/// record is malformed cannot be checked; they produce a warning instead of
/// an error.
///
/// # Errors
///
/// [`WorkflowError::MultipleTestFiles`] for the first feature (in
/// `linked_features` order) that maps to more than one test file.
pub fn enforce_single_test_file(
    unit: &WorkUnit,
    source: &dyn CoverageSource,
) -> Result<Vec<String>, WorkflowError> {
    let mut warnings = Vec::new();

    for feature in &unit.linked_features {
        match source.lookup(feature) {
            CoverageLookup::Found(record) => {
                let files = record.distinct_test_files();
                debug!(work_unit = %unit.id, %feature, files = files.len(), "distinct test files");
                if files.len() > 1 {
                    return Err(WorkflowError::MultipleTestFiles {
                        feature: feature.clone(),
                        files,
                    });
                }
            }
            CoverageLookup::Missing => {}
            CoverageLookup::Malformed(detail) => {
                warn!(work_unit = %unit.id, %feature, %detail, "skipping uniqueness check");
                warnings.push(format!(
                    "Coverage file for {feature} could not be parsed; test file uniqueness not checked"
                ));
            }
        }
    }

    Ok(warnings)
}
