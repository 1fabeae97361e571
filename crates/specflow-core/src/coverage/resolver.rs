//! Coverage resolution for a work unit's linked features.
//!
//! Resolution never fails: a feature without a record is reported as
//! [`FeatureCoverageStatus::Missing`], one whose record cannot be parsed as
//! [`FeatureCoverageStatus::Malformed`]. Callers decide how fatal either is.

use serde::Serialize;
use tracing::{debug, instrument};

use super::{CoverageLookup, CoverageSource};
use crate::model::WorkUnit;

/// Coverage outcome for one linked feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FeatureCoverageStatus {
    #[serde(rename_all = "camelCase")]
    Resolved {
        total: usize,
        covered: usize,
        /// Uncovered scenario names in record order.
        uncovered: Vec<String>,
    },
    Missing,
    Malformed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCoverage {
    pub feature: String,
    #[serde(flatten)]
    pub status: FeatureCoverageStatus,
}

/// Per-feature coverage for one work unit, in `linked_features` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub work_unit: String,
    pub features: Vec<FeatureCoverage>,
}

impl CoverageReport {
    #[must_use]
    pub fn total_scenarios(&self) -> usize {
        self.resolved().map(|(total, _, _)| total).sum()
    }

    #[must_use]
    pub fn covered_scenarios(&self) -> usize {
        self.resolved().map(|(_, covered, _)| covered).sum()
    }

    #[must_use]
    pub fn uncovered_count(&self) -> usize {
        self.resolved().map(|(_, _, uncovered)| uncovered.len()).sum()
    }

    /// Uncovered scenario names: feature order, then scenario order.
    #[must_use]
    pub fn uncovered_names(&self) -> Vec<String> {
        self.resolved()
            .flat_map(|(_, _, uncovered)| uncovered.iter().cloned())
            .collect()
    }

    /// Features whose coverage record does not exist.
    pub fn missing_features(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter(|f| f.status == FeatureCoverageStatus::Missing)
            .map(|f| f.feature.as_str())
    }

    /// Features whose coverage record exists but failed to parse, with the
    /// parse error.
    pub fn malformed_features(&self) -> impl Iterator<Item = (&str, &str)> {
        self.features.iter().filter_map(|f| match &f.status {
            FeatureCoverageStatus::Malformed { detail } => {
                Some((f.feature.as_str(), detail.as_str()))
            }
            _ => None,
        })
    }

    fn resolved(&self) -> impl Iterator<Item = (usize, usize, &[String])> {
        self.features.iter().filter_map(|f| match &f.status {
            FeatureCoverageStatus::Resolved {
                total,
                covered,
                uncovered,
            } => Some((*total, *covered, uncovered.as_slice())),
            _ => None,
        })
    }
}

/// Summarize coverage for every feature linked to `unit`.
#[instrument(skip_all, fields(work_unit = %unit.id))]
pub fn resolve_coverage(unit: &WorkUnit, source: &dyn CoverageSource) -> CoverageReport {
    let features = unit
        .linked_features
        .iter()
        .map(|feature| {
            let status = match source.lookup(feature) {
                CoverageLookup::Found(record) => FeatureCoverageStatus::Resolved {
                    total: record.scenarios.len(),
                    covered: record.covered_count(),
                    uncovered: record.uncovered().map(str::to_string).collect(),
                },
                CoverageLookup::Missing => FeatureCoverageStatus::Missing,
                CoverageLookup::Malformed(detail) => FeatureCoverageStatus::Malformed {
                    detail: detail.to_string(),
                },
            };
            debug!(%feature, ?status, "resolved feature coverage");
            FeatureCoverage {
                feature: feature.clone(),
                status,
            }
        })
        .collect();

    CoverageReport {
        work_unit: unit.id.clone(),
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageCatalog;
    use chrono::Utc;

    fn unit_with_features(features: &[&str]) -> WorkUnit {
        let now = Utc::now();
        WorkUnit {
            id: "AUTH-001".into(),
            title: "login".into(),
            description: None,
            status: crate::model::Status::Validating,
            state_history: Vec::new(),
            relationships: crate::model::Relationships::default(),
            estimate: None,
            epic: None,
            linked_features: features.iter().map(|f| (*f).to_string()).collect(),
            blocked_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> CoverageCatalog {
        let mut c = CoverageCatalog::new();
        c.insert_json(
            "login",
            r#"{"scenarios":[
                {"name":"a","testMappings":[{"file":"t.rs","lines":"1-2"}]},
                {"name":"b","testMappings":[]},
                {"name":"c"}
            ]}"#,
        );
        c.insert_json(
            "logout",
            r#"{"scenarios":[
                {"name":"d"},
                {"name":"e","testMappings":[{"file":"u.rs","lines":"3"}]}
            ]}"#,
        );
        c.insert_json("broken", "[1,2");
        c
    }

    #[test]
    fn aggregates_in_feature_then_scenario_order() {
        let report = resolve_coverage(&unit_with_features(&["login", "logout"]), &catalog());

        assert_eq!(report.total_scenarios(), 5);
        assert_eq!(report.covered_scenarios(), 2);
        assert_eq!(report.uncovered_count(), 3);
        assert_eq!(report.uncovered_names(), vec!["b", "c", "d"]);
    }

    #[test]
    fn missing_and_malformed_are_markers_not_failures() {
        let report = resolve_coverage(
            &unit_with_features(&["login", "ghost", "broken"]),
            &catalog(),
        );

        assert_eq!(report.features.len(), 3);
        assert_eq!(report.missing_features().collect::<Vec<_>>(), vec!["ghost"]);
        let malformed: Vec<_> = report.malformed_features().collect();
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].0, "broken");
        // Only resolved features contribute counts.
        assert_eq!(report.total_scenarios(), 3);
    }

    #[test]
    fn no_linked_features_yields_empty_report() {
        let report = resolve_coverage(&unit_with_features(&[]), &catalog());
        assert!(report.features.is_empty());
        assert_eq!(report.uncovered_count(), 0);
    }

    #[test]
    fn report_serializes_with_state_tag() {
        let report = resolve_coverage(&unit_with_features(&["login", "ghost"]), &catalog());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["workUnit"], "AUTH-001");
        assert_eq!(json["features"][0]["state"], "resolved");
        assert_eq!(json["features"][0]["uncovered"][0], "b");
        assert_eq!(json["features"][1]["state"], "missing");
    }
}
