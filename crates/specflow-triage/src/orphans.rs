//! Orphan detection.
//!
//! An orphan has no epic and no relationship of any kind, so nothing ties it
//! to the rest of the plan. Every orphan carries the same fixed advice.

use serde::Serialize;
use specflow_core::WorkUnitCollection;
use tracing::{debug, instrument};

/// Remediations offered for every orphan, in display order.
pub const SUGGESTED_ACTIONS: [&str; 3] = ["Assign epic", "Add relationship", "Delete"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orphan {
    pub id: String,
    pub suggested_actions: Vec<String>,
}

/// Every orphan work unit, in identifier order.
#[must_use]
#[instrument(skip(collection), fields(work_units = collection.len()))]
pub fn find_orphans(collection: &WorkUnitCollection) -> Vec<Orphan> {
    let orphans: Vec<Orphan> = collection
        .iter()
        .filter(|unit| unit.is_orphan())
        .map(|unit| Orphan {
            id: unit.id.clone(),
            suggested_actions: SUGGESTED_ACTIONS.iter().map(|s| (*s).to_string()).collect(),
        })
        .collect();
    debug!(orphans = orphans.len(), "orphan scan complete");
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unit;
    use specflow_core::model::Relationships;

    #[test]
    fn only_units_without_epic_or_relationships() {
        let mut with_epic = unit("EPIC-001", &[], None);
        with_epic.epic = Some("checkout".into());
        let with_dep = unit("DEP-001", &["EPIC-001"], None);
        let mut with_blocks = unit("BLK-001", &[], None);
        with_blocks.relationships = Relationships {
            blocks: vec!["EPIC-001".into()],
            ..Relationships::default()
        };
        let mut blank_epic = unit("BLANK-001", &[], None);
        blank_epic.epic = Some("  ".into());
        let lonely = unit("LONE-001", &[], Some(3));

        let c = WorkUnitCollection::from_units([with_epic, with_dep, with_blocks, blank_epic, lonely])
            .unwrap();
        let orphans = find_orphans(&c);

        let ids: Vec<&str> = orphans.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["BLANK-001", "LONE-001"]);
        for orphan in &orphans {
            assert_eq!(
                orphan.suggested_actions,
                vec!["Assign epic", "Add relationship", "Delete"]
            );
        }
    }

    #[test]
    fn empty_collection_has_no_orphans() {
        assert!(find_orphans(&WorkUnitCollection::new()).is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let c = WorkUnitCollection::from_units([unit("LONE-001", &[], None)]).unwrap();
        let json = serde_json::to_value(find_orphans(&c)).unwrap();
        assert_eq!(json[0]["id"], "LONE-001");
        assert_eq!(json[0]["suggestedActions"][2], "Delete");
    }
}
