//! Graph analyses over collections built the way the CLI builds them:
//! through `create_work_unit`, so IDs and relationships are validated.

use chrono::{DateTime, TimeZone, Utc};

use specflow_core::WorkUnitCollection;
use specflow_core::model::{Relationships, WorkUnitDraft};
use specflow_triage::graph::{graph_health, relationship_issues};
use specflow_triage::{GraphError, SUGGESTED_ACTIONS, compute_critical_path, find_orphans};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()
}

fn add(
    c: &mut WorkUnitCollection,
    prefix: &str,
    depends_on: &[&str],
    estimate: Option<u32>,
    epic: Option<&str>,
) -> String {
    c.create_work_unit(
        prefix,
        WorkUnitDraft {
            title: format!("{prefix} work"),
            estimate,
            epic: epic.map(str::to_string),
            relationships: Relationships {
                depends_on: depends_on.iter().map(|d| (*d).to_string()).collect(),
                ..Relationships::default()
            },
            ..WorkUnitDraft::default()
        },
        now(),
    )
    .unwrap()
    .id
    .clone()
}

// ---------------------------------------------------------------------------
// Critical path
// ---------------------------------------------------------------------------

#[test]
fn four_unit_chain_beats_two_shorter_chains() {
    let mut c = WorkUnitCollection::new();
    let db = add(&mut c, "DB", &[], Some(5), Some("platform"));
    let auth = add(&mut c, "AUTH", &[&db], Some(3), Some("platform"));
    let ui = add(&mut c, "UI", &[&auth], Some(2), Some("platform"));
    let feat = add(&mut c, "FEAT", &[&ui], Some(8), Some("platform"));

    let docs = add(&mut c, "DOCS", &[], Some(1), Some("docs"));
    add(&mut c, "DOCS", &[&docs], Some(1), Some("docs"));
    let ops = add(&mut c, "OPS", &[], Some(20), Some("ops"));
    let ops2 = add(&mut c, "OPS", &[&ops], Some(20), Some("ops"));
    add(&mut c, "OPS", &[&ops2], Some(20), Some("ops"));

    let cp = compute_critical_path(&c).unwrap();

    assert_eq!(cp.length, 4);
    let mut members = cp.path.clone();
    members.sort();
    let mut expected = vec![feat.clone(), ui.clone(), auth.clone(), db.clone()];
    expected.sort();
    assert_eq!(members, expected);
    assert_eq!(cp.path, vec![db, auth, ui, feat]);
    assert_eq!(cp.estimated_effort, 5 + 3 + 2 + 8);

    let json = serde_json::to_value(&cp).unwrap();
    assert_eq!(json["length"], 4);
    assert_eq!(json["estimatedEffort"], 18);
    assert_eq!(json["path"][0], "DB-001");
}

#[test]
fn lone_unit_is_path_of_one() {
    let mut c = WorkUnitCollection::new();
    let only = add(&mut c, "SOLO", &[], None, None);

    let cp = compute_critical_path(&c).unwrap();
    assert_eq!(cp.path, vec![only]);
    assert_eq!(cp.length, 1);
    assert_eq!(cp.estimated_effort, 0);
}

#[test]
fn cycle_loaded_from_snapshot_is_rejected() {
    // create_work_unit cannot produce cycles; snapshots can.
    let snapshot = r#"{"workUnits": {
        "A-001": {"id":"A-001","title":"a","status":"backlog","dependsOn":["B-001"],
                  "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"},
        "B-001": {"id":"B-001","title":"b","status":"backlog","dependsOn":["A-001"],
                  "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}
    }}"#;
    let c: WorkUnitCollection = serde_json::from_str(snapshot).unwrap();

    let err = compute_critical_path(&c).unwrap_err();
    let GraphError::CycleDetected { cycle } = &err;
    assert_eq!(cycle, &vec!["A-001".to_string(), "B-001".into(), "A-001".into()]);
    assert_eq!(err.code().code(), "E4001");

    let health = graph_health(&c);
    assert_eq!(health.cycles.len(), 1);
    assert!(relationship_issues(&c).is_empty());
}

#[test]
fn nested_relationships_in_snapshot_feed_the_graph() {
    let snapshot = r#"{"workUnits": {
        "A-001": {"id":"A-001","title":"a","status":"backlog","estimate":2,
                  "relationships":{"dependsOn":["B-001"],"blockedBy":["B-001"]},
                  "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"},
        "B-001": {"id":"B-001","title":"b","status":"backlog","estimate":5,
                  "relationships":{"blocks":["A-001"]},
                  "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}
    }}"#;
    let c: WorkUnitCollection = serde_json::from_str(snapshot).unwrap();

    let cp = compute_critical_path(&c).unwrap();
    assert_eq!(cp.path, vec!["B-001".to_string(), "A-001".into()]);
    assert_eq!(cp.estimated_effort, 7);
    assert!(find_orphans(&c).is_empty());
    assert!(relationship_issues(&c).is_empty());
}

// ---------------------------------------------------------------------------
// Orphans
// ---------------------------------------------------------------------------

#[test]
fn orphans_are_exactly_the_unattached_units() {
    let mut c = WorkUnitCollection::new();
    let grouped = add(&mut c, "EPIC", &[], None, Some("billing"));
    add(&mut c, "DEP", &[&grouped], None, None);
    let lone_a = add(&mut c, "LONE", &[], None, None);
    let lone_b = add(&mut c, "LONE", &[], Some(2), None);

    let orphans = find_orphans(&c);
    let ids: Vec<String> = orphans.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![lone_a, lone_b]);
    assert!(
        orphans
            .iter()
            .all(|o| o.suggested_actions == SUGGESTED_ACTIONS.map(str::to_string))
    );
}
