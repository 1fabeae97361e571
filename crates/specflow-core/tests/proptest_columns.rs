use proptest::prelude::*;

use chrono::{Duration, TimeZone, Utc};

use specflow_core::collection::WorkUnitCollection;
use specflow_core::coverage::CoverageCatalog;
use specflow_core::model::{Status, WorkUnitDraft};
use specflow_core::workflow::{FixedClock, TransitionOptions, TransitionValidator};

fn arb_status() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

fn arb_step() -> impl Strategy<Value = (usize, Status, bool, bool)> {
    (0..4usize, arb_status(), any::<bool>(), any::<bool>())
}

fn collection(units: usize) -> WorkUnitCollection {
    let mut c = WorkUnitCollection::new();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    for i in 0..units {
        c.create_work_unit(
            "WU",
            WorkUnitDraft {
                title: format!("unit {i}"),
                ..WorkUnitDraft::default()
            },
            t0,
        )
        .unwrap();
    }
    c
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    /// Whatever sequence of requests is made, accepted or rejected, every
    /// unit stays in exactly the column matching its status and its history
    /// stays ordered and ends at its status.
    #[test]
    fn column_index_tracks_status(steps in prop::collection::vec(arb_step(), 1..60)) {
        let mut c = collection(4);
        let ids: Vec<String> = c.iter().map(|u| u.id.clone()).collect();
        let catalog = CoverageCatalog::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let validator = TransitionValidator::new(&catalog, &clock);

        for (idx, target, with_override, with_reason) in steps {
            clock.advance(Duration::seconds(1));
            let options = TransitionOptions {
                allow_override: with_override,
                reason: with_reason.then(|| "blocked by upstream".to_string()),
            };
            let before = c.clone();
            let result = validator.request_transition(&mut c, &ids[idx], target, &options);

            if result.is_err() {
                prop_assert_eq!(&c, &before);
            } else {
                prop_assert_eq!(c.get(&ids[idx]).map(|u| u.status), Some(target));
            }
            prop_assert!(c.check_invariants().is_empty(), "{:?}", c.check_invariants());
        }

        let total: usize = Status::ALL.iter().map(|s| c.column(*s).len()).sum();
        prop_assert_eq!(total, c.len());
    }

    /// Done never has outgoing transitions, override or not.
    #[test]
    fn done_is_terminal(target in arb_status(), with_override in any::<bool>()) {
        let mut c = collection(1);
        let catalog = CoverageCatalog::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let validator = TransitionValidator::new(&catalog, &clock);
        validator
            .request_transition(&mut c, "WU-001", Status::Done, &TransitionOptions::with_override())
            .unwrap();

        let options = TransitionOptions {
            allow_override: with_override,
            reason: Some("r".into()),
        };
        prop_assert!(validator.request_transition(&mut c, "WU-001", target, &options).is_err());
        prop_assert_eq!(c.get("WU-001").map(|u| u.status), Some(Status::Done));
    }
}
