use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use specflow_core::WorkUnitCollection;
use specflow_core::model::{Relationships, WorkUnitDraft};
use specflow_triage::compute_critical_path;
use specflow_triage::graph::{DependencyGraph, find_all_cycles};

const SIZES: [usize; 3] = [100, 1_000, 5_000];

/// ID issued to the `i`-th created unit.
fn id(i: usize) -> String {
    format!("WU-{:03}", i + 1)
}

/// `size` units in blocks of four: each block head depends on the previous
/// head, the other three chain off their predecessor.
fn synthetic(size: usize) -> WorkUnitCollection {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut c = WorkUnitCollection::new();
    for i in 0..size {
        let mut depends_on = Vec::new();
        if i >= 4 {
            depends_on.push(id(i - 4));
        }
        if i % 4 != 0 {
            depends_on.push(id(i - 1));
        }
        c.create_work_unit(
            "WU",
            WorkUnitDraft {
                title: format!("synthetic {i}"),
                estimate: Some(u32::try_from(i % 8).unwrap_or(1)),
                relationships: Relationships {
                    depends_on,
                    ..Relationships::default()
                },
                ..WorkUnitDraft::default()
            },
            now,
        )
        .unwrap();
    }
    c
}

fn bench_critical_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("triage.critical_path");

    for size in SIZES {
        let collection = synthetic(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("compute", size),
            &collection,
            |b, collection| b.iter(|| black_box(compute_critical_path(collection))),
        );

        group.bench_with_input(
            BenchmarkId::new("build_and_cycles", size),
            &collection,
            |b, collection| {
                b.iter(|| {
                    let g = DependencyGraph::from_collection(collection);
                    black_box(find_all_cycles(&g.graph))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_critical_path);
criterion_main!(benches);
