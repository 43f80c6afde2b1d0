//! Resolver micro-benchmarks over the fixture dataset.
//!
//! Run with:
//! ```
//! cargo bench --bench resolve
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use opsdash::test_support::sample_dataset;
use opsdash::Ownership;
use std::hint::black_box;

fn bench_resolvers(c: &mut Criterion) {
    let ownership = Ownership::from_dataset(sample_dataset());

    let mut group = c.benchmark_group("resolve");

    group.bench_function("route_annotated", |b| {
        b.iter(|| {
            ownership
                .route_owners(black_box("api_main:/api/internal/graphql [getFoo+getBar]"))
                .unwrap()
        })
    });

    group.bench_function("route_table_fallback", |b| {
        b.iter(|| ownership.route_owners(black_box("main:/profile")).unwrap())
    });

    group.bench_function("route_unknown", |b| {
        b.iter(|| ownership.route_owners(black_box("main:/nonesuch [GET]")).unwrap())
    });

    group.bench_function("file_prefix_walk", |b| {
        b.iter(|| {
            ownership
                .file_owner(black_box("services/users/badges/streaks/render.rs"))
                .unwrap()
        })
    });

    group.bench_function("url_pattern_scan", |b| {
        b.iter(|| ownership.url_owner(black_box("https://example.org/video/42")).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_resolvers);
criterion_main!(benches);
