//! Performance benchmarks for merging and the URL codecs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use statesync::codec::{query, url};
use statesync::{StatePatch, StateStore, StaticLocation, StoreConfig};
use std::sync::Arc;

const BASE: &str = "https://example.com/app/index.html?view=list#top";

fn create_store() -> StateStore {
    StateStore::new(StoreConfig::default(), Arc::new(StaticLocation::new(BASE)))
}

fn build_patch(keys: usize, offset: usize) -> StatePatch {
    (0..keys).fold(StatePatch::new(), |patch, i| {
        patch.set(format!("key{}", i), (i + offset) as i64)
    })
}

/// Benchmark merges against states of varying size
fn bench_update_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_state");

    for keys in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("keys", keys), &keys, |b, &keys| {
            let store = create_store();
            store.update_state(&build_patch(keys, 0), false);
            let patch = build_patch(keys, 1);

            b.iter(|| {
                black_box(store.update_state(&patch, false));
            });
        });
    }

    group.finish();
}

/// Benchmark query parsing with varying parameter counts
fn bench_parse_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_query");

    for params in [5, 50, 500] {
        let input = (0..params)
            .map(|i| format!("param{}=value%20{}", i, i))
            .collect::<Vec<_>>()
            .join("&");

        group.bench_with_input(BenchmarkId::new("params", params), &input, |b, input| {
            b.iter(|| black_box(query::parse(Some(input)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark URL resolution
fn bench_parse_url(c: &mut Criterion) {
    c.bench_function("parse_url_relative", |b| {
        b.iter(|| black_box(url::parse("../docs/./guide?page=2#intro", BASE).unwrap()));
    });

    c.bench_function("parse_url_absolute", |b| {
        b.iter(|| {
            black_box(url::parse("https://user@cdn.example.org:8443/a/b/c?x=1&y=2", BASE).unwrap())
        });
    });
}

/// Benchmark reflecting state into a URL
fn bench_reflect_state_in_url(c: &mut Criterion) {
    let store = create_store();
    store.sync_from_url(None, false).unwrap();
    store.update_state(&build_patch(20, 0), false);

    c.bench_function("reflect_state_in_url", |b| {
        b.iter(|| black_box(store.reflect_state_in_url(None, None).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_update_state,
    bench_parse_query,
    bench_parse_url,
    bench_reflect_state_in_url
);
criterion_main!(benches);
