//! Benchmarks for hybrid index operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hybrid_art::key::{encode_u64, BigEndianU64};
use hybrid_art::HybridIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn generate_random_values(n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|_| rng.gen()).collect()
}

fn build_index(values: &[u64], merged: bool) -> HybridIndex<BigEndianU64> {
    let mut index = HybridIndex::new(BigEndianU64);
    for &v in values {
        index.insert(&encode_u64(v), v);
    }
    if merged {
        index.merge();
    }
    index
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let values = generate_random_values(size);

        group.bench_with_input(BenchmarkId::new("HybridIndex", size), &values, |b, values| {
            b.iter(|| black_box(build_index(values, false)));
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &values, |b, values| {
            b.iter(|| {
                let mut map: BTreeMap<[u8; 8], u64> = BTreeMap::new();
                for &v in values {
                    map.insert(encode_u64(v), v);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [1_000, 10_000, 100_000] {
        let values = generate_random_values(size);
        let dynamic = build_index(&values, false);
        let frozen = build_index(&values, true);

        for (name, index) in [("dynamic", &dynamic), ("static", &frozen)] {
            group.bench_with_input(BenchmarkId::new(name, size), &values, |b, values| {
                b.iter(|| {
                    let mut found = 0usize;
                    for &v in values {
                        if index.get(&encode_u64(v)).is_some() {
                            found += 1;
                        }
                    }
                    black_box(found)
                });
            });
        }
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    group.sample_size(20);

    for size in [10_000, 100_000] {
        let values = generate_random_values(size * 2);
        let (older, newer) = values.split_at(size);

        group.bench_function(BenchmarkId::new("freeze", size), |b| {
            b.iter_with_setup(|| build_index(older, false), |mut index| black_box(index.merge()));
        });

        group.bench_function(BenchmarkId::new("into_static", size), |b| {
            b.iter_with_setup(
                || {
                    let mut index = build_index(older, true);
                    for &v in newer {
                        index.insert(&encode_u64(v), v);
                    }
                    index
                },
                |mut index| black_box(index.merge()),
            );
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let values = generate_random_values(100_000);
    let (older, newer) = values.split_at(90_000);
    let mut index = build_index(older, true);
    for &v in newer {
        index.insert(&encode_u64(v), v);
    }

    for count in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("HybridIndex", count), &count, |b, &count| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| {
                let start = encode_u64(rng.gen());
                black_box(index.scan(&start, count))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_merge, bench_scan);
criterion_main!(benches);
