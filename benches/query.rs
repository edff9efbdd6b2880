//! Benchmarks for query execution over in-memory tables.
//!
//! Benchmark targets:
//! - Unfiltered page of 10 from 10k records: <1ms
//! - Filtered + sorted page from 10k records: <10ms
//! - Key resolution by `user_id` (worst case, full scans): <1ms

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use storefront::models::{Filter, FilterOp, Query, Record, Value};
use storefront::services::identity;
use storefront::services::query::execute;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn orders(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let i = i64::try_from(i).unwrap_or(i64::MAX);
            Record::from_iter([
                ("id", Value::from(format!("o-{i}"))),
                ("user_id", Value::from(format!("u-{}", i % 97))),
                ("status", Value::from(if i % 3 == 0 { "paid" } else { "new" })),
                ("email", Value::from(format!("buyer{i}@example.com"))),
                ("total", Value::from(i % 500)),
            ])
        })
        .collect()
}

fn bench_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("page");
    group.measurement_time(Duration::from_secs(5));

    for size in SIZES {
        let data = orders(size);
        group.throughput(Throughput::Elements(size as u64));

        let plain = Query::new().with_page(1, 10);
        group.bench_with_input(BenchmarkId::new("unfiltered", size), &data, |b, data| {
            b.iter(|| execute(black_box(data), black_box(&plain)));
        });

        let filtered = Query::new()
            .with_filter(Filter::equal("status", "paid"))
            .with_filter(Filter::new("email", FilterOp::Like, "%9@%"))
            .with_order("total", false)
            .with_page(2, 25);
        group.bench_with_input(BenchmarkId::new("filtered_sorted", size), &data, |b, data| {
            b.iter(|| execute(black_box(data), black_box(&filtered)));
        });
    }

    group.finish();
}

fn bench_identity(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity");

    for size in SIZES {
        let data = orders(size);
        let key = Value::from("u-96");
        group.bench_with_input(BenchmarkId::new("by_user_id", size), &data, |b, data| {
            b.iter(|| identity::locate(black_box(data), black_box(&key)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_page, bench_identity);
criterion_main!(benches);
