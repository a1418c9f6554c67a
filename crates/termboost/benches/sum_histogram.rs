//! Benchmark for histogram bucket aggregation across bucket shapes.
//!
//! Run with: cargo bench --bench sum_histogram

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use termboost::{sum_histogram_buckets, BucketShape, HistogramBuckets, StatEntry};

fn make_buckets(shape: BucketShape, n_buckets: usize) -> HistogramBuckets {
    let mut buckets = HistogramBuckets::new(shape, n_buckets).unwrap();
    for i in 0..n_buckets {
        let mut bucket = buckets.at_mut(i);
        bucket.set_count(i as u64 + 1);
        bucket.set_weight(i as f64 + 1.0);
        for k in 0..shape.vector_len() {
            let g = ((i * 31 + k * 7) % 97) as f64 * 0.01 - 0.5;
            bucket.set_stat(k, StatEntry::new(g, 0.25));
        }
    }
    buckets
}

fn bench_sum_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_histogram_buckets");

    let shapes = [
        ("regression", BucketShape::Regression),
        ("binary", BucketShape::Binary),
        ("multiclass_3", BucketShape::Multiclass(3)),
        ("multiclass_10", BucketShape::Multiclass(10)),
    ];

    for n_buckets in [64usize, 256, 4096] {
        for (name, shape) in shapes {
            let buckets = make_buckets(shape, n_buckets);
            let mut totals = vec![StatEntry::default(); shape.vector_len()];
            group.throughput(Throughput::Elements(n_buckets as u64));
            group.bench_with_input(BenchmarkId::new(name, n_buckets), &buckets, |b, buckets| {
                b.iter(|| {
                    totals.fill(StatEntry::default());
                    sum_histogram_buckets(black_box(buckets), &mut totals).unwrap();
                    black_box(&totals);
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_sum_histogram);
criterion_main!(benches);
