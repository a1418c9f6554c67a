//! Histogram bucket layout and aggregation tests.

use rstest::rstest;

use termboost::{
    sum_histogram_buckets, sum_histogram_buckets_verified, verify_bucket_totals, BoostError,
    BoosterConfig, BoosterCore, BoosterShell, BucketShape, BucketTotals, Feature,
    HistogramBuckets, SampleSet, StatEntry, Target,
};

/// Synthetic statistics with distinct values per bucket and output.
fn synthetic(shape: BucketShape, n_buckets: usize) -> (HistogramBuckets, Vec<StatEntry>) {
    let mut buckets = HistogramBuckets::new(shape, n_buckets).unwrap();
    let mut expected = vec![StatEntry::default(); shape.vector_len()];
    for i in 0..n_buckets {
        let mut bucket = buckets.at_mut(i);
        bucket.set_count(i as u64 + 1);
        bucket.set_weight(0.5 * (i as f64 + 1.0));
        for (k, total) in expected.iter_mut().enumerate() {
            let hessian = if shape.has_hessian() { 0.25 * k as f64 + 1.0 } else { 0.0 };
            let stat = StatEntry::new(i as f64 - 0.5 * k as f64, hessian);
            bucket.set_stat(k, stat);
            *total += stat;
        }
    }
    (buckets, expected)
}

#[rstest]
#[case::regression(BucketShape::Regression, 2)]
#[case::regression_many(BucketShape::Regression, 17)]
#[case::binary(BucketShape::Binary, 5)]
#[case::multiclass_2(BucketShape::Multiclass(2), 4)]
#[case::multiclass_3(BucketShape::Multiclass(3), 7)]
#[case::multiclass_10(BucketShape::Multiclass(10), 12)]
fn totals_match_elementwise_sum(#[case] shape: BucketShape, #[case] n_buckets: usize) {
    let (buckets, expected) = synthetic(shape, n_buckets);
    let mut totals = vec![StatEntry::default(); shape.vector_len()];
    sum_histogram_buckets(&buckets, &mut totals).unwrap();
    assert_eq!(totals, expected);

    let n = n_buckets as u64;
    let weight = 0.25 * (n * (n + 1)) as f64;
    let mut verified = vec![StatEntry::default(); shape.vector_len()];
    sum_histogram_buckets_verified(
        &buckets,
        &mut verified,
        BucketTotals { samples: n * (n + 1) / 2, weight },
    )
    .unwrap();
    assert_eq!(verified, expected);
}

#[rstest]
#[case(BucketShape::Regression, 3, 24)]
#[case(BucketShape::Binary, 4, 32)]
#[case(BucketShape::Multiclass(3), 8, 64)]
#[case(BucketShape::Multiclass(10), 22, 176)]
fn record_stride(#[case] shape: BucketShape, #[case] words: usize, #[case] bytes: usize) {
    assert_eq!(shape.record_words(), words);
    assert_eq!(shape.record_stride(), bytes);
    let buckets = HistogramBuckets::new(shape, 3).unwrap();
    assert_eq!(buckets.record_stride(), bytes);
}

#[test]
fn binary_buckets_scenario() {
    let buckets = HistogramBuckets::from_records(
        BucketShape::Binary,
        [
            (5u64, 5.0, &[StatEntry::new(2.0, 0.0)][..]),
            (3u64, 3.0, &[StatEntry::new(-1.0, 0.0)][..]),
        ],
    )
    .unwrap();
    let mut totals = [StatEntry::default()];
    sum_histogram_buckets(&buckets, &mut totals).unwrap();
    assert_eq!(totals[0].sum_gradient, 1.0);

    let checked = verify_bucket_totals(&buckets, BucketTotals { samples: 8, weight: 8.0 }).unwrap();
    assert_eq!(checked.samples, 8);
    assert_eq!(checked.weight, 8.0);
}

#[rstest]
#[case::exact(8, 8.0, true)]
#[case::slightly_low(8, 7.995, true)]
#[case::slightly_high(8, 8.0005, true)]
#[case::too_low(8, 7.9, false)]
#[case::too_high(8, 8.01, false)]
#[case::count_mismatch(9, 8.0, false)]
fn weight_band(#[case] samples: u64, #[case] weight: f64, #[case] ok: bool) {
    let buckets = HistogramBuckets::from_records(
        BucketShape::Regression,
        [
            (5u64, 5.0, &[StatEntry::gradient(1.0)][..]),
            (3u64, 3.0, &[StatEntry::gradient(1.0)][..]),
        ],
    )
    .unwrap();
    let result = verify_bucket_totals(&buckets, BucketTotals { samples, weight });
    assert_eq!(result.is_ok(), ok);
    if !ok {
        assert!(matches!(result, Err(BoostError::InvalidState(_))));
    }
}

#[test]
fn from_records_rejects_wrong_width() {
    let result = HistogramBuckets::from_records(
        BucketShape::Multiclass(3),
        [(1u64, 1.0, &[StatEntry::default(); 2][..])],
    );
    assert!(matches!(result, Err(BoostError::InvalidParameter(_))));
}

// =============================================================================
// Through a session
// =============================================================================

fn shell_for(target: Target) -> BoosterShell {
    let features = vec![Feature::new(4)];
    let core = BoosterCore::new(
        target,
        features,
        &[vec![0]],
        SampleSet::empty(target),
        SampleSet::empty(target),
        BoosterConfig::default(),
    )
    .unwrap();
    BoosterShell::new(core).unwrap()
}

#[rstest]
#[case::regression(Target::Regression, BucketShape::Regression)]
#[case::binary(Target::classification(2), BucketShape::Binary)]
#[case::multiclass(Target::classification(3), BucketShape::Multiclass(3))]
fn session_sums_into_its_accumulator(#[case] target: Target, #[case] shape: BucketShape) {
    let mut shell = shell_for(target);
    let (buckets, expected) = synthetic(shape, 4);
    // repeated calls start from zero
    shell.sum_histogram_buckets(&buckets).unwrap();
    assert_eq!(shell.sum_histogram_buckets(&buckets).unwrap(), expected.as_slice());
}

#[test]
fn session_rejects_foreign_shape() {
    let mut shell = shell_for(Target::classification(3));
    let (buckets, _) = synthetic(BucketShape::Binary, 4);
    assert!(matches!(
        shell.sum_histogram_buckets(&buckets),
        Err(BoostError::InvalidParameter(_))
    ));
}
