//! Summation of per-output statistics across a term's buckets.
//!
//! Split search sweeps bins from one end to the other and needs the total on
//! the far side at every step, so the grand total over all buckets is computed
//! once per term from the histogram rather than from the samples.
//!
//! The shape is dispatched once into a loop specialized on the number of words
//! per statistic entry; the loop itself only knows the record stride.

use super::bucket::{HistogramBuckets, StatEntry, STATS};
use crate::error::{BoostError, Result};

/// Sample count and weight summed over a bucket array.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketTotals {
    pub samples: u64,
    pub weight: f64,
}

/// Add every bucket's per-output statistics into `totals`.
///
/// `totals` is accumulated into, not overwritten. Terms with fewer than two
/// buckets carry no split information and are expected to be filtered out by
/// the caller.
///
/// # Errors
///
/// `InvalidParameter` unless `totals` has exactly `buckets.shape().vector_len()`
/// entries. `totals` is untouched on error.
pub fn sum_histogram_buckets(buckets: &HistogramBuckets, totals: &mut [StatEntry]) -> Result<()> {
    let shape = buckets.shape();
    debug_assert!(buckets.len() >= 2, "single-bucket terms are filtered upstream");
    if totals.len() != shape.vector_len() {
        return Err(BoostError::invalid_param(format!(
            "totals hold {} entries, buckets carry {}",
            totals.len(),
            shape.vector_len()
        )));
    }

    tracing::trace!(n_buckets = buckets.len(), ?shape, "summing histogram buckets");

    let record_words = shape.record_words();
    if shape.has_hessian() {
        accumulate::<2>(buckets.words(), record_words, totals);
    } else {
        accumulate::<1>(buckets.words(), record_words, totals);
    }
    Ok(())
}

/// [`sum_histogram_buckets`], cross-checking sample and weight totals against
/// the histogram builder's expectation in debug builds.
pub fn sum_histogram_buckets_verified(
    buckets: &HistogramBuckets,
    totals: &mut [StatEntry],
    expected: BucketTotals,
) -> Result<()> {
    sum_histogram_buckets(buckets, totals)?;
    debug_assert!(
        verify_bucket_totals(buckets, expected).is_ok(),
        "histogram totals disagree with expected {:?}",
        expected
    );
    Ok(())
}

#[inline]
fn accumulate<const W: usize>(words: &[u64], record_words: usize, totals: &mut [StatEntry]) {
    for record in words.chunks_exact(record_words) {
        let stats = &record[STATS..];
        for (total, entry) in totals.iter_mut().zip(stats.chunks_exact(W)) {
            total.sum_gradient += f64::from_bits(entry[0]);
            if W == 2 {
                total.sum_hessian += f64::from_bits(entry[1]);
            }
        }
    }
}

/// Sample count and total weight over all buckets.
pub fn bucket_totals(buckets: &HistogramBuckets) -> BucketTotals {
    buckets.iter().fold(BucketTotals::default(), |acc, bucket| BucketTotals {
        samples: acc.samples + bucket.count(),
        weight: acc.weight + bucket.weight(),
    })
}

/// Check the buckets against the totals the histogram builder saw.
///
/// Sample counts must match exactly. The expected weight may be up to 0.1%
/// below or 0.01% above the bucket sum, since summation order differs.
pub fn verify_bucket_totals(
    buckets: &HistogramBuckets,
    expected: BucketTotals,
) -> Result<BucketTotals> {
    let actual = bucket_totals(buckets);
    if actual.samples != expected.samples {
        return Err(BoostError::InvalidState("bucket sample count mismatch"));
    }
    let within = actual.weight * 0.999 <= expected.weight && expected.weight <= actual.weight * 1.0001;
    if !within {
        return Err(BoostError::InvalidState("bucket weight mismatch"));
    }
    Ok(actual)
}
