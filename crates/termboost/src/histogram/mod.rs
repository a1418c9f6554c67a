//! Histogram bucket storage and aggregation.
//!
//! - [`BucketShape`] - record layout for regression, binary, or multiclass targets
//! - [`HistogramBuckets`] - contiguous fixed-stride bucket records
//! - [`sum_histogram_buckets`] - per-output totals across all buckets of a term
//!
//! Buckets are produced per term per round by the histogram builder and
//! consumed immediately by aggregation and split search.

mod aggregate;
mod bucket;
mod shape;

pub use aggregate::{
    bucket_totals, sum_histogram_buckets, sum_histogram_buckets_verified, verify_bucket_totals,
    BucketTotals,
};
pub use bucket::{BucketMut, BucketRef, HistogramBuckets, StatEntry, StatsView};
pub use shape::{BucketShape, WORD_BYTES};
