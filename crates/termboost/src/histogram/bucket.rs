//! Fixed-stride histogram bucket storage.
//!
//! Buckets are stored back to back in a single `u64` buffer. Each record is
//! `shape.record_words()` words long: the sample count, the total weight
//! (`f64` bits), then one [`StatEntry`] per output. Records are addressed by
//! index times stride; there is no per-record header.

use std::ops::AddAssign;

use super::shape::BucketShape;
use crate::error::{BoostError, Result};

const COUNT: usize = 0;
const WEIGHT: usize = 1;
pub(super) const STATS: usize = 2;

// =============================================================================
// StatEntry
// =============================================================================

/// Accumulated statistics for one output at one bin.
///
/// Regression buckets have no hessian slot; reading one yields `sum_hessian = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatEntry {
    pub sum_gradient: f64,
    pub sum_hessian: f64,
}

impl StatEntry {
    #[inline]
    pub fn new(sum_gradient: f64, sum_hessian: f64) -> Self {
        Self {
            sum_gradient,
            sum_hessian,
        }
    }

    /// Gradient-only entry (regression).
    #[inline]
    pub fn gradient(sum_gradient: f64) -> Self {
        Self::new(sum_gradient, 0.0)
    }

    #[inline]
    pub fn add(&mut self, other: &StatEntry) {
        self.sum_gradient += other.sum_gradient;
        self.sum_hessian += other.sum_hessian;
    }
}

impl AddAssign for StatEntry {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.add(&rhs);
    }
}

// =============================================================================
// Views
// =============================================================================

/// Read-only view of one bucket record.
#[derive(Debug, Clone, Copy)]
pub struct BucketRef<'a> {
    words: &'a [u64],
    shape: BucketShape,
}

impl<'a> BucketRef<'a> {
    #[inline]
    pub fn count(&self) -> u64 {
        self.words[COUNT]
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        f64::from_bits(self.words[WEIGHT])
    }

    /// Per-output statistics of this bucket.
    #[inline]
    pub fn stats(&self) -> StatsView<'a> {
        let words: &'a [u64] = self.words;
        StatsView {
            words: &words[STATS..],
            stat_words: self.shape.stat_words(),
        }
    }
}

/// Typed view over the statistics slice of a bucket.
#[derive(Debug, Clone, Copy)]
pub struct StatsView<'a> {
    words: &'a [u64],
    stat_words: usize,
}

impl<'a> StatsView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len() / self.stat_words
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn get(&self, output: usize) -> StatEntry {
        let base = output * self.stat_words;
        let sum_hessian = if self.stat_words == 2 {
            f64::from_bits(self.words[base + 1])
        } else {
            0.0
        };
        StatEntry::new(f64::from_bits(self.words[base]), sum_hessian)
    }

    pub fn iter(&self) -> impl Iterator<Item = StatEntry> + 'a {
        let view = *self;
        (0..view.len()).map(move |k| view.get(k))
    }
}

/// Mutable view of one bucket record.
#[derive(Debug)]
pub struct BucketMut<'a> {
    words: &'a mut [u64],
    shape: BucketShape,
}

impl BucketMut<'_> {
    #[inline]
    pub fn set_count(&mut self, count: u64) {
        self.words[COUNT] = count;
    }

    #[inline]
    pub fn set_weight(&mut self, weight: f64) {
        self.words[WEIGHT] = weight.to_bits();
    }

    /// Overwrite the statistics of one output.
    ///
    /// The hessian is dropped for shapes without a hessian slot.
    #[inline]
    pub fn set_stat(&mut self, output: usize, stat: StatEntry) {
        let stat_words = self.shape.stat_words();
        let base = STATS + output * stat_words;
        self.words[base] = stat.sum_gradient.to_bits();
        if stat_words == 2 {
            self.words[base + 1] = stat.sum_hessian.to_bits();
        }
    }
}

// =============================================================================
// HistogramBuckets
// =============================================================================

/// A compacted array of fixed-stride bucket records for one term.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBuckets {
    shape: BucketShape,
    words: Vec<u64>,
}

impl HistogramBuckets {
    /// `n_buckets` zeroed records.
    pub fn new(shape: BucketShape, n_buckets: usize) -> Result<Self> {
        let len = n_buckets
            .checked_mul(shape.record_words())
            .ok_or_else(|| BoostError::invalid_param("bucket array size overflows"))?;
        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(BoostError::alloc(len))?;
        words.resize(len, 0);
        Ok(Self { shape, words })
    }

    /// Build from `(count, weight, stats)` records.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if a record does not carry `shape.vector_len()` stats.
    pub fn from_records<'s, I>(shape: BucketShape, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, f64, &'s [StatEntry])>,
        I::IntoIter: ExactSizeIterator,
    {
        let records = records.into_iter();
        let mut buckets = Self::new(shape, records.len())?;
        for (i, (count, weight, stats)) in records.enumerate() {
            if stats.len() != shape.vector_len() {
                return Err(BoostError::invalid_param(format!(
                    "bucket {}: expected {} stats, got {}",
                    i,
                    shape.vector_len(),
                    stats.len()
                )));
            }
            let mut bucket = buckets.at_mut(i);
            bucket.set_count(count);
            bucket.set_weight(weight);
            for (k, stat) in stats.iter().enumerate() {
                bucket.set_stat(k, *stat);
            }
        }
        Ok(buckets)
    }

    #[inline]
    pub fn shape(&self) -> BucketShape {
        self.shape
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len() / self.shape.record_words()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Bytes between consecutive records.
    #[inline]
    pub fn record_stride(&self) -> usize {
        self.shape.record_stride()
    }

    #[inline]
    pub fn at(&self, index: usize) -> BucketRef<'_> {
        let stride = self.shape.record_words();
        BucketRef {
            words: &self.words[index * stride..(index + 1) * stride],
            shape: self.shape,
        }
    }

    #[inline]
    pub fn at_mut(&mut self, index: usize) -> BucketMut<'_> {
        let stride = self.shape.record_words();
        BucketMut {
            words: &mut self.words[index * stride..(index + 1) * stride],
            shape: self.shape,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = BucketRef<'_>> + '_ {
        let shape = self.shape;
        self.words
            .chunks_exact(shape.record_words())
            .map(move |words| BucketRef { words, shape })
    }

    /// Raw record words, `len() * shape().record_words()` long.
    #[inline]
    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }
}
