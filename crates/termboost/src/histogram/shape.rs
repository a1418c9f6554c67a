//! Bucket shape descriptors.

use crate::model::Target;

/// Size of one storage word in a bucket record.
pub const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Layout of one histogram bucket record, resolved once per bucket array.
///
/// ```text
/// Regression:     [count, weight, g]
/// Binary:         [count, weight, g, h]
/// Multiclass(K):  [count, weight, g0, h0, g1, h1, ..., g{K-1}, h{K-1}]
/// ```
///
/// Classification entries carry a hessian slot; regression entries do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketShape {
    Regression,
    Binary,
    /// Generic multiclass with `K` statistic entries per bucket.
    Multiclass(usize),
}

impl BucketShape {
    /// Shape for a session target. `None` for degenerate targets.
    pub fn for_target(target: Target) -> Option<Self> {
        match target {
            Target::Regression => Some(BucketShape::Regression),
            Target::Classification { n_classes } if n_classes <= 1 => None,
            Target::Classification { n_classes: 2 } => Some(BucketShape::Binary),
            Target::Classification { n_classes } => Some(BucketShape::Multiclass(n_classes)),
        }
    }

    /// Statistic entries per bucket.
    #[inline]
    pub fn vector_len(self) -> usize {
        match self {
            BucketShape::Regression | BucketShape::Binary => 1,
            BucketShape::Multiclass(n_classes) => n_classes,
        }
    }

    #[inline]
    pub fn has_hessian(self) -> bool {
        !matches!(self, BucketShape::Regression)
    }

    /// Words per statistic entry.
    #[inline]
    pub fn stat_words(self) -> usize {
        if self.has_hessian() {
            2
        } else {
            1
        }
    }

    /// Words per bucket record: count, weight, then the statistics.
    #[inline]
    pub fn record_words(self) -> usize {
        2 + self.vector_len() * self.stat_words()
    }

    /// Bytes per bucket record.
    #[inline]
    pub fn record_stride(self) -> usize {
        self.record_words() * WORD_BYTES
    }
}
