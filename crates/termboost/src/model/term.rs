//! Features and terms (feature groups).

use serde::{Deserialize, Serialize};

use crate::error::{BoostError, Result};
use crate::logging::LogBudget;

/// A binned input feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub n_bins: usize,
}

impl Feature {
    pub fn new(n_bins: usize) -> Self {
        Self { n_bins }
    }
}

/// An ordered list of feature dimensions modeled jointly by one tensor.
///
/// Dimension order is fixed at construction and determines the flattening
/// order of every tensor over the term: dimension 0 varies fastest, the score
/// vector of a cell is innermost. A term without dimensions is an intercept.
#[derive(Debug)]
pub struct Term {
    features: Box<[usize]>,
    bin_counts: Box<[usize]>,
    n_cells: usize,
    enter_apply_log: LogBudget,
    exit_apply_log: LogBudget,
}

impl Term {
    /// Create a term over `feature_indices` into `features`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if an index is out of range, a feature has no bins,
    /// or the number of cells overflows `usize`.
    pub fn new(features: &[Feature], feature_indices: &[usize], log_budget: i32) -> Result<Self> {
        let mut bin_counts = Vec::with_capacity(feature_indices.len());
        let mut n_cells = 1usize;
        for &f in feature_indices {
            let feature = features.get(f).ok_or_else(|| {
                BoostError::invalid_param(format!(
                    "feature index {} out of range ({} features)",
                    f,
                    features.len()
                ))
            })?;
            if feature.n_bins == 0 {
                return Err(BoostError::invalid_param(format!("feature {} has no bins", f)));
            }
            n_cells = n_cells
                .checked_mul(feature.n_bins)
                .ok_or_else(|| BoostError::invalid_param("term cell count overflows"))?;
            bin_counts.push(feature.n_bins);
        }

        Ok(Self {
            features: feature_indices.into(),
            bin_counts: bin_counts.into_boxed_slice(),
            n_cells,
            enter_apply_log: LogBudget::new(log_budget),
            exit_apply_log: LogBudget::new(log_budget),
        })
    }

    #[inline]
    pub fn n_dimensions(&self) -> usize {
        self.bin_counts.len()
    }

    /// Feature index of each dimension.
    #[inline]
    pub fn features(&self) -> &[usize] {
        &self.features
    }

    /// Bin count of each dimension.
    #[inline]
    pub fn bin_counts(&self) -> &[usize] {
        &self.bin_counts
    }

    /// Number of bin combinations (1 for an intercept).
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Length of an expanded tensor over this term.
    pub fn tensor_len(&self, vector_len: usize) -> Result<usize> {
        self.n_cells
            .checked_mul(vector_len)
            .ok_or_else(|| BoostError::invalid_param("tensor length overflows"))
    }

    /// Flat cell index for one bin per dimension.
    #[inline]
    pub fn cell_index(&self, bins: impl IntoIterator<Item = usize>) -> usize {
        let mut index = 0usize;
        let mut stride = 1usize;
        for (bin, &n_bins) in bins.into_iter().zip(self.bin_counts.iter()) {
            debug_assert!(bin < n_bins);
            index += bin * stride;
            stride *= n_bins;
        }
        index
    }

    pub(crate) fn enter_apply_log(&self) -> &LogBudget {
        &self.enter_apply_log
    }

    pub(crate) fn exit_apply_log(&self) -> &LogBudget {
        &self.exit_apply_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> Vec<Feature> {
        vec![Feature::new(4), Feature::new(3), Feature::new(1)]
    }

    #[test]
    fn term_resolves_bin_counts_in_order() {
        let term = Term::new(&features(), &[1, 0], 10).unwrap();
        assert_eq!(term.n_dimensions(), 2);
        assert_eq!(term.bin_counts(), &[3, 4]);
        assert_eq!(term.n_cells(), 12);
        assert_eq!(term.tensor_len(3).unwrap(), 36);
    }

    #[test]
    fn intercept_has_one_cell() {
        let term = Term::new(&features(), &[], 10).unwrap();
        assert_eq!(term.n_dimensions(), 0);
        assert_eq!(term.n_cells(), 1);
        assert_eq!(term.cell_index(std::iter::empty()), 0);
    }

    #[test]
    fn cell_index_is_dimension_zero_fastest() {
        let term = Term::new(&features(), &[0, 1], 10).unwrap();
        assert_eq!(term.cell_index([0, 0]), 0);
        assert_eq!(term.cell_index([1, 0]), 1);
        assert_eq!(term.cell_index([0, 1]), 4);
        assert_eq!(term.cell_index([3, 2]), 11);
    }

    #[test]
    fn rejects_unknown_feature() {
        let err = Term::new(&features(), &[5], 10).unwrap_err();
        assert!(matches!(err, BoostError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_binless_feature() {
        let err = Term::new(&[Feature::new(0)], &[0], 10).unwrap_err();
        assert!(matches!(err, BoostError::InvalidParameter(_)));
    }
}
