//! Additive term tensors in compressed or expanded form.
//!
//! A [`Tensor`] holds `vector_len` scores for every bin combination of a term.
//!
//! # Representations
//!
//! - **Compressed**: per dimension, a strictly increasing list of split
//!   positions, plus one score vector per region of the resulting grid. A split
//!   at `s` means bins `< s` and bins `>= s` fall in different regions.
//! - **Expanded**: every bin is its own region. Each dimension then carries
//!   the splits `1..n_bins` and `values` has one score vector per cell.
//!
//! # Layout
//!
//! Region (or cell) vectors are flattened with dimension 0 varying fastest;
//! the score vector is innermost:
//!
//! ```text
//! values[class + vector_len * (r0 + n0 * (r1 + n1 * (r2 + ...)))]
//! ```
//!
//! where `r_d` is the region index and `n_d` the region count of dimension `d`.

use ndarray::{ArrayViewD, IxDyn};

use crate::error::{BoostError, Result};

/// Model values (or a pending model update) over one term.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    vector_len: usize,
    bin_counts: Box<[usize]>,
    splits: Vec<Vec<usize>>,
    values: Vec<f64>,
    expanded: bool,
}

/// Allocate a zeroed buffer, reporting failure instead of aborting.
fn try_zeroed(len: usize) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(BoostError::alloc(len))?;
    values.resize(len, 0.0);
    Ok(values)
}

fn full_splits(bin_counts: &[usize]) -> Result<Vec<Vec<usize>>> {
    bin_counts
        .iter()
        .map(|&n_bins| {
            let n_splits = n_bins.saturating_sub(1);
            let mut splits = Vec::new();
            splits
                .try_reserve_exact(n_splits)
                .map_err(BoostError::alloc(n_splits))?;
            splits.extend(1..n_bins);
            Ok(splits)
        })
        .collect()
}

fn checked_len(counts: impl IntoIterator<Item = usize>, vector_len: usize) -> Result<usize> {
    counts
        .into_iter()
        .try_fold(vector_len, |acc, n| acc.checked_mul(n))
        .ok_or_else(|| BoostError::invalid_param("tensor length overflows"))
}

impl Tensor {
    // =========================================================================
    // Construction
    // =========================================================================

    /// An expanded tensor of zeros.
    pub fn zeros_expanded(bin_counts: &[usize], vector_len: usize) -> Result<Self> {
        let len = checked_len(bin_counts.iter().copied(), vector_len)?;
        Ok(Self {
            vector_len,
            bin_counts: bin_counts.into(),
            splits: full_splits(bin_counts)?,
            values: try_zeroed(len)?,
            expanded: true,
        })
    }

    /// A compressed tensor with no splits and a single zero region.
    pub fn zeros_compressed(bin_counts: &[usize], vector_len: usize) -> Result<Self> {
        Ok(Self {
            vector_len,
            bin_counts: bin_counts.into(),
            splits: vec![Vec::new(); bin_counts.len()],
            values: try_zeroed(vector_len)?,
            expanded: false,
        })
    }

    /// A compressed tensor from split positions and region values.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless there is one split list per dimension, every
    /// list is strictly increasing within `1..n_bins`, and `values` holds
    /// `vector_len × Π(splits_d + 1)` entries.
    pub fn compressed(
        bin_counts: &[usize],
        vector_len: usize,
        splits: Vec<Vec<usize>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if splits.len() != bin_counts.len() {
            return Err(BoostError::invalid_param(format!(
                "expected {} split lists, got {}",
                bin_counts.len(),
                splits.len()
            )));
        }
        for (d, (dim_splits, &n_bins)) in splits.iter().zip(bin_counts).enumerate() {
            let mut previous = 0usize;
            for &split in dim_splits {
                if split <= previous || split >= n_bins {
                    return Err(BoostError::invalid_param(format!(
                        "dimension {}: split {} not increasing within 1..{}",
                        d, split, n_bins
                    )));
                }
                previous = split;
            }
        }
        let expected = checked_len(splits.iter().map(|s| s.len() + 1), vector_len)?;
        if values.len() != expected {
            return Err(BoostError::invalid_param(format!(
                "expected {} region values, got {}",
                expected,
                values.len()
            )));
        }

        Ok(Self {
            vector_len,
            bin_counts: bin_counts.into(),
            splits,
            values,
            expanded: false,
        })
    }

    /// Return to a single zero region over a (possibly different) shape.
    pub fn reset(&mut self, bin_counts: &[usize], vector_len: usize) -> Result<()> {
        let values = try_zeroed(vector_len)?;

        self.vector_len = vector_len;
        self.bin_counts = bin_counts.into();
        self.splits.clear();
        self.splits.resize(bin_counts.len(), Vec::new());
        self.values = values;
        self.expanded = false;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn vector_len(&self) -> usize {
        self.vector_len
    }

    #[inline]
    pub fn bin_counts(&self) -> &[usize] {
        &self.bin_counts
    }

    #[inline]
    pub fn n_dimensions(&self) -> usize {
        self.bin_counts.len()
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Split positions along one dimension.
    #[inline]
    pub fn splits(&self, dimension: usize) -> &[usize] {
        &self.splits[dimension]
    }

    #[inline]
    pub fn n_splits(&self, dimension: usize) -> usize {
        self.splits[dimension].len()
    }

    /// Region values (all cell values once expanded).
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Expanded values shaped `[n_bins_{D-1}, ..., n_bins_0, vector_len]`.
    pub fn view(&self) -> Result<ArrayViewD<'_, f64>> {
        if !self.expanded {
            return Err(BoostError::InvalidState("tensor is not expanded"));
        }
        let shape: Vec<usize> = self
            .bin_counts
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(self.vector_len))
            .collect();
        ArrayViewD::from_shape(IxDyn(&shape), &self.values)
            .map_err(|_| BoostError::InvalidState("tensor values do not match its shape"))
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Materialize one score vector per bin combination.
    ///
    /// Every cell receives the value of the compressed region it falls in.
    /// No-op on an expanded tensor. On failure the tensor is unchanged.
    pub fn expand(&mut self) -> Result<()> {
        if self.expanded {
            return Ok(());
        }

        let n_dims = self.bin_counts.len();
        let vector_len = self.vector_len;
        let len = checked_len(self.bin_counts.iter().copied(), vector_len)?;

        let mut expanded = Vec::new();
        expanded
            .try_reserve_exact(len)
            .map_err(BoostError::alloc(len))?;
        let new_splits = full_splits(&self.bin_counts)?;

        let n_cells = if vector_len == 0 { len } else { len / vector_len };
        let mut bins = vec![0usize; n_dims];
        let mut regions = vec![0usize; n_dims];

        for _ in 0..n_cells {
            let mut region = 0usize;
            let mut stride = 1usize;
            for d in 0..n_dims {
                region += regions[d] * stride;
                stride *= self.splits[d].len() + 1;
            }
            let start = region * vector_len;
            expanded.extend_from_slice(&self.values[start..start + vector_len]);

            // odometer over bins, dimension 0 fastest
            for d in 0..n_dims {
                bins[d] += 1;
                if bins[d] < self.bin_counts[d] {
                    let dim_splits = &self.splits[d];
                    if regions[d] < dim_splits.len() && dim_splits[regions[d]] == bins[d] {
                        regions[d] += 1;
                    }
                    break;
                }
                bins[d] = 0;
                regions[d] = 0;
            }
        }
        debug_assert_eq!(expanded.len(), len);

        self.values = expanded;
        self.splits = new_splits;
        self.expanded = true;
        Ok(())
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Add an expanded update elementwise.
    ///
    /// NaN and infinities are not checked for: they propagate into the cells
    /// they land on and nowhere else. Callers see only sanitized metrics.
    pub fn add_expanded(&mut self, update: &[f64]) {
        debug_assert!(self.expanded);
        debug_assert_eq!(self.values.len(), update.len());
        for (value, &delta) in self.values.iter_mut().zip(update) {
            *value += delta;
        }
    }

    /// Multiply every value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for value in self.values.iter_mut() {
            *value *= factor;
        }
    }

    // =========================================================================
    // Copying
    // =========================================================================

    /// Deep copy with fallible allocation.
    pub fn try_clone(&self) -> Result<Self> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(self.values.len())
            .map_err(BoostError::alloc(self.values.len()))?;
        values.extend_from_slice(&self.values);

        let mut splits = Vec::new();
        splits
            .try_reserve_exact(self.splits.len())
            .map_err(BoostError::alloc(self.splits.len()))?;
        for dim_splits in &self.splits {
            let mut copy = Vec::new();
            copy.try_reserve_exact(dim_splits.len())
                .map_err(BoostError::alloc(dim_splits.len()))?;
            copy.extend_from_slice(dim_splits);
            splits.push(copy);
        }

        Ok(Self {
            vector_len: self.vector_len,
            bin_counts: self.bin_counts.clone(),
            splits,
            values,
            expanded: self.expanded,
        })
    }

    /// Overwrite this tensor with a copy of `other`. Unchanged on failure.
    pub fn copy_from(&mut self, other: &Tensor) -> Result<()> {
        *self = other.try_clone()?;
        Ok(())
    }
}
