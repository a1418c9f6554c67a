//! Binned sample subsets with cached per-sample scores.

use ndarray::{Array2, ArrayView2};

use super::metric::{sanitize_metric, ValidationMetric};
use crate::error::{BoostError, Result};
use crate::model::{Feature, Target, Term};

/// A training or validation subset.
///
/// Holds each sample's bin per feature, its target, an optional weight, and
/// the running score the current model assigns it.
#[derive(Debug, Clone)]
pub struct SampleSet {
    target: Target,
    bins: Vec<Vec<u32>>,
    targets: Vec<f64>,
    weights: Vec<f64>,
    scores: Array2<f64>,
}

impl SampleSet {
    /// A subset with no samples.
    pub fn empty(target: Target) -> Self {
        Self {
            target,
            bins: Vec::new(),
            targets: Vec::new(),
            weights: Vec::new(),
            scores: Array2::zeros((0, target.vector_len())),
        }
    }

    /// Create a subset from per-feature bin columns.
    ///
    /// # Arguments
    /// * `features` - Feature metadata, one entry per bin column
    /// * `bins` - `bins[f][i]` is the bin of sample `i` in feature `f`
    /// * `targets` - Regression values, or class indices for classification
    /// * `weights` - Per-sample weights (`None` = uniform)
    pub fn new(
        target: Target,
        features: &[Feature],
        bins: Vec<Vec<u32>>,
        targets: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self> {
        let n_samples = targets.len();

        if bins.len() != features.len() {
            return Err(BoostError::invalid_param(format!(
                "expected {} bin columns, got {}",
                features.len(),
                bins.len()
            )));
        }
        for (f, (column, feature)) in bins.iter().zip(features).enumerate() {
            if column.len() != n_samples {
                return Err(BoostError::invalid_param(format!(
                    "feature {}: expected {} rows, got {}",
                    f,
                    n_samples,
                    column.len()
                )));
            }
            if let Some(&bin) = column.iter().find(|&&b| b as usize >= feature.n_bins) {
                return Err(BoostError::invalid_param(format!(
                    "feature {}: bin {} out of range ({} bins)",
                    f, bin, feature.n_bins
                )));
            }
        }

        if let Target::Classification { n_classes } = target {
            if let Some(&y) = targets
                .iter()
                .find(|&&y| y < 0.0 || y.fract() != 0.0 || y as usize >= n_classes.max(1))
            {
                return Err(BoostError::invalid_param(format!(
                    "class label {} not in 0..{}",
                    y, n_classes
                )));
            }
        }

        let weights = weights.unwrap_or_default();
        if !weights.is_empty() && weights.len() != n_samples {
            return Err(BoostError::invalid_param(format!(
                "expected {} weights, got {}",
                n_samples,
                weights.len()
            )));
        }

        Ok(Self {
            target,
            bins,
            targets,
            weights,
            scores: Array2::zeros((n_samples, target.vector_len())),
        })
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Number of bin columns (0 for an empty subset).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.bins.len()
    }

    /// Cached scores, `[n_samples, vector_len]`.
    #[inline]
    pub fn scores(&self) -> ArrayView2<'_, f64> {
        self.scores.view()
    }

    /// Add the update cell each sample falls in to that sample's scores.
    ///
    /// `update` is an expanded tensor over `term`.
    pub fn apply_update(&mut self, term: &Term, update: &[f64]) {
        let vector_len = self.scores.ncols();
        debug_assert_eq!(update.len(), term.n_cells() * vector_len);

        for (i, mut row) in self.scores.rows_mut().into_iter().enumerate() {
            let cell = term.cell_index(term.features().iter().map(|&f| self.bins[f][i] as usize));
            let delta = &update[cell * vector_len..(cell + 1) * vector_len];
            for (score, &d) in row.iter_mut().zip(delta) {
                *score += d;
            }
        }
    }

    /// Validation loss of the cached scores, clamped into `[0, f64::MAX]`.
    pub fn metric(&self) -> f64 {
        let metric = ValidationMetric::for_target(self.target);
        sanitize_metric(metric.compute(self.scores.view(), &self.targets, &self.weights))
    }
}
