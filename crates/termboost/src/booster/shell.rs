//! Per-session boosting state and the model update operations.
//!
//! A [`BoosterShell`] owns a [`BoosterCore`] plus the scratch state of one
//! boosting round: which term has a pending update, the pending update tensor,
//! and the histogram total accumulator. A session is not reentrant; every
//! operation takes `&mut self`.
//!
//! # Round protocol
//!
//! ```text
//! stage_term_update / set_term_update_expanded   -> term becomes pending
//! term_update_splits / term_update_expanded      -> inspect pending update
//! apply_term_update                              -> fold into model, clear pending
//! ```

use super::core::BoosterCore;
use crate::error::{BoostError, Result};
use crate::histogram::{
    sum_histogram_buckets, sum_histogram_buckets_verified, BucketShape, BucketTotals,
    HistogramBuckets, StatEntry,
};
use crate::log_counted;
use crate::model::Tensor;

/// A boosting session.
#[derive(Debug)]
pub struct BoosterShell {
    core: BoosterCore,
    pending_term: Option<usize>,
    update: Tensor,
    sum_stats: Vec<StatEntry>,
}

impl BoosterShell {
    pub fn new(core: BoosterCore) -> Result<Self> {
        let vector_len = core.vector_len();
        let update = Tensor::zeros_compressed(&[], vector_len)?;
        Ok(Self {
            core,
            pending_term: None,
            update,
            sum_stats: vec![StatEntry::default(); vector_len],
        })
    }

    #[inline]
    pub fn core(&self) -> &BoosterCore {
        &self.core
    }

    /// Term whose update awaits [`apply_term_update`](Self::apply_term_update).
    #[inline]
    pub fn pending_term(&self) -> Option<usize> {
        self.pending_term
    }

    /// The pending update tensor, in whatever form it currently has.
    #[inline]
    pub fn pending_update(&self) -> &Tensor {
        &self.update
    }

    /// Drop the pending marker. The next apply fails with `InvalidState`
    /// until another update is staged or set.
    #[inline]
    pub fn clear_pending(&mut self) {
        self.pending_term = None;
    }

    fn require_pending(&self) -> Result<usize> {
        self.pending_term
            .ok_or(BoostError::InvalidState("no pending term update"))
    }

    fn check_term(&self, term: usize) -> Result<()> {
        if term >= self.core.n_terms() {
            return Err(BoostError::invalid_param(format!(
                "term index {} out of range ({} terms)",
                term,
                self.core.n_terms()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Hand over a compressed update produced by split search for `term`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `term` is out of range or the tensor's shape does
    /// not match the term. The pending marker is cleared on error.
    pub fn stage_term_update(&mut self, term: usize, update: Tensor) -> Result<()> {
        self.pending_term = None;
        self.check_term(term)?;
        if self.core.target().is_degenerate() {
            self.pending_term = Some(term);
            return Ok(());
        }

        let expected = self.core.term(term).bin_counts();
        if update.bin_counts() != expected || update.vector_len() != self.core.vector_len() {
            return Err(BoostError::invalid_param(format!(
                "update shape {:?}x{} does not match term {} shape {:?}x{}",
                update.bin_counts(),
                update.vector_len(),
                term,
                expected,
                self.core.vector_len()
            )));
        }

        self.update = update;
        self.pending_term = Some(term);
        Ok(())
    }

    // =========================================================================
    // Apply
    // =========================================================================

    /// Fold the pending update into the current model.
    ///
    /// Returns the validation metric after the update: finite, non-negative,
    /// and 0 when there is no validation subset or the target is degenerate.
    /// When the metric is strictly below the best seen, the whole current
    /// model is copied into the best model.
    ///
    /// The pending marker is cleared whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no term is pending
    /// - `AllocationFailure` if expansion or best-model promotion fails
    pub fn apply_term_update(&mut self) -> Result<f64> {
        let term = self.require_pending()?;
        let result = self.apply_pending(term);
        self.pending_term = None;
        result
    }

    fn apply_pending(&mut self, term: usize) -> Result<f64> {
        log_counted!(self.core.term(term).enter_apply_log(), term, "entered apply_term_update");

        if self.core.target().is_degenerate() {
            log_counted!(
                self.core.term(term).exit_apply_log(),
                term,
                "exited apply_term_update: target has at most one class"
            );
            return Ok(0.0);
        }

        self.update.expand()?;
        let metric = self.core.apply_expanded_update(term, self.update.values())?;

        debug_assert!(metric.is_finite() && metric >= 0.0);
        if !self.core.validation().is_empty() && metric < self.core.best_metric() {
            self.core.promote_current_to_best(metric)?;
            tracing::debug!(term, metric, "promoted current model to best");
        }

        log_counted!(
            self.core.term(term).exit_apply_log(),
            term,
            metric,
            "exited apply_term_update"
        );
        Ok(metric)
    }

    // =========================================================================
    // Pending update accessors
    // =========================================================================

    /// Split positions of the pending update along `dimension`.
    ///
    /// `expected_splits` must equal `n_bins - 1` for that dimension; a stale
    /// caller buffer size is reported rather than truncated.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no term is pending
    /// - `InvalidParameter` if `dimension` is out of range or
    ///   `expected_splits` mismatches
    pub fn term_update_splits(&self, dimension: usize, expected_splits: usize) -> Result<&[usize]> {
        let term = self.core.term(self.require_pending()?);
        let n_bins = *term.bin_counts().get(dimension).ok_or_else(|| {
            BoostError::invalid_param(format!(
                "dimension {} out of range ({} dimensions)",
                dimension,
                term.n_dimensions()
            ))
        })?;
        if expected_splits != n_bins - 1 {
            return Err(BoostError::invalid_param(format!(
                "split buffer sized for {}, dimension has {} bins",
                expected_splits, n_bins
            )));
        }
        if self.core.target().is_degenerate() {
            return Ok(&[]);
        }

        let splits = self.update.splits(dimension);
        debug_assert!(splits.len() < n_bins);
        Ok(splits)
    }

    /// Expand the pending update and return its full value array,
    /// `vector_len × Π(n_bins_d)` long (empty for degenerate targets).
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no term is pending
    /// - `AllocationFailure` if expansion fails; the pending marker is cleared
    pub fn term_update_expanded(&mut self) -> Result<&[f64]> {
        self.require_pending()?;
        if self.core.target().is_degenerate() {
            return Ok(&[]);
        }
        if let Err(err) = self.update.expand() {
            self.pending_term = None;
            return Err(err);
        }
        Ok(self.update.values())
    }

    /// Make `term` pending with the given expanded update values.
    ///
    /// When [`BoosterConfig::zero_first_multiclass_logit`] is set and there are
    /// at least two scores per cell, class 0's value at each cell is
    /// subtracted from every class at that cell.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an out-of-range term or a `values` slice of the
    /// wrong length, `AllocationFailure` if expansion fails. The pending
    /// marker is cleared on error.
    ///
    /// [`BoosterConfig::zero_first_multiclass_logit`]: crate::BoosterConfig::zero_first_multiclass_logit
    pub fn set_term_update_expanded(&mut self, term: usize, values: &[f64]) -> Result<()> {
        self.pending_term = None;
        self.check_term(term)?;
        if self.core.target().is_degenerate() {
            self.pending_term = Some(term);
            return Ok(());
        }

        let vector_len = self.core.vector_len();
        let expected = self.core.term(term).tensor_len(vector_len)?;
        if values.len() != expected {
            return Err(BoostError::invalid_param(format!(
                "expected {} update values, got {}",
                expected,
                values.len()
            )));
        }

        self.update.reset(self.core.term(term).bin_counts(), vector_len)?;
        self.update.expand()?;
        let target = self.update.values_mut();
        target.copy_from_slice(values);

        if self.core.config().zero_first_multiclass_logit && vector_len >= 2 {
            zero_first_logit(target, vector_len);
        }

        self.pending_term = Some(term);
        Ok(())
    }

    // =========================================================================
    // Histogram totals
    // =========================================================================

    fn prepare_sums(&mut self, buckets: &HistogramBuckets) -> Result<()> {
        let expected = BucketShape::for_target(self.core.target());
        if expected != Some(buckets.shape()) {
            return Err(BoostError::invalid_param(format!(
                "bucket shape {:?} does not match target {:?}",
                buckets.shape(),
                self.core.target()
            )));
        }
        self.sum_stats.clear();
        self.sum_stats
            .resize(buckets.shape().vector_len(), StatEntry::default());
        Ok(())
    }

    /// Per-output totals over a term's buckets, in the session accumulator.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the bucket shape does not match the target.
    pub fn sum_histogram_buckets(&mut self, buckets: &HistogramBuckets) -> Result<&[StatEntry]> {
        self.prepare_sums(buckets)?;
        sum_histogram_buckets(buckets, &mut self.sum_stats)?;
        Ok(&self.sum_stats)
    }

    /// [`sum_histogram_buckets`](Self::sum_histogram_buckets) with a debug-build
    /// cross-check of sample and weight totals.
    pub fn sum_histogram_buckets_verified(
        &mut self,
        buckets: &HistogramBuckets,
        expected: BucketTotals,
    ) -> Result<&[StatEntry]> {
        self.prepare_sums(buckets)?;
        sum_histogram_buckets_verified(buckets, &mut self.sum_stats, expected)?;
        Ok(&self.sum_stats)
    }
}

/// Shift every cell's score vector so that class 0 is zero.
fn zero_first_logit(values: &mut [f64], vector_len: usize) {
    for cell in values.chunks_exact_mut(vector_len) {
        let shift = cell[0];
        for value in cell.iter_mut() {
            *value -= shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_first_logit_recenters_each_cell() {
        let mut values = vec![1.0, 3.0, -1.0, 2.0, 2.0, 5.0];
        zero_first_logit(&mut values, 3);
        assert_eq!(values, vec![0.0, 2.0, -2.0, 0.0, 0.0, 3.0]);
    }
}
