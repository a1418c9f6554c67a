//! Validation metrics.
//!
//! All metrics here are losses: lower is better and the true value is never
//! negative. Scores may hold NaN or infinities after an overflowing update, so
//! every value handed to a caller passes through [`sanitize_metric`] first.

use ndarray::ArrayView2;

use crate::model::Target;

/// Loss used to score the validation subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMetric {
    /// Mean squared error (regression).
    MeanSquaredError,
    /// Binary cross-entropy on a single logit.
    LogLoss,
    /// Softmax cross-entropy on one logit per class.
    MulticlassLogLoss,
}

impl ValidationMetric {
    pub fn for_target(target: Target) -> Self {
        match target {
            Target::Regression => ValidationMetric::MeanSquaredError,
            Target::Classification { n_classes } if n_classes <= 2 => ValidationMetric::LogLoss,
            Target::Classification { .. } => ValidationMetric::MulticlassLogLoss,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValidationMetric::MeanSquaredError => "mse",
            ValidationMetric::LogLoss => "logloss",
            ValidationMetric::MulticlassLogLoss => "mlogloss",
        }
    }

    /// Weighted mean loss over all samples. Not sanitized.
    ///
    /// `scores` is `[n_samples, vector_len]`; classification targets are class
    /// indices. An empty `weights` slice means uniform weights.
    pub fn compute(self, scores: ArrayView2<'_, f64>, targets: &[f64], weights: &[f64]) -> f64 {
        let n_samples = scores.nrows();
        if n_samples == 0 {
            return 0.0;
        }

        let mut sum_loss = 0.0f64;
        let mut sum_weight = 0.0f64;
        for (i, (row, &y)) in scores.rows().into_iter().zip(targets).enumerate() {
            let w = if weights.is_empty() { 1.0 } else { weights[i] };
            let loss = match self {
                ValidationMetric::MeanSquaredError => {
                    let diff = row[0] - y;
                    diff * diff
                }
                ValidationMetric::LogLoss => {
                    // softplus(z) - y * z
                    let z = row[0];
                    z.max(0.0) + (-z.abs()).exp().ln_1p() - y * z
                }
                ValidationMetric::MulticlassLogLoss => {
                    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let sum_exp: f64 = row.iter().map(|&z| (z - max).exp()).sum();
                    max + sum_exp.ln() - row[y as usize]
                }
            };
            sum_loss += w * loss;
            sum_weight += w;
        }

        if sum_weight > 0.0 {
            sum_loss / sum_weight
        } else {
            0.0
        }
    }
}

/// Clamp a metric into `[0, f64::MAX]`.
///
/// NaN and +inf become `f64::MAX`, so they never compare as an improvement.
/// Anything below zero becomes zero, without a tolerance band.
#[inline]
pub fn sanitize_metric(metric: f64) -> f64 {
    if metric.is_nan() || metric > f64::MAX {
        f64::MAX
    } else if metric < 0.0 {
        0.0
    } else {
        metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn sanitize_maps_into_legal_range() {
        assert_eq!(sanitize_metric(f64::NAN), f64::MAX);
        assert_eq!(sanitize_metric(f64::INFINITY), f64::MAX);
        assert_eq!(sanitize_metric(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize_metric(-1e-17), 0.0);
        assert_eq!(sanitize_metric(0.25), 0.25);
    }

    #[test]
    fn mse_weighted() {
        let scores = array![[1.0], [3.0]];
        let metric = ValidationMetric::MeanSquaredError;
        assert_abs_diff_eq!(metric.compute(scores.view(), &[0.0, 1.0], &[]), 2.5);
        assert_abs_diff_eq!(metric.compute(scores.view(), &[0.0, 1.0], &[3.0, 1.0]), 1.75);
    }

    #[test]
    fn logloss_at_zero_logit_is_ln2() {
        let scores = array![[0.0], [0.0]];
        let value = ValidationMetric::LogLoss.compute(scores.view(), &[0.0, 1.0], &[]);
        assert_abs_diff_eq!(value, std::f64::consts::LN_2, epsilon = 1e-12);
    }

    #[test]
    fn logloss_is_stable_for_large_logits() {
        let scores = array![[800.0], [-800.0]];
        let value = ValidationMetric::LogLoss.compute(scores.view(), &[1.0, 0.0], &[]);
        assert!(value.is_finite());
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn multiclass_logloss_uniform_is_ln_k() {
        let scores = array![[0.0, 0.0, 0.0]];
        let value = ValidationMetric::MulticlassLogLoss.compute(scores.view(), &[2.0], &[]);
        assert_abs_diff_eq!(value, 3.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn metric_by_target() {
        assert_eq!(ValidationMetric::for_target(Target::Regression).name(), "mse");
        assert_eq!(ValidationMetric::for_target(Target::classification(2)).name(), "logloss");
        assert_eq!(ValidationMetric::for_target(Target::classification(4)).name(), "mlogloss");
    }
}
