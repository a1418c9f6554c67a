//! Session-wide model state.

use super::samples::SampleSet;
use crate::config::BoosterConfig;
use crate::error::{BoostError, Result};
use crate::model::{Feature, Target, Tensor, Term};

/// Terms, the current and best models, and the data subsets of a session.
///
/// Both models hold one tensor per term for the whole session. A term's
/// tensor stays a single compressed zero region until the term first receives
/// an update, and is expanded from then on. The best model is the snapshot of
/// the current model at the round with the lowest validation metric seen so
/// far.
#[derive(Debug)]
pub struct BoosterCore {
    target: Target,
    features: Vec<Feature>,
    terms: Vec<Term>,
    current_model: Vec<Tensor>,
    best_model: Vec<Tensor>,
    best_metric: f64,
    training: SampleSet,
    validation: SampleSet,
    config: BoosterConfig,
}

impl BoosterCore {
    /// Create a session core with zero-initialized models.
    ///
    /// # Arguments
    /// * `term_features` - For each term, the feature index of each dimension
    /// * `training`, `validation` - Subsets binned over `features` (may be empty)
    pub fn new(
        target: Target,
        features: Vec<Feature>,
        term_features: &[Vec<usize>],
        training: SampleSet,
        validation: SampleSet,
        config: BoosterConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|err| BoostError::invalid_param(err.to_string()))?;

        for (name, set) in [("training", &training), ("validation", &validation)] {
            if set.target() != target {
                return Err(BoostError::invalid_param(format!("{} target mismatch", name)));
            }
            if !set.is_empty() && set.n_features() != features.len() {
                return Err(BoostError::invalid_param(format!(
                    "{} set has {} features, expected {}",
                    name,
                    set.n_features(),
                    features.len()
                )));
            }
        }

        let terms = term_features
            .iter()
            .map(|dims| Term::new(&features, dims, config.log_budget))
            .collect::<Result<Vec<_>>>()?;

        let vector_len = target.vector_len();
        let current_model = terms
            .iter()
            .map(|term| Tensor::zeros_compressed(term.bin_counts(), vector_len))
            .collect::<Result<Vec<_>>>()?;
        let best_model = current_model
            .iter()
            .map(Tensor::try_clone)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            ?target,
            n_features = features.len(),
            n_terms = terms.len(),
            n_training = training.n_samples(),
            n_validation = validation.n_samples(),
            "created booster core"
        );

        Ok(Self {
            target,
            features,
            terms,
            current_model,
            best_model,
            best_metric: f64::MAX,
            training,
            validation,
            config,
        })
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    #[inline]
    pub fn vector_len(&self) -> usize {
        self.target.vector_len()
    }

    #[inline]
    pub fn config(&self) -> &BoosterConfig {
        &self.config
    }

    #[inline]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[inline]
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn term(&self, index: usize) -> &Term {
        &self.terms[index]
    }

    #[inline]
    pub fn current_model(&self, term: usize) -> &Tensor {
        &self.current_model[term]
    }

    #[inline]
    pub fn best_model(&self, term: usize) -> &Tensor {
        &self.best_model[term]
    }

    /// Lowest validation metric seen so far (`f64::MAX` before any).
    #[inline]
    pub fn best_metric(&self) -> f64 {
        self.best_metric
    }

    #[inline]
    pub fn training(&self) -> &SampleSet {
        &self.training
    }

    #[inline]
    pub fn validation(&self) -> &SampleSet {
        &self.validation
    }

    /// Fold an expanded update for `term` into the current model and both
    /// score caches. Returns the sanitized validation metric (0 without a
    /// validation subset).
    ///
    /// Fails only if the term's model tensor cannot be expanded, in which case
    /// nothing has changed.
    pub(crate) fn apply_expanded_update(&mut self, term: usize, update: &[f64]) -> Result<f64> {
        let model = &mut self.current_model[term];
        model.expand()?;
        model.add_expanded(update);

        let term_ref = &self.terms[term];
        if !self.training.is_empty() {
            self.training.apply_update(term_ref, update);
        }
        if self.validation.is_empty() {
            return Ok(0.0);
        }
        self.validation.apply_update(term_ref, update);
        Ok(self.validation.metric())
    }

    /// Replace the best model with a copy of the current model.
    ///
    /// Every term is copied into fresh buffers before any is swapped in, so
    /// on failure the best model and best metric are untouched.
    pub(crate) fn promote_current_to_best(&mut self, metric: f64) -> Result<()> {
        let snapshot = self
            .current_model
            .iter()
            .map(Tensor::try_clone)
            .collect::<Result<Vec<_>>>()?;
        self.best_model = snapshot;
        self.best_metric = metric;
        Ok(())
    }
}
