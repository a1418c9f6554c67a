//! termboost: model update core for cyclic additive-term boosting.
//!
//! Each term (a group of binned features) owns a tensor of scores over every
//! bin combination. A boosting round proposes an update tensor for one term,
//! folds it into the current model, scores the validation subset, and keeps
//! the best model seen so far.
//!
//! # Key Types
//!
//! - [`Tensor`] - compressed or expanded term values
//! - [`HistogramBuckets`] / [`sum_histogram_buckets`] - per-bin statistics and their totals
//! - [`BoosterShell`] - one session: pending update, apply, inspect
//! - [`Boosters`] / [`BoosterHandle`] - handle registry for the boundary operations in [`api`]
//! - [`BoosterConfig`] - session configuration builder
//!
//! # Example
//!
//! ```
//! use termboost::{
//!     BoosterConfig, BoosterCore, BoosterShell, Feature, SampleSet, Target, Tensor,
//! };
//!
//! let target = Target::Regression;
//! let features = vec![Feature::new(4)];
//! let validation = SampleSet::new(
//!     target,
//!     &features,
//!     vec![vec![0, 1, 2, 3]],
//!     vec![1.0, 1.0, 3.0, 3.0],
//!     None,
//! )
//! .unwrap();
//! let core = BoosterCore::new(
//!     target,
//!     features,
//!     &[vec![0]],
//!     SampleSet::empty(target),
//!     validation,
//!     BoosterConfig::default(),
//! )
//! .unwrap();
//! let mut shell = BoosterShell::new(core).unwrap();
//!
//! let update = Tensor::compressed(&[4], 1, vec![vec![2]], vec![1.0, 3.0]).unwrap();
//! shell.stage_term_update(0, update).unwrap();
//! let metric = shell.apply_term_update().unwrap();
//! assert_eq!(metric, 0.0);
//! assert_eq!(shell.core().best_model(0).values(), &[1.0, 1.0, 3.0, 3.0]);
//! ```

pub mod api;
pub mod booster;
pub mod config;
pub mod error;
pub mod histogram;
pub mod logging;
pub mod model;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use api::{BoosterHandle, Boosters};
pub use booster::{BoosterCore, BoosterShell, SampleSet, ValidationMetric};
pub use config::{BoosterConfig, ConfigError};
pub use error::{BoostError, ErrorCode, Result};
pub use histogram::{
    sum_histogram_buckets, sum_histogram_buckets_verified, verify_bucket_totals, BucketShape,
    BucketTotals, HistogramBuckets, StatEntry,
};
pub use logging::LogBudget;
pub use model::{Feature, Target, Tensor, Term};
