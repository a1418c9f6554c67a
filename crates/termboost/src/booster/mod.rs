//! Boosting sessions.
//!
//! - [`BoosterCore`]: terms, current and best models, data subsets
//! - [`BoosterShell`]: one session's pending update and round operations
//! - [`SampleSet`]: binned samples with cached scores
//! - [`ValidationMetric`]: loss used to select the best model

mod core;
mod metric;
mod samples;
mod shell;

pub use self::core::BoosterCore;
pub use metric::{sanitize_metric, ValidationMetric};
pub use samples::SampleSet;
pub use shell::BoosterShell;
