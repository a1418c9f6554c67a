//! Session configuration with builder pattern.
//!
//! # Example
//!
//! ```
//! use termboost::BoosterConfig;
//!
//! // All defaults
//! let config = BoosterConfig::builder().build().unwrap();
//! assert!(!config.zero_first_multiclass_logit);
//!
//! // Re-center multiclass logits on class 0
//! let config = BoosterConfig::builder()
//!     .zero_first_multiclass_logit(true)
//!     .log_budget(3)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.log_budget, 3);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_LOG_BUDGET;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("log_budget must be non-negative, got {0}")]
    InvalidLogBudget(i32),
}

// =============================================================================
// BoosterConfig
// =============================================================================

/// Configuration for a boosting session.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct BoosterConfig {
    /// Subtract class 0's value from every class at each bin when a
    /// multiclass update is written with `set_term_update_expanded`.
    /// Default: `false`.
    #[builder(default)]
    pub zero_first_multiclass_logit: bool,

    /// Number of `info`-level enter/exit messages each term emits before
    /// dropping to `trace`. Default: 10.
    #[builder(default = DEFAULT_LOG_BUDGET)]
    pub log_budget: i32,
}

impl<S: booster_config_builder::IsComplete> BoosterConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `log_budget` is negative.
    pub fn build(self) -> Result<BoosterConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl BoosterConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_budget < 0 {
            return Err(ConfigError::InvalidLogBudget(self.log_budget));
        }
        Ok(())
    }
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            zero_first_multiclass_logit: false,
            log_budget: DEFAULT_LOG_BUDGET,
        }
    }
}
