//! Learning target and output width.

use serde::{Deserialize, Serialize};

/// What the session is learning.
///
/// Determines the number of scores stored per tensor cell (`vector_len`) and
/// which validation metric applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Regression,
    Classification { n_classes: usize },
}

impl Target {
    pub fn classification(n_classes: usize) -> Self {
        Target::Classification { n_classes }
    }

    #[inline]
    pub fn is_classification(self) -> bool {
        matches!(self, Target::Classification { .. })
    }

    /// A classification target with 0 or 1 classes.
    ///
    /// Such targets are predicted perfectly by an empty model, so every
    /// tensor-shaped operation is a successful no-op.
    #[inline]
    pub fn is_degenerate(self) -> bool {
        matches!(self, Target::Classification { n_classes } if n_classes <= 1)
    }

    /// Scores per tensor cell.
    ///
    /// - Regression: 1
    /// - Binary classification: 1 (a single logit)
    /// - K-class classification (K > 2): K
    /// - Degenerate classification: 0
    #[inline]
    pub fn vector_len(self) -> usize {
        match self {
            Target::Regression => 1,
            Target::Classification { n_classes } if n_classes <= 1 => 0,
            Target::Classification { n_classes: 2 } => 1,
            Target::Classification { n_classes } => n_classes,
        }
    }
}
