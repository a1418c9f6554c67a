//! Rate-limited diagnostic logging.
//!
//! Boundary operations are called once per boosting round, often thousands of
//! times per session. Their entry/exit messages are emitted at `info` level
//! only for the first few calls and at `trace` level afterwards.
//!
//! The counters are process-wide and updated with relaxed loads and stores
//! (not a read-modify-write). Concurrent sessions may race on them; the only
//! effect is that a few more or fewer `info` messages get emitted. Nothing
//! computed by the crate reads these counters.

use std::sync::atomic::{AtomicI32, Ordering};

/// Default number of `info`-level emissions per budget.
pub const DEFAULT_LOG_BUDGET: i32 = 10;

/// Countdown of remaining `info`-level emissions for one message site.
#[derive(Debug)]
pub struct LogBudget {
    remaining: AtomicI32,
}

impl LogBudget {
    pub const fn new(budget: i32) -> Self {
        Self {
            remaining: AtomicI32::new(budget),
        }
    }

    /// Consume one emission. Returns `true` if the message should be promoted
    /// to `info` level.
    #[inline]
    pub fn take(&self) -> bool {
        let remaining = self.remaining.load(Ordering::Relaxed);
        if remaining <= 0 {
            return false;
        }
        self.remaining.store(remaining - 1, Ordering::Relaxed);
        true
    }

    /// Emissions left before messages drop to `trace`.
    #[inline]
    pub fn remaining(&self) -> i32 {
        self.remaining.load(Ordering::Relaxed)
    }
}

impl Default for LogBudget {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_BUDGET)
    }
}

/// Emit at `info` while `budget` lasts, at `trace` afterwards.
#[macro_export]
macro_rules! log_counted {
    ($budget:expr, $($arg:tt)+) => {
        if $budget.take() {
            ::tracing::info!($($arg)+);
        } else {
            ::tracing::trace!($($arg)+);
        }
    };
}
