//! Handle-based boundary operations.
//!
//! A training driver holds sessions through opaque [`BoosterHandle`]s issued
//! by a [`Boosters`] registry. The four round operations below resolve the
//! handle, validate raw caller inputs (signed indices, caller-owned buffers),
//! and report the outcome as an [`ErrorCode`]. No [`BoostError`] crosses this
//! layer.
//!
//! Handles carry a generation counter, so a handle to a freed session stays
//! invalid even after its slot is reused.

use crate::booster::BoosterShell;
use crate::error::{BoostError, ErrorCode, Result};
use crate::logging::{LogBudget, DEFAULT_LOG_BUDGET};
use crate::log_counted;

static APPLY_PARAMS_LOG: LogBudget = LogBudget::new(DEFAULT_LOG_BUDGET);
static SPLITS_PARAMS_LOG: LogBudget = LogBudget::new(DEFAULT_LOG_BUDGET);
static GET_EXPANDED_PARAMS_LOG: LogBudget = LogBudget::new(DEFAULT_LOG_BUDGET);
static SET_EXPANDED_PARAMS_LOG: LogBudget = LogBudget::new(DEFAULT_LOG_BUDGET);

// =============================================================================
// Handles
// =============================================================================

/// Opaque reference to a session in a [`Boosters`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoosterHandle {
    index: u32,
    generation: u32,
}

impl BoosterHandle {
    /// A handle that never resolves.
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for BoosterHandle {
    fn default() -> Self {
        Self::null()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    shell: Option<BoosterShell>,
}

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct Boosters {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
}

impl Boosters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a session and return its handle.
    pub fn create(&mut self, shell: BoosterShell) -> BoosterHandle {
        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.shell = Some(shell);
            return BoosterHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        debug_assert!(index != u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            shell: Some(shell),
        });
        BoosterHandle {
            index,
            generation: 0,
        }
    }

    /// Remove a session. Its handle, and every copy of it, becomes invalid.
    pub fn free(&mut self, handle: BoosterHandle) -> Result<BoosterShell> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(BoostError::InvalidHandle)?;
        let shell = slot.shell.take().ok_or(BoostError::InvalidHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(handle.index);
        Ok(shell)
    }

    pub fn get(&self, handle: BoosterHandle) -> Result<&BoosterShell> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.shell.as_ref())
            .ok_or(BoostError::InvalidHandle)
    }

    pub fn get_mut(&mut self, handle: BoosterHandle) -> Result<&mut BoosterShell> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.shell.as_mut())
            .ok_or(BoostError::InvalidHandle)
    }
}

fn non_negative(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| BoostError::invalid_param(format!("{} must be non-negative, got {}", what, value)))
}

fn report(op: &'static str, result: Result<()>) -> ErrorCode {
    if let Err(err) = &result {
        tracing::warn!(op, error = %err, "boundary operation failed");
    }
    ErrorCode::from(result)
}

// =============================================================================
// Round operations
// =============================================================================

/// Apply the pending update of a session.
///
/// `metric_out`, when given, receives the validation metric, or 0 on any
/// failure.
pub fn apply_term_update(
    boosters: &mut Boosters,
    handle: BoosterHandle,
    metric_out: Option<&mut f64>,
) -> ErrorCode {
    log_counted!(APPLY_PARAMS_LOG, ?handle, has_metric_out = metric_out.is_some(), "apply_term_update");

    let result = boosters
        .get_mut(handle)
        .and_then(BoosterShell::apply_term_update);
    let metric = *result.as_ref().unwrap_or(&0.0);
    if let Some(out) = metric_out {
        *out = metric;
    }
    report("apply_term_update", result.map(|_| ()))
}

/// Copy the split positions of the pending update along `dimension`.
///
/// On entry `count` holds the caller's expected split count, which must be
/// `n_bins - 1` for the dimension. On success it holds the actual number of
/// splits written to `splits_out`; on failure it is 0 and `splits_out` is
/// untouched. `splits_out` may be `None` only when there are no splits.
pub fn get_term_update_splits(
    boosters: &Boosters,
    handle: BoosterHandle,
    dimension: i64,
    count: &mut i64,
    splits_out: Option<&mut [i64]>,
) -> ErrorCode {
    log_counted!(SPLITS_PARAMS_LOG, ?handle, dimension, count = *count, "get_term_update_splits");

    let expected = *count;
    *count = 0;
    let result = (|| -> Result<i64> {
        let shell = boosters.get(handle)?;
        let dimension = non_negative(dimension, "dimension")?;
        let expected = non_negative(expected, "split count")?;
        let splits = shell.term_update_splits(dimension, expected)?;
        if splits.is_empty() {
            return Ok(0);
        }

        let out = splits_out
            .ok_or_else(|| BoostError::invalid_param("split buffer is required when splits exist"))?;
        if out.len() < splits.len() {
            return Err(BoostError::invalid_param(format!(
                "split buffer holds {}, need {}",
                out.len(),
                splits.len()
            )));
        }
        for (slot, &split) in out.iter_mut().zip(splits) {
            *slot = split as i64;
        }
        Ok(splits.len() as i64)
    })();

    match result {
        Ok(n) => {
            *count = n;
            ErrorCode::Ok
        }
        Err(err) => report("get_term_update_splits", Err(err)),
    }
}

/// Expand the pending update and copy it into `values_out`, which must be
/// exactly `vector_len × Π(n_bins_d)` long.
pub fn get_term_update_expanded(
    boosters: &mut Boosters,
    handle: BoosterHandle,
    values_out: &mut [f64],
) -> ErrorCode {
    log_counted!(GET_EXPANDED_PARAMS_LOG, ?handle, len = values_out.len(), "get_term_update_expanded");

    let result = boosters.get_mut(handle).and_then(|shell| {
        let degenerate = shell.core().target().is_degenerate();
        let values = shell.term_update_expanded()?;
        if degenerate {
            return Ok(());
        }
        if values.len() != values_out.len() {
            return Err(BoostError::invalid_param(format!(
                "output buffer holds {}, tensor has {} values",
                values_out.len(),
                values.len()
            )));
        }
        values_out.copy_from_slice(values);
        Ok(())
    });
    report("get_term_update_expanded", result)
}

/// Make `term` pending with caller-supplied expanded values.
///
/// Any failure after the handle resolves, including a negative `term`, leaves
/// the session with no pending term.
pub fn set_term_update_expanded(
    boosters: &mut Boosters,
    handle: BoosterHandle,
    term: i64,
    values: &[f64],
) -> ErrorCode {
    log_counted!(SET_EXPANDED_PARAMS_LOG, ?handle, term, len = values.len(), "set_term_update_expanded");

    let result = boosters.get_mut(handle).and_then(|shell| {
        let term = match non_negative(term, "term index") {
            Ok(term) => term,
            Err(err) => {
                shell.clear_pending();
                return Err(err);
            }
        };
        shell.set_term_update_expanded(term, values)
    });
    report("set_term_update_expanded", result)
}
