//! Error taxonomy and boundary status codes.
//!
//! Internal operations return [`BoostError`] through `Result`. The handle
//! layer in [`crate::api`] converts errors into [`ErrorCode`] values so that
//! nothing but a status code crosses the boundary.

use std::collections::TryReserveError;

/// Errors produced by the model update and histogram paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoostError {
    /// The session handle is null, freed, or was never issued.
    #[error("invalid booster handle")]
    InvalidHandle,

    /// Operation invoked out of order (e.g. no pending term).
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Out-of-range index, size mismatch, or missing required buffer.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A tensor buffer could not be obtained.
    #[error("allocation of {requested} values failed")]
    AllocationFailure { requested: usize },
}

impl BoostError {
    pub(crate) fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub(crate) fn alloc(requested: usize) -> impl FnOnce(TryReserveError) -> Self {
        move |_| Self::AllocationFailure { requested }
    }
}

pub type Result<T, E = BoostError> = std::result::Result<T, E>;

// =============================================================================
// ErrorCode
// =============================================================================

/// Status code returned by the boundary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    OutOfMemory = -1,
    IllegalParamValue = -3,
    InvalidHandle = -4,
    InvalidState = -5,
}

impl ErrorCode {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }

    /// Raw integer value of the status.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&BoostError> for ErrorCode {
    fn from(err: &BoostError) -> Self {
        match err {
            BoostError::InvalidHandle => ErrorCode::InvalidHandle,
            BoostError::InvalidState(_) => ErrorCode::InvalidState,
            BoostError::InvalidParameter(_) => ErrorCode::IllegalParamValue,
            BoostError::AllocationFailure { .. } => ErrorCode::OutOfMemory,
        }
    }
}

impl<T> From<Result<T>> for ErrorCode {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => ErrorCode::Ok,
            Err(err) => ErrorCode::from(&err),
        }
    }
}
