//! Error types for control system operations.
//!
//! Nothing inside a tick returns these: the tick pipeline self-heals. They
//! surface from the scheduler and from argument checks at the edges.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The tick scheduler could not be started or stopped cleanly.
    #[error("Scheduler error: {what}")]
    Scheduler { what: String },
}

impl From<lc_core::CoreError> for ControlError {
    fn from(err: lc_core::CoreError) -> Self {
        match err {
            lc_core::CoreError::InvalidArg { what } => Self::InvalidArg { what },
            lc_core::CoreError::NonFinite { what, .. } => Self::InvalidArg { what },
        }
    }
}
