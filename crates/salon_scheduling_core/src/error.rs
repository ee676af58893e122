//! crates/salon_scheduling_core/src/error.rs
//!
//! The error taxonomy of the scheduling core.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// A salon, service or appointment the caller referenced does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller supplied values the engine cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The candidate window overlaps an existing booking.
    #[error("This time slot is not available")]
    SlotConflict,

    /// A collaborator query failed. Propagated as-is, never retried here.
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl From<PortError> for SchedulingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => SchedulingError::NotFound(what),
            // A storage-level exclusion violation is the authoritative conflict signal.
            PortError::Conflict(_) => SchedulingError::SlotConflict,
            PortError::Unexpected(msg) => SchedulingError::Upstream(msg),
        }
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
