use std::fmt;

use thiserror::Error;

/// Lifecycle or capacity precondition that blocked an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The event is not open for enrollment.
    NotJoinable,
    /// Every seat is already held.
    Full,
    /// The user already holds an enrollment for this event.
    Duplicate,
    AlreadyCancelled,
    /// Rejected events cannot be cancelled.
    Rejected,
    /// Cancelled and rejected events are read-only.
    Terminal,
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::NotJoinable => "EVENT_NOT_JOINABLE",
            ConflictKind::Full => "EVENT_FULL",
            ConflictKind::Duplicate => "ALREADY_ENROLLED",
            ConflictKind::AlreadyCancelled => "EVENT_ALREADY_CANCELLED",
            ConflictKind::Rejected => "EVENT_REJECTED",
            ConflictKind::Terminal => "EVENT_NOT_EDITABLE",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ConflictKind::NotJoinable => "event is not open for enrollment",
            ConflictKind::Full => "event has no free seats",
            ConflictKind::Duplicate => "user is already enrolled in this event",
            ConflictKind::AlreadyCancelled => "event is already cancelled",
            ConflictKind::Rejected => "a rejected event cannot be cancelled",
            ConflictKind::Terminal => "a cancelled or rejected event cannot be edited",
        };
        f.write_str(message)
    }
}

/// Outcome kinds of every core operation.
///
/// Hidden resources are reported as [`CoreError::NotFound`] so callers cannot
/// tell "does not exist" apart from "not allowed to know it exists".
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("event not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage was unreachable or too slow. Safe to retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Unavailable(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
