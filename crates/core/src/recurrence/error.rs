use thiserror::Error;

/// Errors raised when a recurrence configuration fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Unknown recurrence type: {0}")]
    UnknownType(String),
    #[error("Unknown end type: {0}")]
    UnknownEndType(String),
    #[error("Unknown repeat unit: {0}")]
    UnknownUnit(String),
    #[error("Custom recurrence requires a repeat unit")]
    MissingUnit,
    #[error("Recurrence interval must be at least 1")]
    InvalidInterval,
    #[error("End type 'on' requires an end date")]
    MissingEndDate,
    #[error("End type 'after' requires a positive occurrence count")]
    MissingOccurrenceCount,
    #[error("Weekday index out of range (0-6): {0}")]
    InvalidWeekday(u8),
}

/// Result type for recurrence validation.
pub type Result<T> = std::result::Result<T, RuleError>;
