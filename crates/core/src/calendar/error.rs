use thiserror::Error;

use crate::recurrence::RuleError;

/// Errors that can occur when validating an event before it is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event title too long (max 200 characters)")]
    TitleTooLong,
    #[error("End time must be after or equal to start time")]
    InvalidTimeRange,
    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] RuleError),
}
