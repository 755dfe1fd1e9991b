use thiserror::Error;

/// Errors that can occur when constructing a time window.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid time window: start must be before or equal to end")]
    InvalidRange,
    #[error("Invalid window bounds: {0} (expected 'half-open' or 'closed')")]
    UnknownBounds(String),
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Shorthand for a missing event.
    pub fn event_not_found(id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity_type: "Event",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
