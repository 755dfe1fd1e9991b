use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// Callers treat every variant as a miss; none of them fails a read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
