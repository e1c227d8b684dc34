/// Error types for study-recommend
///
/// This module defines all possible errors that can occur in the engine.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for recommendation operations
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (config and seed files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller supplied a value the engine refuses (unknown subject, bad seed record)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored row could not be mapped back to a domain value
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for recommendation operations
pub type Result<T> = std::result::Result<T, RecommendError>;

impl RecommendError {
    /// Convert RecommendError to a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RecommendError::Database(e) => {
                format!("Database error occurred. Please try again. Details: {}", e)
            }
            RecommendError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            RecommendError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            RecommendError::InvalidArgument(reason) => reason.clone(),
            RecommendError::CorruptRecord(detail) => {
                format!("Stored data is inconsistent: {}", detail)
            }
            RecommendError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
        }
    }

    /// True when the caller sent bad input and retrying won't help
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecommendError::InvalidArgument(_))
    }
}
