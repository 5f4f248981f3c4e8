//! Error types for audience configuration operations.

use thiserror::Error;

/// Error type for audience configuration.
#[derive(Error, Debug)]
pub enum AudienceError {
    /// Field key is not in the closed configurable set.
    #[error("Unknown profile field: {0}")]
    InvalidField(String),

    /// Level key does not name an audience level.
    #[error("Unknown audience level: {0}")]
    InvalidAudienceLevel(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for audience configuration operations.
pub type Result<T> = std::result::Result<T, AudienceError>;
