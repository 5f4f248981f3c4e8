//! Error types for friend-request ledger operations.
//!
//! Every ledger mutation surfaces its failure synchronously through
//! [`RelationshipError`]; nothing is swallowed or retried inside the
//! core. Read-only queries (relationship class, profile resolution)
//! are designed to never fail and do not use this type.

use thiserror::Error;

use super::types::RequestId;

/// Error type for friend-request operations.
#[derive(Error, Debug)]
pub enum RelationshipError {
    /// A user tried to send a friend request to themselves.
    #[error("Cannot send a friend request to yourself")]
    SelfReference,

    /// A pending request already exists for the pair, in either direction.
    #[error("A pending friend request already exists between these users")]
    DuplicateRequest,

    /// The pair already has an accepted request.
    #[error("Users are already friends")]
    AlreadyFriends,

    /// No request with the given id exists.
    #[error("Friend request not found: {0}")]
    NotFound(RequestId),

    /// The acting user is not allowed to perform this transition.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The request is not in a status that permits the transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for friend-request operations.
pub type Result<T> = std::result::Result<T, RelationshipError>;
