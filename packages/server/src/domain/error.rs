//! Domain-level error types.

use thiserror::Error;

/// Validation errors raised when constructing value objects from wire input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("user id too long ({0} characters)")]
    UserIdTooLong(usize),

    #[error("unknown mood: '{0}'")]
    UnknownMood(String),

    #[error("invalid session id: '{0}'")]
    InvalidSessionId(String),
}

/// Errors raised by the queue and session repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// A queue entry disappeared between selection and removal (concurrent
    /// leave/disconnect). The matching cycle skips the affected pair.
    #[error("queue entry for user '{0}' vanished during pairing")]
    EntryVanished(String),

    /// The one-active-session-per-user invariant would be violated.
    #[error("user '{0}' already has an active session")]
    ActiveSessionExists(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

/// Errors raised when pushing a message through the connection registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("no live connection for user '{0}'")]
    NoLiveConnection(String),

    #[error("no live connection with id '{0}'")]
    UnknownConnection(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
