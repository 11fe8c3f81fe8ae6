//! Use case error types.

use thiserror::Error;

use crate::domain::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinQueueError {
    #[error("failed to store queue entry: {0}")]
    Repository(RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveQueueError {
    #[error("failed to remove queue entry: {0}")]
    Repository(RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelaySignalError {
    /// The target has no live connection; the signal is dropped, not retried.
    #[error("target user '{0}' has no live connection")]
    TargetOffline(String),

    #[error("failed to forward signal: {0}")]
    Forward(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndCallError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("user '{0}' is not part of session '{1}'")]
    NotParticipant(String, String),
}
