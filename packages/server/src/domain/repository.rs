//! Repository trait definitions.
//!
//! The domain layer owns the interfaces it needs for data access; the
//! infrastructure layer provides the concrete implementations (dependency
//! inversion). Nothing here assumes more than a keyed store, so a database
//! backend can replace the in-memory one without touching the use cases.

use async_trait::async_trait;

use super::entity::{QueueEntry, Session};
use super::error::RepositoryError;
use super::value_object::{SessionId, Timestamp, UserId};

/// Queue store: at most one entry per user at any time.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert or refresh the entry for `entry.user_id`. A re-join replaces
    /// the prior entry (mood, connection and joined_at) instead of
    /// duplicating it.
    async fn upsert(&self, entry: QueueEntry) -> Result<(), RepositoryError>;

    /// Remove the entry for the given user. Returns whether one was present;
    /// removing an absent entry is not an error (idempotent leave).
    async fn remove(&self, user_id: &UserId) -> Result<bool, RepositoryError>;

    /// Look up a single entry.
    async fn get(&self, user_id: &UserId) -> Option<QueueEntry>;

    /// All entries ordered by joined_at ascending (oldest first).
    async fn all_ordered(&self) -> Vec<QueueEntry>;

    /// 1-indexed rank of the user within their mood group, by joined_at.
    async fn position_in_mood(&self, user_id: &UserId) -> Option<usize>;

    /// Atomically remove both entries of a candidate pair. Fails with
    /// [`RepositoryError::EntryVanished`] (removing neither) if either entry
    /// is gone, so a concurrent leave/disconnect aborts only this pair.
    async fn take_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<(QueueEntry, QueueEntry), RepositoryError>;

    /// Remove every entry with joined_at older than `cutoff`, all-or-nothing.
    /// Returns the evicted entries.
    async fn evict_older_than(&self, cutoff: Timestamp) -> Vec<QueueEntry>;

    /// Number of waiting entries.
    async fn len(&self) -> usize;
}

/// Session store: at most one active session per user; history retained.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session. Fails with
    /// [`RepositoryError::ActiveSessionExists`] if either party already has
    /// an active session.
    async fn insert(&self, session: Session) -> Result<(), RepositoryError>;

    /// Look up a session by id.
    async fn get(&self, id: &SessionId) -> Option<Session>;

    /// The active session the user is part of, if any.
    async fn find_active_for_user(&self, user_id: &UserId) -> Option<Session>;

    /// End a session. Returns `true` if it was active and is now ended,
    /// `false` if it had already ended (idempotent). Fails with
    /// [`RepositoryError::SessionNotFound`] for an unknown id.
    async fn end(&self, id: &SessionId, ended_at: Timestamp) -> Result<bool, RepositoryError>;

    /// Physically remove a session row. Only used to roll back a match whose
    /// notification failed before either side learned of it; ended sessions
    /// are otherwise retained as history.
    async fn delete(&self, id: &SessionId) -> Result<bool, RepositoryError>;

    /// Snapshot of every stored session (debug endpoint).
    async fn all(&self) -> Vec<Session>;
}
