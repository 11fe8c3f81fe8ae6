//! In-memory session repository.
//!
//! A `HashMap` keyed by session id behind a single mutex. The
//! one-active-session-per-user invariant is checked inside `insert` while the
//! lock is held, so two concurrent matches can never both activate a session
//! for the same user.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Session, SessionId, SessionRepository, Timestamp, UserId};

/// In-memory session store implementation.
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        for existing in sessions.values() {
            if !existing.is_active {
                continue;
            }
            if existing.involves(&session.user_id) {
                return Err(RepositoryError::ActiveSessionExists(
                    session.user_id.as_str().to_string(),
                ));
            }
            if existing.involves(&session.partner_id) {
                return Err(RepositoryError::ActiveSessionExists(
                    session.partner_id.as_str().to_string(),
                ));
            }
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(id).cloned()
    }

    async fn find_active_for_user(&self, user_id: &UserId) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .find(|s| s.is_active && s.involves(user_id))
            .cloned()
    }

    async fn end(&self, id: &SessionId, ended_at: Timestamp) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(session) => Ok(session.end(ended_at)),
            None => Err(RepositoryError::SessionNotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.remove(id).is_some())
    }

    async fn all(&self) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        let mut all: Vec<Session> = sessions.values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        all
    }
}
