//! WebSocket-backed connection registry implementation.
//!
//! Owns the `UnboundedSender` pusher channels for every live socket. Two maps
//! are kept in step under one mutex: user id to bound connections (most
//! recent last) and a reverse connection-to-user index, so both sender
//! resolution and unbind are lookups rather than scans.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionRegistry, PushError, PusherChannel, UserId};

/// One bound connection: its id and the channel to its socket task.
struct BoundConnection {
    connection_id: ConnectionId,
    sender: PusherChannel,
}

#[derive(Default)]
struct RegistryState {
    /// user id -> live connections, oldest first (a user may have several tabs)
    by_user: HashMap<UserId, Vec<BoundConnection>>,
    /// connection id -> owning user id
    by_connection: HashMap<ConnectionId, UserId>,
}

/// Registry of live WebSocket connections per user. Thread-safe; shared via Arc.
pub struct WebSocketConnectionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl WebSocketConnectionRegistry {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }
}

impl Default for WebSocketConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn bind(&self, user_id: UserId, connection_id: ConnectionId, sender: PusherChannel) {
        let mut state = self.state.lock().await;
        // Re-binding the same connection (e.g. a second bind-connection frame)
        // must not leave it listed under two users.
        if let Some(previous_owner) = state.by_connection.insert(connection_id, user_id.clone()) {
            if previous_owner != user_id {
                let now_empty = state
                    .by_user
                    .get_mut(&previous_owner)
                    .map(|connections| {
                        connections.retain(|c| c.connection_id != connection_id);
                        connections.is_empty()
                    })
                    .unwrap_or(false);
                if now_empty {
                    state.by_user.remove(&previous_owner);
                }
            }
        }
        let connections = state.by_user.entry(user_id.clone()).or_default();
        connections.retain(|c| c.connection_id != connection_id);
        connections.push(BoundConnection {
            connection_id,
            sender,
        });
        tracing::debug!(
            "Connection '{}' bound to user '{}'",
            connection_id,
            user_id.as_str()
        );
    }

    async fn unbind(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let mut state = self.state.lock().await;
        let user_id = state.by_connection.remove(connection_id)?;
        let now_empty = state
            .by_user
            .get_mut(&user_id)
            .map(|connections| {
                connections.retain(|c| &c.connection_id != connection_id);
                connections.is_empty()
            })
            .unwrap_or(false);
        if now_empty {
            state.by_user.remove(&user_id);
        }
        tracing::debug!(
            "Connection '{}' unbound from user '{}'",
            connection_id,
            user_id.as_str()
        );
        Some(user_id)
    }

    async fn has_connection(&self, user_id: &UserId) -> bool {
        let state = self.state.lock().await;
        state
            .by_user
            .get(user_id)
            .is_some_and(|connections| !connections.is_empty())
    }

    async fn primary_connection(&self, user_id: &UserId) -> Option<ConnectionId> {
        let state = self.state.lock().await;
        state
            .by_user
            .get(user_id)
            .and_then(|connections| connections.last())
            .map(|c| c.connection_id)
    }

    async fn push_to_user(
        &self,
        user_id: &UserId,
        content: &str,
    ) -> Result<ConnectionId, PushError> {
        let state = self.state.lock().await;
        let connection = state
            .by_user
            .get(user_id)
            .and_then(|connections| connections.last())
            .ok_or_else(|| PushError::NoLiveConnection(user_id.as_str().to_string()))?;
        connection
            .sender
            .send(content.to_string())
            .map_err(|e| PushError::PushFailed(e.to_string()))?;
        tracing::debug!(
            "Pushed message to user '{}' via connection '{}'",
            user_id.as_str(),
            connection.connection_id
        );
        Ok(connection.connection_id)
    }

    async fn push_to_connection(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), PushError> {
        let state = self.state.lock().await;
        let user_id = state
            .by_connection
            .get(connection_id)
            .ok_or_else(|| PushError::UnknownConnection(connection_id.to_string()))?;
        let connection = state
            .by_user
            .get(user_id)
            .and_then(|connections| {
                connections
                    .iter()
                    .find(|c| &c.connection_id == connection_id)
            })
            .ok_or_else(|| PushError::UnknownConnection(connection_id.to_string()))?;
        connection
            .sender
            .send(content.to_string())
            .map_err(|e| PushError::PushFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn uid(value: &str) -> UserId {
        UserId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_bind_and_push_to_user() {
        // given:
        let registry = WebSocketConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        registry.bind(uid("alice"), conn, tx).await;

        // when:
        let result = registry.push_to_user(&uid("alice"), "hello").await;

        // then:
        assert_eq!(result.unwrap(), conn);
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_user_without_connection_fails() {
        // given:
        let registry = WebSocketConnectionRegistry::new();

        // when:
        let result = registry.push_to_user(&uid("ghost"), "hello").await;

        // then:
        assert!(matches!(result, Err(PushError::NoLiveConnection(_))));
    }

    #[tokio::test]
    async fn test_most_recent_connection_is_primary() {
        // given: alice opens two tabs
        let registry = WebSocketConnectionRegistry::new();
        let (tx1, mut _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let conn1 = ConnectionId::generate();
        let conn2 = ConnectionId::generate();
        registry.bind(uid("alice"), conn1, tx1).await;
        registry.bind(uid("alice"), conn2, tx2).await;

        // when:
        let primary = registry.primary_connection(&uid("alice")).await;
        registry.push_to_user(&uid("alice"), "hi").await.unwrap();

        // then: the newest connection receives
        assert_eq!(primary, Some(conn2));
        assert_eq!(rx2.recv().await, Some("hi".to_string()));
    }

    #[tokio::test]
    async fn test_unbind_removes_only_that_connection() {
        // given:
        let registry = WebSocketConnectionRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let conn1 = ConnectionId::generate();
        let conn2 = ConnectionId::generate();
        registry.bind(uid("alice"), conn1, tx1).await;
        registry.bind(uid("alice"), conn2, tx2).await;

        // when: the old tab closes
        let owner = registry.unbind(&conn1).await;

        // then: alice is still reachable through the second tab
        assert_eq!(owner, Some(uid("alice")));
        assert!(registry.has_connection(&uid("alice")).await);
        assert_eq!(registry.primary_connection(&uid("alice")).await, Some(conn2));
    }

    #[tokio::test]
    async fn test_unbind_last_connection_clears_user() {
        // given:
        let registry = WebSocketConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        registry.bind(uid("alice"), conn, tx).await;

        // when:
        registry.unbind(&conn).await;

        // then:
        assert!(!registry.has_connection(&uid("alice")).await);
        assert_eq!(registry.primary_connection(&uid("alice")).await, None);
    }

    #[tokio::test]
    async fn test_unbind_unknown_connection_returns_none() {
        // given:
        let registry = WebSocketConnectionRegistry::new();

        // when:
        let owner = registry.unbind(&ConnectionId::generate()).await;

        // then:
        assert_eq!(owner, None);
    }

    #[tokio::test]
    async fn test_push_to_specific_connection() {
        // given: alice has two tabs
        let registry = WebSocketConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut _rx2) = mpsc::unbounded_channel();
        let conn1 = ConnectionId::generate();
        let conn2 = ConnectionId::generate();
        registry.bind(uid("alice"), conn1, tx1).await;
        registry.bind(uid("alice"), conn2, tx2).await;

        // when: a frame is addressed to the older tab explicitly
        let result = registry.push_to_connection(&conn1, "targeted").await;

        // then:
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some("targeted".to_string()));
    }

    #[tokio::test]
    async fn test_rebinding_connection_to_new_user_moves_it() {
        // given: a connection first bound to alice
        let registry = WebSocketConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        registry.bind(uid("alice"), conn, tx.clone()).await;

        // when: the same connection re-binds as bob
        registry.bind(uid("bob"), conn, tx).await;

        // then: alice no longer owns it
        assert!(!registry.has_connection(&uid("alice")).await);
        assert!(registry.has_connection(&uid("bob")).await);
    }
}
