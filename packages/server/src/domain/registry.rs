//! Connection registry trait definition.
//!
//! The registry is the single owner of the process-local mapping from a user
//! to their live transport connections. The matching engine and the signaling
//! relay only read it (resolve + push); binding and unbinding happen solely
//! from the connection lifecycle handler.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::PushError;
use super::value_object::{ConnectionId, UserId};

/// Channel used to push outbound text frames to one connection's socket task.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Record that `connection_id` belongs to `user_id`. A user may hold more
    /// than one live connection (multiple tabs); an existing connection is
    /// not closed or treated specially.
    async fn bind(&self, user_id: UserId, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove the given connection from whichever user owns it. Returns the
    /// owning user, or `None` if the connection was never bound.
    async fn unbind(&self, connection_id: &ConnectionId) -> Option<UserId>;

    /// Whether the user has at least one live connection.
    async fn has_connection(&self, user_id: &UserId) -> bool;

    /// The user's most recently bound live connection, if any.
    async fn primary_connection(&self, user_id: &UserId) -> Option<ConnectionId>;

    /// Push a text frame to the user's most recently bound connection.
    /// Returns the connection that was targeted.
    async fn push_to_user(&self, user_id: &UserId, content: &str)
        -> Result<ConnectionId, PushError>;

    /// Push a text frame to one specific connection.
    async fn push_to_connection(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), PushError>;
}
