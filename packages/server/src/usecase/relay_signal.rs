//! UseCase: relay a WebRTC signaling frame between matched peers.
//!
//! The relay is a stateless pass-through: the payload is never inspected or
//! validated, only wrapped with the sender's identity so the receiver knows
//! whom to reply to. Delivery is best-effort — an offline target means the
//! frame is logged and dropped, never retried.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, PushError, UserId};
use crate::infrastructure::dto::websocket::{SignalKind, SignalMessage};

use super::error::RelaySignalError;

pub struct RelaySignalUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl RelaySignalUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Forward one signaling frame to the target's live connection.
    ///
    /// # Arguments
    ///
    /// * `kind` - offer, answer or ICE candidate (only affects the outbound tag)
    /// * `sender_user_id` / `sender_connection_id` - identity stamped onto the frame
    /// * `target_user_id` - recipient, resolved through the connection registry
    /// * `payload` - opaque WebRTC payload, forwarded verbatim
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - the connection the frame was delivered to
    /// * `Err(RelaySignalError)` - the frame was dropped (target offline or send failed)
    pub async fn execute(
        &self,
        kind: SignalKind,
        sender_user_id: &UserId,
        sender_connection_id: ConnectionId,
        target_user_id: &UserId,
        payload: serde_json::Value,
    ) -> Result<ConnectionId, RelaySignalError> {
        let message =
            SignalMessage::new(kind, sender_user_id, sender_connection_id, payload).to_json();

        match self.registry.push_to_user(target_user_id, &message).await {
            Ok(connection_id) => {
                tracing::debug!(
                    "Relayed {} from '{}' to '{}' (connection '{}')",
                    kind.as_str(),
                    sender_user_id.as_str(),
                    target_user_id.as_str(),
                    connection_id
                );
                Ok(connection_id)
            }
            Err(PushError::NoLiveConnection(_)) => {
                tracing::debug!(
                    "Dropped {} from '{}': target '{}' has no live connection",
                    kind.as_str(),
                    sender_user_id.as_str(),
                    target_user_id.as_str()
                );
                Err(RelaySignalError::TargetOffline(
                    target_user_id.as_str().to_string(),
                ))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to relay {} from '{}' to '{}': {}",
                    kind.as_str(),
                    sender_user_id.as_str(),
                    target_user_id.as_str(),
                    e
                );
                Err(RelaySignalError::Forward(e.to_string()))
            }
        }
    }
}
