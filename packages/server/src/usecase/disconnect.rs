//! UseCase: connection-close cleanup.
//!
//! Runs when a transport connection closes. Unbinds the connection and, if it
//! was the user's last live one, cleans up whatever the user left behind: an
//! abandoned queue entry is removed immediately (not left to TTL eviction),
//! an active session is ended with the partner notified exactly once.

use std::sync::Arc;

use musubi_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionRegistry, QueueRepository, SessionRepository, Timestamp, UserId,
};
use crate::infrastructure::dto::websocket::CallEndedMessage;

/// What a disconnect cleaned up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisconnectReport {
    /// The user the connection belonged to, if it was bound at all.
    pub user_id: Option<UserId>,
    /// Whether this was the user's last live connection.
    pub last_connection: bool,
    pub removed_queue_entry: bool,
    pub ended_session: bool,
    pub partner_notified: bool,
}

pub struct DisconnectUseCase {
    queue_repository: Arc<dyn QueueRepository>,
    session_repository: Arc<dyn SessionRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl DisconnectUseCase {
    pub fn new(
        queue_repository: Arc<dyn QueueRepository>,
        session_repository: Arc<dyn SessionRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue_repository,
            session_repository,
            registry,
            clock,
        }
    }

    /// Handle a closed connection.
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectReport {
        let mut report = DisconnectReport::default();

        let Some(user_id) = self.registry.unbind(connection_id).await else {
            tracing::debug!(
                "Connection '{}' closed before binding to a user",
                connection_id
            );
            return report;
        };
        report.user_id = Some(user_id.clone());

        if self.registry.has_connection(&user_id).await {
            // Another tab is still live; the user is not gone.
            tracing::debug!(
                "User '{}' still has a live connection after '{}' closed",
                user_id.as_str(),
                connection_id
            );
            return report;
        }
        report.last_connection = true;

        if let Some(session) = self.session_repository.find_active_for_user(&user_id).await {
            let ended_at = Timestamp::new(self.clock.now_millis());
            match self.session_repository.end(&session.id, ended_at).await {
                Ok(true) => {
                    report.ended_session = true;
                    if let Some(partner) = session.partner_of(&user_id) {
                        let message = CallEndedMessage::new("partner disconnected").to_json();
                        report.partner_notified =
                            self.registry.push_to_user(partner, &message).await.is_ok();
                    }
                    tracing::info!(
                        "User '{}' disconnected mid-call, session {} ended (partner notified: {})",
                        user_id.as_str(),
                        session.id,
                        report.partner_notified
                    );
                }
                Ok(false) => {
                    // Lost a race with an explicit end-call; nothing left to do.
                    tracing::debug!(
                        "Session {} already ended when '{}' disconnected",
                        session.id,
                        user_id.as_str()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to end session {} on disconnect of '{}': {}",
                        session.id,
                        user_id.as_str(),
                        e
                    );
                }
            }
            return report;
        }

        match self.queue_repository.remove(&user_id).await {
            Ok(removed) => {
                report.removed_queue_entry = removed;
                if removed {
                    tracing::info!(
                        "Removed abandoned queue entry for disconnected user '{}'",
                        user_id.as_str()
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to remove queue entry for disconnected user '{}': {}",
                    user_id.as_str(),
                    e
                );
            }
        }

        report
    }
}
