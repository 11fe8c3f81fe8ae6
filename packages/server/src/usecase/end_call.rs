//! UseCase: end a call.
//!
//! Ending is idempotent: the first request flips the session inactive and
//! notifies the partner once; any repeat is a no-op so no duplicate
//! notifications are ever sent.

use std::sync::Arc;

use musubi_shared::time::Clock;

use crate::domain::{ConnectionRegistry, SessionId, SessionRepository, Timestamp, UserId};
use crate::infrastructure::dto::websocket::CallEndedMessage;

use super::error::EndCallError;

/// What an end-call request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCallOutcome {
    /// The session was active and is now ended.
    Ended { partner_notified: bool },
    /// The session had already ended; nothing was changed or sent.
    AlreadyEnded,
}

pub struct EndCallUseCase {
    session_repository: Arc<dyn SessionRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl EndCallUseCase {
    pub fn new(
        session_repository: Arc<dyn SessionRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_repository,
            registry,
            clock,
        }
    }

    /// End the given session on behalf of `caller`.
    ///
    /// # Returns
    ///
    /// * `Ok(EndCallOutcome)` - ended now, or already ended (idempotent)
    /// * `Err(EndCallError)` - unknown session, or the caller is not a party
    pub async fn execute(
        &self,
        caller: &UserId,
        session_id: &SessionId,
    ) -> Result<EndCallOutcome, EndCallError> {
        let Some(session) = self.session_repository.get(session_id).await else {
            return Err(EndCallError::SessionNotFound(session_id.to_string()));
        };
        let Some(partner) = session.partner_of(caller).cloned() else {
            return Err(EndCallError::NotParticipant(
                caller.as_str().to_string(),
                session_id.to_string(),
            ));
        };

        let ended_now = self
            .session_repository
            .end(session_id, Timestamp::new(self.clock.now_millis()))
            .await
            .map_err(|_| EndCallError::SessionNotFound(session_id.to_string()))?;

        if !ended_now {
            tracing::debug!(
                "User '{}' asked to end session {} which had already ended",
                caller.as_str(),
                session_id
            );
            return Ok(EndCallOutcome::AlreadyEnded);
        }

        let message = CallEndedMessage::new("partner ended call").to_json();
        let partner_notified = match self.registry.push_to_user(&partner, &message).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    "Partner '{}' not notified of call end: {}",
                    partner.as_str(),
                    e
                );
                false
            }
        };

        tracing::info!(
            "User '{}' ended session {} (partner '{}' notified: {})",
            caller.as_str(),
            session_id,
            partner.as_str(),
            partner_notified
        );

        Ok(EndCallOutcome::Ended { partner_notified })
    }
}
