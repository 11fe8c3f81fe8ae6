//! UseCase: leave the waiting queue.

use std::sync::Arc;

use crate::domain::{QueueRepository, UserId};

use super::error::LeaveQueueError;

/// Removes a user's queue entry, if present. Idempotent: leaving while not
/// queued is not an error.
pub struct LeaveQueueUseCase {
    queue_repository: Arc<dyn QueueRepository>,
}

impl LeaveQueueUseCase {
    pub fn new(queue_repository: Arc<dyn QueueRepository>) -> Self {
        Self { queue_repository }
    }

    /// Leave the queue.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - an entry was present and removed
    /// * `Ok(false)` - no entry was present (no-op)
    pub async fn execute(&self, user_id: &UserId) -> Result<bool, LeaveQueueError> {
        let removed = self
            .queue_repository
            .remove(user_id)
            .await
            .map_err(LeaveQueueError::Repository)?;

        if removed {
            tracing::info!("User '{}' left the queue", user_id.as_str());
        } else {
            tracing::debug!(
                "User '{}' asked to leave but had no queue entry",
                user_id.as_str()
            );
        }

        Ok(removed)
    }
}
