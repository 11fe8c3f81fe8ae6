//! UseCase: join the waiting queue.

use std::sync::Arc;

use tokio::sync::Notify;

use musubi_shared::time::Clock;

use crate::domain::{ConnectionId, Mood, QueueEntry, QueueRepository, Timestamp, UserId};

use super::error::JoinQueueError;

/// Puts a user into the waiting queue for their chosen mood.
///
/// A re-join by the same user replaces the prior entry (mood, connection and
/// joined_at are refreshed), implicitly cancelling the stale wait. Every
/// successful join wakes the matching scheduler so a waiting counterpart is
/// paired immediately instead of on the next periodic tick.
pub struct JoinQueueUseCase {
    queue_repository: Arc<dyn QueueRepository>,
    clock: Arc<dyn Clock>,
    match_trigger: Arc<Notify>,
}

impl JoinQueueUseCase {
    pub fn new(
        queue_repository: Arc<dyn QueueRepository>,
        clock: Arc<dyn Clock>,
        match_trigger: Arc<Notify>,
    ) -> Self {
        Self {
            queue_repository,
            clock,
            match_trigger,
        }
    }

    /// Join the queue.
    ///
    /// # Arguments
    ///
    /// * `user_id` - the joining user (validated at the boundary)
    /// * `mood` - the mood group to wait in
    /// * `connection_id` - the live connection the join arrived on
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - the 1-indexed position within the mood group
    /// * `Err(JoinQueueError)` - the entry could not be stored
    pub async fn execute(
        &self,
        user_id: UserId,
        mood: Mood,
        connection_id: ConnectionId,
    ) -> Result<usize, JoinQueueError> {
        let joined_at = Timestamp::new(self.clock.now_millis());
        let entry = QueueEntry::new(user_id.clone(), mood, connection_id, joined_at);

        self.queue_repository
            .upsert(entry)
            .await
            .map_err(JoinQueueError::Repository)?;

        // The entry was just inserted, so a missing position can only mean a
        // concurrent match already consumed it; report the front of the queue.
        let position = self
            .queue_repository
            .position_in_mood(&user_id)
            .await
            .unwrap_or(1);

        tracing::info!(
            "User '{}' joined queue with mood '{}' at position {}",
            user_id.as_str(),
            mood.as_str(),
            position
        );

        self.match_trigger.notify_one();

        Ok(position)
    }
}
