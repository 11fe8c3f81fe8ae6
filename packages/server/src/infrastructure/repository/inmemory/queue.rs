//! In-memory queue repository.
//!
//! A `HashMap` keyed by user id behind a single mutex. Keying by user makes
//! the one-entry-per-user invariant structural, and holding the lock for the
//! whole of `take_pair` / `evict_older_than` makes those steps all-or-nothing
//! as the matching cycle requires.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{QueueEntry, QueueRepository, RepositoryError, Timestamp, UserId};

/// In-memory queue store implementation.
pub struct InMemoryQueueRepository {
    entries: Arc<Mutex<HashMap<UserId, QueueEntry>>>,
}

impl InMemoryQueueRepository {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Ordering used everywhere an entry list is exposed: joined_at first,
    /// user id as tie-break so equal timestamps still sort deterministically.
    fn sort_entries(entries: &mut [QueueEntry]) {
        entries.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.as_str().cmp(b.user_id.as_str()))
        });
    }
}

impl Default for InMemoryQueueRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn upsert(&self, entry: QueueEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().await;
        entries.insert(entry.user_id.clone(), entry);
        Ok(())
    }

    async fn remove(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(user_id).is_some())
    }

    async fn get(&self, user_id: &UserId) -> Option<QueueEntry> {
        let entries = self.entries.lock().await;
        entries.get(user_id).cloned()
    }

    async fn all_ordered(&self) -> Vec<QueueEntry> {
        let entries = self.entries.lock().await;
        let mut all: Vec<QueueEntry> = entries.values().cloned().collect();
        Self::sort_entries(&mut all);
        all
    }

    async fn position_in_mood(&self, user_id: &UserId) -> Option<usize> {
        let entries = self.entries.lock().await;
        let target = entries.get(user_id)?;
        let mut group: Vec<QueueEntry> = entries
            .values()
            .filter(|e| e.mood == target.mood)
            .cloned()
            .collect();
        Self::sort_entries(&mut group);
        group
            .iter()
            .position(|e| &e.user_id == user_id)
            .map(|idx| idx + 1)
    }

    async fn take_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<(QueueEntry, QueueEntry), RepositoryError> {
        let mut entries = self.entries.lock().await;
        let Some(entry_a) = entries.remove(a) else {
            return Err(RepositoryError::EntryVanished(a.as_str().to_string()));
        };
        let Some(entry_b) = entries.remove(b) else {
            // Put the first entry back so the failed pair removes neither.
            entries.insert(entry_a.user_id.clone(), entry_a);
            return Err(RepositoryError::EntryVanished(b.as_str().to_string()));
        };
        Ok((entry_a, entry_b))
    }

    async fn evict_older_than(&self, cutoff: Timestamp) -> Vec<QueueEntry> {
        let mut entries = self.entries.lock().await;
        let stale_ids: Vec<UserId> = entries
            .values()
            .filter(|e| e.joined_at < cutoff)
            .map(|e| e.user_id.clone())
            .collect();
        let mut evicted: Vec<QueueEntry> = stale_ids
            .iter()
            .filter_map(|id| entries.remove(id))
            .collect();
        Self::sort_entries(&mut evicted);
        evicted
    }

    async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }
}
