//! UseCase: run one matching cycle.
//!
//! A cycle evicts over-age queue entries, pairs waiting users FIFO within
//! each mood group, creates one shared session per pair, and notifies both
//! sides. Every per-pair failure (a vanished entry, an unreachable side) is
//! contained to that pair; the cycle always completes and reports what it
//! did, so one bad pair can never halt matching.

use std::sync::Arc;

use musubi_shared::time::Clock;

use crate::domain::{
    CallRole, ConnectionRegistry, QueueEntry, QueueRepository, Session, SessionId,
    SessionRepository, Timestamp, matching,
};
use crate::infrastructure::dto::websocket::MatchFoundMessage;

/// What one matching cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Pairs matched and notified successfully.
    pub matched_pairs: usize,
    /// Queue entries removed by TTL eviction.
    pub evicted: usize,
    /// Pairs skipped because an entry vanished mid-cycle.
    pub conflicts: usize,
    /// Pairs abandoned because a side was unreachable (sessions rolled back).
    pub failed_notifications: usize,
}

impl CycleReport {
    /// Whether the cycle changed anything worth logging at info level.
    pub fn is_noop(&self) -> bool {
        self.matched_pairs == 0
            && self.evicted == 0
            && self.conflicts == 0
            && self.failed_notifications == 0
    }
}

enum PairOutcome {
    Matched,
    Conflict,
    NotificationFailed,
}

/// The matching engine entry point. All triggers (periodic tick, post-join
/// wake-up, direct invocation in tests) funnel through `execute`, which
/// serializes cycles behind its own mutex so two cycles can never select the
/// same queue entry.
pub struct RunMatchingCycleUseCase {
    queue_repository: Arc<dyn QueueRepository>,
    session_repository: Arc<dyn SessionRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    /// Entries older than this many milliseconds are evicted each cycle.
    max_wait_millis: i64,
    cycle_guard: tokio::sync::Mutex<()>,
}

impl RunMatchingCycleUseCase {
    pub fn new(
        queue_repository: Arc<dyn QueueRepository>,
        session_repository: Arc<dyn SessionRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        max_wait_millis: i64,
    ) -> Self {
        Self {
            queue_repository,
            session_repository,
            registry,
            clock,
            max_wait_millis,
            cycle_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one full cycle: evict, pair, create sessions, notify.
    pub async fn execute(&self) -> CycleReport {
        let _guard = self.cycle_guard.lock().await;
        let now = Timestamp::new(self.clock.now_millis());
        let mut report = CycleReport::default();

        // Eviction runs before pairing so an over-age entry can never be
        // matched by the same cycle that should have dropped it.
        let cutoff = Timestamp::new(now.value() - self.max_wait_millis);
        let evicted = self.queue_repository.evict_older_than(cutoff).await;
        report.evicted = evicted.len();
        for entry in &evicted {
            tracing::info!(
                "Evicted queue entry for user '{}' (joined at {}, waited past max)",
                entry.user_id.as_str(),
                entry.joined_at.value()
            );
        }

        let entries = self.queue_repository.all_ordered().await;
        let pairs = matching::pair_fifo(&entries);

        for (a, b) in pairs {
            match self.match_pair(a, b, now).await {
                PairOutcome::Matched => report.matched_pairs += 1,
                PairOutcome::Conflict => report.conflicts += 1,
                PairOutcome::NotificationFailed => report.failed_notifications += 1,
            }
        }

        report
    }

    /// Pair two queue entries: assign roles, atomically consume the entries,
    /// create the shared session, notify both sides.
    ///
    /// An unreachable side rolls the session back and restores neither queue
    /// entry: failed matches are not retried, the affected user must rejoin.
    async fn match_pair(&self, a: QueueEntry, b: QueueEntry, now: Timestamp) -> PairOutcome {
        // The smaller user id initiates; both peers can reproduce this.
        let (initiator, receiver) = if matching::initiator_precedes(&a.user_id, &b.user_id) {
            (a, b)
        } else {
            (b, a)
        };

        if let Err(e) = self
            .queue_repository
            .take_pair(&initiator.user_id, &receiver.user_id)
            .await
        {
            tracing::warn!("Skipping pair, entry vanished mid-cycle: {}", e);
            return PairOutcome::Conflict;
        }

        // Resolve live connections for both sides up front; a missing side
        // means the match fails before the session is visible anywhere.
        let initiator_conn = self.registry.primary_connection(&initiator.user_id).await;
        let receiver_conn = self.registry.primary_connection(&receiver.user_id).await;
        let (Some(initiator_conn), Some(receiver_conn)) = (initiator_conn, receiver_conn) else {
            tracing::warn!(
                "Match between '{}' and '{}' abandoned: a side has no live connection",
                initiator.user_id.as_str(),
                receiver.user_id.as_str()
            );
            return PairOutcome::NotificationFailed;
        };

        let session_id = SessionId::generate();
        let session = Session::new(
            session_id,
            initiator.user_id.clone(),
            receiver.user_id.clone(),
            initiator.mood,
            now,
        );
        if let Err(e) = self.session_repository.insert(session).await {
            tracing::warn!(
                "Skipping pair '{}'/'{}': {}",
                initiator.user_id.as_str(),
                receiver.user_id.as_str(),
                e
            );
            return PairOutcome::Conflict;
        }

        let to_initiator = MatchFoundMessage::new(
            CallRole::Initiator,
            &receiver.user_id,
            receiver_conn,
            session_id,
            now,
        )
        .to_json();
        let to_receiver = MatchFoundMessage::new(
            CallRole::Receiver,
            &initiator.user_id,
            initiator_conn,
            session_id,
            now,
        )
        .to_json();

        let pushed_initiator = self
            .registry
            .push_to_connection(&initiator_conn, &to_initiator)
            .await;
        let pushed_receiver = self
            .registry
            .push_to_connection(&receiver_conn, &to_receiver)
            .await;

        if pushed_initiator.is_err() || pushed_receiver.is_err() {
            // Roll back: the session never happened. Queue entries stay
            // consumed; the affected users must rejoin explicitly.
            let _ = self.session_repository.delete(&session_id).await;
            tracing::warn!(
                "Match notification failed for '{}'/'{}', session {} rolled back",
                initiator.user_id.as_str(),
                receiver.user_id.as_str(),
                session_id
            );
            return PairOutcome::NotificationFailed;
        }

        tracing::info!(
            "Matched '{}' (initiator) with '{}' (receiver) in mood '{}', session {}",
            initiator.user_id.as_str(),
            receiver.user_id.as_str(),
            initiator.mood.as_str(),
            session_id
        );
        PairOutcome::Matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Mood, UserId};
    use crate::infrastructure::registry::WebSocketConnectionRegistry;
    use crate::infrastructure::repository::{InMemoryQueueRepository, InMemorySessionRepository};
    use musubi_shared::time::FixedClock;
    use tokio::sync::mpsc;

    const MAX_WAIT_MILLIS: i64 = 300_000;

    fn uid(value: &str) -> UserId {
        UserId::new(value.to_string()).unwrap()
    }

    struct TestHarness {
        usecase: RunMatchingCycleUseCase,
        queue: Arc<InMemoryQueueRepository>,
        sessions: Arc<InMemorySessionRepository>,
        registry: Arc<WebSocketConnectionRegistry>,
    }

    fn create_harness(now_millis: i64) -> TestHarness {
        let queue = Arc::new(InMemoryQueueRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let usecase = RunMatchingCycleUseCase::new(
            queue.clone(),
            sessions.clone(),
            registry.clone(),
            Arc::new(FixedClock::new(now_millis)),
            MAX_WAIT_MILLIS,
        );
        TestHarness {
            usecase,
            queue,
            sessions,
            registry,
        }
    }

    /// Bind a user with a fresh connection and return the receiving end.
    async fn connect_user(
        harness: &TestHarness,
        user_id: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        harness.registry.bind(uid(user_id), conn, tx).await;
        (conn, rx)
    }

    async fn enqueue(
        harness: &TestHarness,
        user_id: &str,
        mood: Mood,
        connection_id: ConnectionId,
        joined_at: i64,
    ) {
        harness
            .queue
            .upsert(QueueEntry::new(
                uid(user_id),
                mood,
                connection_id,
                Timestamp::new(joined_at),
            ))
            .await
            .unwrap();
    }

    fn parse(message: &str) -> serde_json::Value {
        serde_json::from_str(message).unwrap()
    }

    #[tokio::test]
    async fn test_two_users_same_mood_are_matched_once() {
        // given: u1 and u2 both waiting with mood happy
        let harness = create_harness(10_000);
        let (conn1, mut rx1) = connect_user(&harness, "u1").await;
        let (conn2, mut rx2) = connect_user(&harness, "u2").await;
        enqueue(&harness, "u1", Mood::Happy, conn1, 1000).await;
        enqueue(&harness, "u2", Mood::Happy, conn2, 2000).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: exactly one match, queue drained, one active session
        assert_eq!(report.matched_pairs, 1);
        assert_eq!(harness.queue.len().await, 0);
        let session = harness
            .sessions
            .find_active_for_user(&uid("u1"))
            .await
            .expect("session created");
        assert!(session.involves(&uid("u2")));

        // both sides received match-found with complementary roles and the
        // same session id
        let msg1 = parse(&rx1.recv().await.unwrap());
        let msg2 = parse(&rx2.recv().await.unwrap());
        assert_eq!(msg1["type"], "match-found");
        assert_eq!(msg2["type"], "match-found");
        assert_eq!(msg1["session_id"], msg2["session_id"]);
        assert_eq!(msg1["role"], "initiator"); // "u1" < "u2"
        assert_eq!(msg2["role"], "receiver");
        assert_eq!(msg1["partner_id"], "u2");
        assert_eq!(msg2["partner_id"], "u1");
    }

    #[tokio::test]
    async fn test_different_moods_never_match() {
        // given:
        let harness = create_harness(10_000);
        let (conn1, mut rx1) = connect_user(&harness, "u1").await;
        let (conn2, mut rx2) = connect_user(&harness, "u2").await;
        enqueue(&harness, "u1", Mood::Happy, conn1, 1000).await;
        enqueue(&harness, "u2", Mood::Relaxed, conn2, 2000).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: both remain queued at position 1, nothing delivered
        assert_eq!(report.matched_pairs, 0);
        assert_eq!(harness.queue.len().await, 2);
        assert_eq!(harness.queue.position_in_mood(&uid("u1")).await, Some(1));
        assert_eq!(harness.queue.position_in_mood(&uid("u2")).await, Some(1));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fifo_pairs_two_longest_waiting_first() {
        // given: three users in one mood
        let harness = create_harness(10_000);
        let (conn1, _rx1) = connect_user(&harness, "u1").await;
        let (conn2, _rx2) = connect_user(&harness, "u2").await;
        let (conn3, mut rx3) = connect_user(&harness, "u3").await;
        enqueue(&harness, "u1", Mood::Bored, conn1, 1000).await;
        enqueue(&harness, "u2", Mood::Bored, conn2, 2000).await;
        enqueue(&harness, "u3", Mood::Bored, conn3, 3000).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: the newest arrival is left waiting
        assert_eq!(report.matched_pairs, 1);
        assert!(harness.queue.get(&uid("u3")).await.is_some());
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_numeric_ids_assign_initiator_numerically() {
        // given: ids "9" and "10" — lexicographically "10" < "9"
        let harness = create_harness(10_000);
        let (conn9, mut rx9) = connect_user(&harness, "9").await;
        let (conn10, mut rx10) = connect_user(&harness, "10").await;
        enqueue(&harness, "9", Mood::Happy, conn9, 1000).await;
        enqueue(&harness, "10", Mood::Happy, conn10, 2000).await;

        // when:
        harness.usecase.execute().await;

        // then: the numerically smaller id initiates
        let msg9 = parse(&rx9.recv().await.unwrap());
        let msg10 = parse(&rx10.recv().await.unwrap());
        assert_eq!(msg9["role"], "initiator");
        assert_eq!(msg10["role"], "receiver");
    }

    #[tokio::test]
    async fn test_unreachable_side_rolls_back_session_and_restores_nothing() {
        // given: u2 queued but with no live connection
        let harness = create_harness(10_000);
        let (conn1, mut rx1) = connect_user(&harness, "u1").await;
        let orphan_conn = ConnectionId::generate();
        enqueue(&harness, "u1", Mood::Happy, conn1, 1000).await;
        enqueue(&harness, "u2", Mood::Happy, orphan_conn, 2000).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: no session survives, queue entries are consumed, u1 got
        // nothing and must rejoin explicitly
        assert_eq!(report.failed_notifications, 1);
        assert_eq!(report.matched_pairs, 0);
        assert!(harness.sessions.find_active_for_user(&uid("u1")).await.is_none());
        assert_eq!(harness.queue.len().await, 0);
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_over_age_entries_are_evicted_not_matched() {
        // given: two users whose entries are both older than max-wait
        let now = 1_000_000;
        let harness = create_harness(now);
        let (conn1, mut rx1) = connect_user(&harness, "u1").await;
        let (conn2, mut rx2) = connect_user(&harness, "u2").await;
        let stale = now - MAX_WAIT_MILLIS - 1;
        enqueue(&harness, "u1", Mood::Happy, conn1, stale).await;
        enqueue(&harness, "u2", Mood::Happy, conn2, stale).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: evicted, never matched
        assert_eq!(report.evicted, 2);
        assert_eq!(report.matched_pairs, 0);
        assert_eq!(harness.queue.len().await, 0);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fresh_entry_survives_eviction_and_waits() {
        // given: one stale entry and one fresh one in the same mood
        let now = 1_000_000;
        let harness = create_harness(now);
        let (conn1, _rx1) = connect_user(&harness, "u1").await;
        let (conn2, mut rx2) = connect_user(&harness, "u2").await;
        enqueue(&harness, "u1", Mood::Happy, conn1, now - MAX_WAIT_MILLIS - 1).await;
        enqueue(&harness, "u2", Mood::Happy, conn2, now - 1000).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: the stale entry is gone and the fresh one keeps waiting alone
        assert_eq!(report.evicted, 1);
        assert_eq!(report.matched_pairs, 0);
        assert!(harness.queue.get(&uid("u2")).await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_four_users_two_moods_two_pairs() {
        // given:
        let harness = create_harness(10_000);
        let (c1, mut rx1) = connect_user(&harness, "u1").await;
        let (c2, mut rx2) = connect_user(&harness, "u2").await;
        let (c3, mut rx3) = connect_user(&harness, "u3").await;
        let (c4, mut rx4) = connect_user(&harness, "u4").await;
        enqueue(&harness, "u1", Mood::Happy, c1, 1000).await;
        enqueue(&harness, "u2", Mood::Relaxed, c2, 1500).await;
        enqueue(&harness, "u3", Mood::Happy, c3, 2000).await;
        enqueue(&harness, "u4", Mood::Relaxed, c4, 2500).await;

        // when:
        let report = harness.usecase.execute().await;

        // then: every pair shares a mood
        assert_eq!(report.matched_pairs, 2);
        let m1 = parse(&rx1.recv().await.unwrap());
        let m2 = parse(&rx2.recv().await.unwrap());
        let m3 = parse(&rx3.recv().await.unwrap());
        let m4 = parse(&rx4.recv().await.unwrap());
        assert_eq!(m1["partner_id"], "u3");
        assert_eq!(m3["partner_id"], "u1");
        assert_eq!(m2["partner_id"], "u4");
        assert_eq!(m4["partner_id"], "u2");
    }

    #[tokio::test]
    async fn test_empty_queue_cycle_is_a_noop() {
        // given:
        let harness = create_harness(10_000);

        // when:
        let report = harness.usecase.execute().await;

        // then:
        assert!(report.is_noop());
    }
}
