//! Domain entities: the waiting-queue entry and the chat session.

use serde::Serialize;

use super::value_object::{ConnectionId, Mood, SessionId, Timestamp, UserId};

/// A waiting user's record of intent to be matched, scoped to one mood.
///
/// Keyed uniquely by `user_id` in the queue store; re-joining refreshes the
/// mood, connection and joined_at in place instead of duplicating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub user_id: UserId,
    pub mood: Mood,
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
}

impl QueueEntry {
    pub fn new(
        user_id: UserId,
        mood: Mood,
        connection_id: ConnectionId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            mood,
            connection_id,
            joined_at,
        }
    }
}

/// Role of one side of a matched pair in WebRTC negotiation.
///
/// The initiator creates the offer; the receiver answers. Assigned
/// deterministically so both peers agree without extra negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    Initiator,
    Receiver,
}

impl CallRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallRole::Initiator => "initiator",
            CallRole::Receiver => "receiver",
        }
    }
}

/// The record of a matched pair's call, spanning from match to call end.
///
/// One shared row per pair: `user_id` holds the initiator, `partner_id` the
/// receiver, and both sides resolve the same `id`. Ended sessions are kept as
/// history; `end` is idempotent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub partner_id: UserId,
    pub mood: Mood,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl Session {
    /// Create a new active session for a matched pair.
    ///
    /// # Arguments
    ///
    /// * `initiator` - the side that will create the WebRTC offer
    /// * `receiver` - the side that will answer it
    pub fn new(
        id: SessionId,
        initiator: UserId,
        receiver: UserId,
        mood: Mood,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id: initiator,
            partner_id: receiver,
            mood,
            is_active: true,
            created_at,
            ended_at: None,
        }
    }

    /// Whether the given user is one of the two parties of this session.
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id || &self.partner_id == user_id
    }

    /// The other party, if the given user is part of this session.
    pub fn partner_of(&self, user_id: &UserId) -> Option<&UserId> {
        if &self.user_id == user_id {
            Some(&self.partner_id)
        } else if &self.partner_id == user_id {
            Some(&self.user_id)
        } else {
            None
        }
    }

    /// The negotiation role of the given user, if they are part of this session.
    pub fn role_of(&self, user_id: &UserId) -> Option<CallRole> {
        if &self.user_id == user_id {
            Some(CallRole::Initiator)
        } else if &self.partner_id == user_id {
            Some(CallRole::Receiver)
        } else {
            None
        }
    }

    /// End the session. Returns `true` on the first call, `false` if the
    /// session had already ended (idempotency: no double notifications).
    pub fn end(&mut self, at: Timestamp) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.ended_at = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(
            SessionId::generate(),
            UserId::new("alice".to_string()).unwrap(),
            UserId::new("bob".to_string()).unwrap(),
            Mood::Happy,
            Timestamp::new(1000),
        )
    }

    #[test]
    fn test_new_session_is_active() {
        // given / when:
        let session = test_session();

        // then:
        assert!(session.is_active);
        assert_eq!(session.ended_at, None);
    }

    #[test]
    fn test_partner_of_resolves_both_sides() {
        // given:
        let session = test_session();
        let alice = UserId::new("alice".to_string()).unwrap();
        let bob = UserId::new("bob".to_string()).unwrap();
        let carol = UserId::new("carol".to_string()).unwrap();

        // when / then:
        assert_eq!(session.partner_of(&alice), Some(&bob));
        assert_eq!(session.partner_of(&bob), Some(&alice));
        assert_eq!(session.partner_of(&carol), None);
    }

    #[test]
    fn test_role_of_assigns_complementary_roles() {
        // given:
        let session = test_session();
        let alice = UserId::new("alice".to_string()).unwrap();
        let bob = UserId::new("bob".to_string()).unwrap();

        // when / then:
        assert_eq!(session.role_of(&alice), Some(CallRole::Initiator));
        assert_eq!(session.role_of(&bob), Some(CallRole::Receiver));
    }

    #[test]
    fn test_end_is_idempotent() {
        // given:
        let mut session = test_session();

        // when:
        let first = session.end(Timestamp::new(2000));
        let second = session.end(Timestamp::new(3000));

        // then:
        assert!(first);
        assert!(!second);
        assert!(!session.is_active);
        // ended_at keeps the first end time
        assert_eq!(session.ended_at, Some(Timestamp::new(2000)));
    }
}
