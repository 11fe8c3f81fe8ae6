//! Value objects for the matching domain.
//!
//! All identifiers and the mood tag are validated at the boundary and carried
//! as typed values from there on, so the use case layer never sees a raw,
//! unchecked string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum accepted length of a user id, in characters.
const USER_ID_MAX_LEN: usize = 64;

/// Anonymous user identity.
///
/// Allocated outside this system (once per browser session); here it is an
/// opaque, non-empty string of at most 64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId, rejecting empty or oversized values.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyUserId);
        }
        if trimmed.chars().count() > USER_ID_MAX_LEN {
            return Err(ValueObjectError::UserIdTooLong(trimmed.chars().count()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of a single live transport connection.
///
/// Generated server-side when a WebSocket is accepted; a user that reconnects
/// (or opens a second tab) holds more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a matched pair's chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a session id received from the wire.
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidSessionId(value.to_string()))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The fixed set of user-selectable mood tags. The sole matching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Relaxed,
    Excited,
    Bored,
    Lonely,
    Curious,
    Romantic,
    Chatty,
}

impl Mood {
    /// All moods, in a fixed order (used for deterministic iteration).
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Relaxed,
        Mood::Excited,
        Mood::Bored,
        Mood::Lonely,
        Mood::Curious,
        Mood::Romantic,
        Mood::Chatty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Relaxed => "relaxed",
            Mood::Excited => "excited",
            Mood::Bored => "bored",
            Mood::Lonely => "lonely",
            Mood::Curious => "curious",
            Mood::Romantic => "romantic",
            Mood::Chatty => "chatty",
        }
    }
}

impl TryFrom<&str> for Mood {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "relaxed" => Ok(Mood::Relaxed),
            "excited" => Ok(Mood::Excited),
            "bored" => Ok(Mood::Bored),
            "lonely" => Ok(Mood::Lonely),
            "curious" => Ok(Mood::Curious),
            "romantic" => Ok(Mood::Romantic),
            "chatty" => Ok(Mood::Chatty),
            other => Err(ValueObjectError::UnknownMood(other.to_string())),
        }
    }
}

/// Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_normal_value() {
        // given:
        let raw = "user-42".to_string();

        // when:
        let result = UserId::new(raw);

        // then:
        assert_eq!(result.unwrap().as_str(), "user-42");
    }

    #[test]
    fn test_user_id_trims_whitespace() {
        // given:
        let raw = "  alice  ".to_string();

        // when:
        let result = UserId::new(raw).unwrap();

        // then:
        assert_eq!(result.as_str(), "alice");
    }

    #[test]
    fn test_user_id_rejects_empty_value() {
        // given:
        let raw = "   ".to_string();

        // when:
        let result = UserId::new(raw);

        // then:
        assert_eq!(result, Err(ValueObjectError::EmptyUserId));
    }

    #[test]
    fn test_user_id_rejects_oversized_value() {
        // given:
        let raw = "x".repeat(65);

        // when:
        let result = UserId::new(raw);

        // then:
        assert_eq!(result, Err(ValueObjectError::UserIdTooLong(65)));
    }

    #[test]
    fn test_mood_parses_all_fixed_values() {
        // given:
        let raw_values = [
            "happy", "relaxed", "excited", "bored", "lonely", "curious", "romantic", "chatty",
        ];

        // when / then:
        for (raw, expected) in raw_values.iter().zip(Mood::ALL.iter()) {
            assert_eq!(Mood::try_from(*raw).unwrap(), *expected);
        }
    }

    #[test]
    fn test_mood_parse_is_case_insensitive() {
        // given:
        let raw = "HaPpY";

        // when:
        let result = Mood::try_from(raw);

        // then:
        assert_eq!(result.unwrap(), Mood::Happy);
    }

    #[test]
    fn test_mood_rejects_unknown_value() {
        // given:
        let raw = "grumpy";

        // when:
        let result = Mood::try_from(raw);

        // then:
        assert_eq!(result, Err(ValueObjectError::UnknownMood("grumpy".to_string())));
    }

    #[test]
    fn test_session_id_round_trips_through_string() {
        // given:
        let id = SessionId::generate();

        // when:
        let parsed = SessionId::parse(&id.to_string());

        // then:
        assert_eq!(parsed.unwrap(), id);
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        // given:
        let raw = "not-a-uuid";

        // when:
        let result = SessionId::parse(raw);

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_ordering_follows_millis() {
        // given:
        let earlier = Timestamp::new(1000);
        let later = Timestamp::new(2000);

        // when / then:
        assert!(earlier < later);
        assert_eq!(earlier.value(), 1000);
    }
}
