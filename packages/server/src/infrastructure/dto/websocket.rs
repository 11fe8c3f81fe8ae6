//! WebSocket message DTOs.
//!
//! Inbound frames are JSON objects tagged by `type` (kebab-case); outbound
//! notifications carry the same tag style. Signaling payloads (offer, answer,
//! ICE candidate) are opaque `serde_json::Value`s: the relay never inspects
//! them.

use serde::{Deserialize, Serialize};

use crate::domain::{CallRole, ConnectionId, SessionId, Timestamp, UserId};

/// Inbound client events, dispatched by the WebSocket handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    BindConnection {
        user_id: String,
    },
    JoinQueue {
        user_id: String,
        mood: String,
    },
    LeaveQueue {
        user_id: String,
    },
    SignalOffer {
        target_user_id: String,
        offer: serde_json::Value,
    },
    SignalAnswer {
        target_user_id: String,
        answer: serde_json::Value,
    },
    SignalIce {
        target_user_id: String,
        candidate: serde_json::Value,
    },
    EndCall {
        session_id: String,
        partner_id: String,
    },
}

/// Outbound message type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    QueueStatus,
    MatchFound,
    QueueError,
    CallEnded,
    SignalOffer,
    SignalAnswer,
    SignalIce,
}

/// Which signaling frame is being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Ice,
}

impl SignalKind {
    pub fn message_type(&self) -> MessageType {
        match self {
            SignalKind::Offer => MessageType::SignalOffer,
            SignalKind::Answer => MessageType::SignalAnswer,
            SignalKind::Ice => MessageType::SignalIce,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Ice => "ice",
        }
    }
}

/// Queue status notification: sent on join (waiting + position) and leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusMessage {
    pub r#type: MessageType,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl QueueStatusMessage {
    pub fn waiting(mood: &str, position: usize) -> Self {
        Self {
            r#type: MessageType::QueueStatus,
            status: "waiting".to_string(),
            mood: Some(mood.to_string()),
            position: Some(position),
        }
    }

    pub fn left() -> Self {
        Self {
            r#type: MessageType::QueueStatus,
            status: "left".to_string(),
            mood: None,
            position: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Match notification delivered to each side of a freshly matched pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFoundMessage {
    pub r#type: MessageType,
    pub role: String,
    pub partner_id: String,
    pub partner_connection_id: String,
    pub session_id: String,
    pub timestamp: i64,
}

impl MatchFoundMessage {
    pub fn new(
        role: CallRole,
        partner_id: &UserId,
        partner_connection_id: ConnectionId,
        session_id: SessionId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            r#type: MessageType::MatchFound,
            role: role.as_str().to_string(),
            partner_id: partner_id.as_str().to_string(),
            partner_connection_id: partner_connection_id.to_string(),
            session_id: session_id.to_string(),
            timestamp: timestamp.value(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Error notification for a rejected request (invalid input, unknown session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueErrorMessage {
    pub r#type: MessageType,
    pub reason: String,
}

impl QueueErrorMessage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::QueueError,
            reason: reason.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Call-end notification, self- or partner-initiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEndedMessage {
    pub r#type: MessageType,
    pub reason: String,
}

impl CallEndedMessage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::CallEnded,
            reason: reason.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// A relayed signaling frame, re-addressed with the sender's identity so the
/// receiver knows whom to reply to. The payload passes through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub r#type: MessageType,
    pub sender_user_id: String,
    pub sender_connection_id: String,
    pub payload: serde_json::Value,
}

impl SignalMessage {
    pub fn new(
        kind: SignalKind,
        sender_user_id: &UserId,
        sender_connection_id: ConnectionId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            r#type: kind.message_type(),
            sender_user_id: sender_user_id.as_str().to_string(),
            sender_connection_id: sender_connection_id.to_string(),
            payload,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
