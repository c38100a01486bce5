use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::constants::event_kinds;

/// Event kinds carried over the transport. Closed set; the payload shape is
/// fixed per kind (see [`EventPayload`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Typing,
    Presence,
    Status,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => event_kinds::MESSAGE,
            Self::Typing => event_kinds::TYPING,
            Self::Presence => event_kinds::PRESENCE,
            Self::Status => event_kinds::STATUS,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content type of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    File,
}

/// Delivery state reported for a previously sent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Sending,
    Sent,
    Delivered,
    Read,
}

/// Payload of a `message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
}

/// Payload of a `typing` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingBody {
    pub is_typing: bool,
}

/// Payload of a `presence` event. `last_seen` is carried only when the user
/// goes offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceBody {
    pub is_online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Payload of a `status` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub message_id: String,
    pub status: DeliveryState,
}

/// Typed event payloads, tagged by kind on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum EventPayload {
    Message(MessageBody),
    Typing(TypingBody),
    Presence(PresenceBody),
    Status(StatusBody),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::Typing(_) => EventKind::Typing,
            Self::Presence(_) => EventKind::Presence,
            Self::Status(_) => EventKind::Status,
        }
    }
}

/// The wire-level unit exchanged over the realtime transport.
///
/// An envelope is immutable once constructed; `sent_at` is stamped exactly
/// once, when the envelope is built immediately before hand-off to the
/// transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(flatten)]
    event: EventPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor_id: Option<String>,
    sent_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: EventPayload) -> Self {
        Self {
            event,
            chat_id: None,
            actor_id: None,
            sent_at: Utc::now(),
        }
    }

    /// Tags the envelope with the conversation it pertains to
    pub fn with_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Tags the envelope with the originating user
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.event
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}
