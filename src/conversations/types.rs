//! Core types for conversation management.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title assigned to a conversation before its first exchange.
pub const UNTITLED_TITLE: &str = "Untitled";

/// Generate an ID intended to have good sort locality.
///
/// With feature `uuid_v7` enabled, this uses `Uuid::now_v7()`.
/// Otherwise it falls back to `Uuid::new_v4()`.
#[inline]
#[must_use]
fn uuid_time_ordered() -> Uuid {
    #[cfg(feature = "uuid_v7")]
    {
        Uuid::now_v7()
    }
    #[cfg(not(feature = "uuid_v7"))]
    {
        Uuid::new_v4()
    }
}

/// Identifier for a conversation.
///
/// Doubles as the storage key: the persisted document for a conversation is
/// named after this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConversationId(pub Uuid);

impl Default for ConversationId {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationId {
    /// Create a new identifier.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(uuid_time_ordered())
    }

    /// Wrap an existing UUID.
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Extract the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConversationId {
    #[inline]
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ConversationId> for Uuid {
    #[inline]
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

impl AsRef<Uuid> for ConversationId {
    #[inline]
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One user message and the generated reply it received.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessagePair {
    /// Text sent by the user.
    pub user_message: String,
    /// Text generated in reply.
    pub bot_response: String,
    /// Identifier of the completion model that produced the reply.
    pub model: String,
    /// Capture time of the exchange.
    pub timestamp: DateTime<Utc>,
}

impl MessagePair {
    /// Build a pair stamped with the current time.
    #[must_use]
    pub fn new(
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            model: model.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A titled, ordered sequence of message pairs.
///
/// This structure is the whole persisted document: one JSON file per
/// conversation, rewritten in full on every mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier, assigned at creation.
    pub id: ConversationId,
    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
    /// Display title; starts as [`UNTITLED_TITLE`] and is replaced once,
    /// after the first pair is recorded.
    pub title: String,
    /// Ordered exchanges; index positions are addressable by edits.
    pub messages: Vec<MessagePair>,
}

impl Conversation {
    /// Create an empty conversation with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            created_at: Utc::now(),
            title: UNTITLED_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// Project into the listing shape.
    #[must_use]
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing projection of a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Unique identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_empty_and_untitled() {
        let conversation = Conversation::new();
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.title, UNTITLED_TITLE);
    }

    #[test]
    fn test_conversation_id_round_trips_through_display() {
        let id = ConversationId::new();
        let parsed: ConversationId = id.to_string().parse().expect("parse own display output");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_conversation_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ConversationId>().is_err());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let mut conversation = Conversation::new();
        conversation
            .messages
            .push(MessagePair::new("hello", "hi there", "test-model"));

        let json = serde_json::to_string(&conversation).expect("serialize");
        let back: Conversation = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.id, conversation.id);
        assert_eq!(back.title, conversation.title);
        assert_eq!(back.messages.len(), 1);
        assert_eq!(back.messages[0].user_message, "hello");
        assert_eq!(back.messages[0].model, "test-model");
    }
}
