//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConversationId, MessageId, SwipeDirection, UserId};
use crate::error::GatewayError;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// A response to the command with the given id.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Response,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// An error reply with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u32, message: impl Into<String>) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        }
    }

    /// An error reply for a failed service call.
    #[must_use]
    pub fn from_gateway_error(id: String, err: &GatewayError) -> Self {
        let mut msg = Self::error(id, err.error_code(), err.to_string());
        if let GatewayError::Cooldown { retry_after_ms } = err
            && let Some(obj) = msg.payload.as_object_mut()
        {
            obj.insert("retry_after_ms".to_string(), serde_json::json!(retry_after_ms));
        }
        msg
    }

    /// A server-pushed event.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the `payload` of a `command` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Receive events for these users and conversations. `"*"` in
    /// `user_ids` subscribes to everything.
    Subscribe {
        /// User IDs (or `"*"`).
        #[serde(default)]
        user_ids: Vec<String>,
        /// Conversation IDs.
        #[serde(default)]
        conversation_ids: Vec<String>,
    },
    /// Stop receiving events for these users and conversations.
    Unsubscribe {
        /// User IDs.
        #[serde(default)]
        user_ids: Vec<String>,
        /// Conversation IDs.
        #[serde(default)]
        conversation_ids: Vec<String>,
    },
    /// Swipe on a profile.
    Swipe {
        /// Who swipes.
        actor_id: UserId,
        /// Whose profile.
        target_id: UserId,
        /// Decision.
        direction: SwipeDirection,
    },
    /// Submit a message for moderation.
    SendMessage {
        /// Target conversation.
        conversation_id: ConversationId,
        /// Author.
        sender_id: UserId,
        /// Text.
        text: String,
    },
    /// Advance a read pointer.
    MarkRead {
        /// Conversation.
        conversation_id: ConversationId,
        /// Reader.
        user_id: UserId,
        /// Last message read.
        up_to: MessageId,
    },
    /// Fetch messages missed since a cursor, e.g. after a reconnect.
    Sync {
        /// Conversation.
        conversation_id: ConversationId,
        /// Reader.
        user_id: UserId,
        /// Last message id seen.
        #[serde(default)]
        since: Option<MessageId>,
        /// Maximum number of messages.
        #[serde(default = "default_sync_limit")]
        limit: usize,
    },
}

fn default_sync_limit() -> usize {
    100
}
