//! Chat messages and their moderation lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ConversationId, MessageId, UserId};
use crate::error::GatewayError;

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

/// Moderation state of a message or submission.
///
/// `pending → approved` or `pending → rejected`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Awaiting a verdict.
    Pending,
    /// Cleared for delivery.
    Approved,
    /// Blocked; never delivered.
    Rejected,
}

impl ModerationStatus {
    /// Returns `true` once the verdict is in.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A persisted, delivered message.
///
/// The conversation log is append-only: deletion sets `deleted` and
/// redacts the text on read, but the entry keeps its place so ordering and
/// cursors stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Message {
    /// Message identifier (also the sync cursor).
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// 1-based position in the conversation.
    pub seq: u64,
    /// Body; empty when the message is a tombstone.
    pub text: String,
    /// Server timestamp, non-decreasing within a conversation.
    pub created_at: DateTime<Utc>,
    /// Always [`ModerationStatus::Approved`] for logged messages.
    pub moderation_status: ModerationStatus,
    /// Tombstone flag.
    pub deleted: bool,
}

impl Message {
    /// Returns the client-facing rendering: tombstones lose their text.
    #[must_use]
    pub fn rendered(&self) -> Self {
        if self.deleted {
            Self {
                text: String::new(),
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }
}

/// Checks the length rules shared by the store and the moderation gate.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] if the text is blank or longer
/// than `max_chars` characters.
pub fn validate_text(text: &str, max_chars: usize) -> Result<(), GatewayError> {
    if text.trim().is_empty() {
        return Err(GatewayError::Validation(
            "message text must not be empty".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(GatewayError::Validation(format!(
            "message text is {len} characters; limit is {max_chars}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_invalid() {
        assert!(validate_text("  \n", 10).is_err());
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        assert!(validate_text(&text, 10).is_ok());
        assert!(validate_text(&text, 9).is_err());
    }

    #[test]
    fn tombstone_renders_without_text() {
        let msg = Message {
            id: MessageId::new(),
            conversation_id: ConversationId::new(),
            sender_id: UserId::new(),
            seq: 1,
            text: "secret".to_string(),
            created_at: Utc::now(),
            moderation_status: ModerationStatus::Approved,
            deleted: true,
        };
        let rendered = msg.rendered();
        assert!(rendered.text.is_empty());
        assert_eq!(rendered.id, msg.id);
    }

    #[test]
    fn pending_is_not_final() {
        assert!(!ModerationStatus::Pending.is_final());
        assert!(ModerationStatus::Rejected.is_final());
    }
}
