//! Outgoing messages staged for moderation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ConversationId, MessageId, ModerationStatus, SubmissionId, UserId};

/// A message waiting for, or finished with, its moderation verdict.
///
/// Only approved submissions reach the conversation log; the submission
/// keeps the id of the message it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Submission {
    /// Submission identifier.
    pub id: SubmissionId,
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// Submitted text.
    pub text: String,
    /// Moderation state.
    pub status: ModerationStatus,
    /// Delivered message, once approved.
    pub message_id: Option<MessageId>,
    /// Why the submission was blocked, once rejected.
    pub rejection_reason: Option<String>,
    /// When the sender submitted.
    pub submitted_at: DateTime<Utc>,
    /// When the verdict landed.
    pub decided_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Stages a pending submission.
    #[must_use]
    pub fn pending(
        conversation_id: ConversationId,
        sender_id: UserId,
        text: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            conversation_id,
            sender_id,
            text,
            status: ModerationStatus::Pending,
            message_id: None,
            rejection_reason: None,
            submitted_at: now,
            decided_at: None,
        }
    }

    /// Marks the submission delivered as `message_id`.
    pub fn approve(&mut self, message_id: MessageId, now: DateTime<Utc>) {
        self.status = ModerationStatus::Approved;
        self.message_id = Some(message_id);
        self.decided_at = Some(now);
    }

    /// Marks the submission blocked.
    pub fn reject(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = ModerationStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.decided_at = Some(now);
    }

    /// Returns `true` once a verdict was recorded.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.status.is_final()
    }
}
