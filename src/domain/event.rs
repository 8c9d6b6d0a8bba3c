//! Domain events reflecting matching and chat state changes.
//!
//! Every state change emits a [`DomainEvent`] through the
//! [`super::EventBus`]. Events are pushed to WebSocket subscribers and
//! optionally appended to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ConversationId, Message, MessageId, SubmissionId, SwipeDirection, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new user registered.
    UserRegistered {
        /// New user.
        user_id: UserId,
        /// Registration timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A swipe was accepted and recorded.
    SwipeRecorded {
        /// Who swiped.
        actor_id: UserId,
        /// Whose profile.
        target_id: UserId,
        /// Decision.
        direction: SwipeDirection,
        /// Whether this replaced an earlier unsure decision.
        redecision: bool,
        /// Decision timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Two users liked each other; a conversation now exists.
    MatchCreated {
        /// Conversation created with the match.
        conversation_id: ConversationId,
        /// Lower user id of the pair.
        user_a: UserId,
        /// Higher user id of the pair.
        user_b: UserId,
        /// Formation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An approved message was appended to a conversation.
    MessageCreated {
        /// The message as delivered.
        message: Message,
        /// Recipient of the message.
        recipient_id: UserId,
    },

    /// A message was tombstoned.
    MessageDeleted {
        /// Conversation.
        conversation_id: ConversationId,
        /// Deleted message.
        message_id: MessageId,
        /// Who deleted it (always the sender).
        sender_id: UserId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A participant advanced their read pointer.
    MessagesRead {
        /// Conversation.
        conversation_id: ConversationId,
        /// Reader.
        user_id: UserId,
        /// Last message read.
        up_to: MessageId,
        /// Unread count after the update.
        unread: u32,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A staged submission passed moderation and was delivered.
    SubmissionApproved {
        /// Submission.
        submission_id: SubmissionId,
        /// Conversation.
        conversation_id: ConversationId,
        /// Author.
        sender_id: UserId,
        /// The persisted message.
        message_id: MessageId,
        /// Verdict timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A submission was blocked by moderation (including timeouts).
    SubmissionRejected {
        /// Submission.
        submission_id: SubmissionId,
        /// Conversation.
        conversation_id: ConversationId,
        /// Author.
        sender_id: UserId,
        /// Why it was blocked.
        reason: String,
        /// Verdict timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A moderation strike was recorded against a user.
    StrikeRecorded {
        /// Offender.
        user_id: UserId,
        /// Strike total after this one.
        strikes: u32,
        /// Whether the user is now banned.
        banned: bool,
        /// Why the strike was issued.
        reason: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user_registered",
            Self::SwipeRecorded { .. } => "swipe_recorded",
            Self::MatchCreated { .. } => "match_created",
            Self::MessageCreated { .. } => "message_created",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::MessagesRead { .. } => "messages_read",
            Self::SubmissionApproved { .. } => "submission_approved",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::StrikeRecorded { .. } => "strike_recorded",
        }
    }

    /// Conversation the event belongs to, if any.
    #[must_use]
    pub const fn conversation_id(&self) -> Option<ConversationId> {
        match self {
            Self::MatchCreated {
                conversation_id, ..
            }
            | Self::MessageDeleted {
                conversation_id, ..
            }
            | Self::MessagesRead {
                conversation_id, ..
            }
            | Self::SubmissionApproved {
                conversation_id, ..
            }
            | Self::SubmissionRejected {
                conversation_id, ..
            } => Some(*conversation_id),
            Self::MessageCreated { message, .. } => Some(message.conversation_id),
            Self::UserRegistered { .. }
            | Self::SwipeRecorded { .. }
            | Self::StrikeRecorded { .. } => None,
        }
    }

    /// Users who should be notified of this event.
    ///
    /// A swipe is only visible to the actor; the target learns about it
    /// through a match, never directly.
    #[must_use]
    pub fn audience(&self) -> Vec<UserId> {
        match self {
            Self::UserRegistered { user_id, .. }
            | Self::MessagesRead { user_id, .. }
            | Self::StrikeRecorded { user_id, .. } => vec![*user_id],
            Self::SwipeRecorded { actor_id, .. } => vec![*actor_id],
            Self::MatchCreated { user_a, user_b, .. } => vec![*user_a, *user_b],
            Self::MessageCreated {
                message,
                recipient_id,
            } => vec![message.sender_id, *recipient_id],
            Self::MessageDeleted { sender_id, .. }
            | Self::SubmissionApproved { sender_id, .. }
            | Self::SubmissionRejected { sender_id, .. } => vec![*sender_id],
        }
    }

    /// Primary subject id used as the event-log key: the conversation when
    /// there is one, otherwise the first audience member.
    #[must_use]
    pub fn subject_id(&self) -> Option<uuid::Uuid> {
        self.conversation_id()
            .map(|c| *c.as_uuid())
            .or_else(|| self.audience().first().map(|u| *u.as_uuid()))
    }
}
