//! Conversation aggregate: the ordered message log of one match.
//!
//! A [`Conversation`] owns its messages, the id→position index used to
//! resolve sync cursors, and per-participant read state. All mutation goes
//! through `&mut self`, so the store's per-conversation write lock is the
//! only serialization point needed for a total order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::message::{self, Message, ModerationStatus};
use super::{ConversationId, MessageId, PairKey, UserId};
use crate::error::GatewayError;

/// Chat-list entry for one participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub conversation_id: ConversationId,
    /// The other participant.
    pub other_user_id: UserId,
    /// Creation timestamp (equals the match timestamp).
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest message, if any.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Latest message, rendered.
    pub last_message: Option<Message>,
    /// Messages from the other participant not yet read.
    pub unread: u32,
}

/// One conversation and its message log.
#[derive(Debug)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// The two participants.
    pub participants: PairKey,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest append.
    pub last_message_at: Option<DateTime<Utc>>,
    messages: Vec<Message>,
    positions: HashMap<MessageId, usize>,
    unread: HashMap<UserId, u32>,
    read_seq: HashMap<UserId, u64>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[must_use]
    pub fn new(id: ConversationId, participants: PairKey, now: DateTime<Utc>) -> Self {
        Self {
            id,
            participants,
            created_at: now,
            last_message_at: None,
            messages: Vec::new(),
            positions: HashMap::new(),
            unread: HashMap::new(),
            read_seq: HashMap::new(),
        }
    }

    /// Number of messages, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been sent yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Fails with [`GatewayError::NotParticipant`] unless `user` is in the
    /// conversation.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_participant(&self, user: UserId) -> Result<(), GatewayError> {
        if self.participants.contains(user) {
            Ok(())
        } else {
            Err(GatewayError::NotParticipant {
                user_id: *user.as_uuid(),
                conversation_id: *self.id.as_uuid(),
            })
        }
    }

    /// Appends an approved message.
    ///
    /// `created_at` is clamped to the previous message's timestamp so that
    /// `(created_at, seq)` never decreases even if the caller's clock does.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotParticipant`] for outsiders,
    /// [`GatewayError::Validation`] for blank or oversized text.
    pub fn append(
        &mut self,
        sender: UserId,
        text: String,
        max_chars: usize,
        now: DateTime<Utc>,
    ) -> Result<Message, GatewayError> {
        self.ensure_participant(sender)?;
        message::validate_text(&text, max_chars)?;

        let created_at = self
            .messages
            .last()
            .map_or(now, |last| last.created_at.max(now));
        let seq = self.next_seq();
        let msg = Message {
            id: MessageId::new(),
            conversation_id: self.id,
            sender_id: sender,
            seq,
            text,
            created_at,
            moderation_status: ModerationStatus::Approved,
            deleted: false,
        };

        self.positions.insert(msg.id, self.messages.len());
        self.messages.push(msg.clone());
        self.last_message_at = Some(created_at);
        if let Some(recipient) = self.participants.other(sender) {
            let counter = self.unread.entry(recipient).or_insert(0);
            *counter = counter.saturating_add(1);
        }
        Ok(msg)
    }

    /// Index of the first message strictly after `cursor` (`0` without one).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the cursor does not belong to
    /// this conversation.
    pub fn position_after(&self, cursor: Option<MessageId>) -> Result<usize, GatewayError> {
        match cursor {
            None => Ok(0),
            Some(id) => self
                .positions
                .get(&id)
                .map(|pos| pos.saturating_add(1))
                .ok_or_else(|| {
                    GatewayError::Validation(format!(
                        "cursor {id} is not a message of conversation {}",
                        self.id
                    ))
                }),
        }
    }

    /// Rendered messages starting at `start`, at most `limit` of them.
    #[must_use]
    pub fn page(&self, start: usize, limit: usize) -> Vec<Message> {
        self.messages
            .iter()
            .skip(start)
            .take(limit)
            .map(Message::rendered)
            .collect()
    }

    /// Moves `user`'s read pointer up to `up_to` and returns the new unread
    /// count. The pointer never moves backwards.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotParticipant`] for outsiders,
    /// [`GatewayError::MessageNotFound`] for an unknown message.
    pub fn mark_read(&mut self, user: UserId, up_to: MessageId) -> Result<u32, GatewayError> {
        self.ensure_participant(user)?;
        let seq = self
            .positions
            .get(&up_to)
            .and_then(|pos| self.messages.get(*pos))
            .map(|m| m.seq)
            .ok_or(GatewayError::MessageNotFound(*up_to.as_uuid()))?;

        let read = self.read_seq.entry(user).or_insert(0);
        *read = (*read).max(seq);
        let read = *read;

        let remaining = self
            .messages
            .iter()
            .rev()
            .take_while(|m| m.seq > read)
            .filter(|m| m.sender_id != user)
            .count();
        let remaining = u32::try_from(remaining).unwrap_or(u32::MAX);
        self.unread.insert(user, remaining);
        Ok(remaining)
    }

    /// Tombstones a message. Only the sender may delete; deleting twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MessageNotFound`] if the message is unknown,
    /// [`GatewayError::NotParticipant`] if `requester` is not its sender.
    pub fn tombstone(
        &mut self,
        requester: UserId,
        message_id: MessageId,
    ) -> Result<Message, GatewayError> {
        let conversation_id = self.id;
        let msg = self
            .positions
            .get(&message_id)
            .copied()
            .and_then(|pos| self.messages.get_mut(pos))
            .ok_or(GatewayError::MessageNotFound(*message_id.as_uuid()))?;
        if msg.sender_id != requester {
            return Err(GatewayError::NotParticipant {
                user_id: *requester.as_uuid(),
                conversation_id: *conversation_id.as_uuid(),
            });
        }
        msg.deleted = true;
        Ok(msg.rendered())
    }

    /// Unread count for a participant.
    #[must_use]
    pub fn unread_for(&self, user: UserId) -> u32 {
        self.unread.get(&user).copied().unwrap_or(0)
    }

    /// Chat-list entry as seen by `user`, or `None` for outsiders.
    #[must_use]
    pub fn summary_for(&self, user: UserId) -> Option<ConversationSummary> {
        let other_user_id = self.participants.other(user)?;
        Some(ConversationSummary {
            conversation_id: self.id,
            other_user_id,
            created_at: self.created_at,
            last_message_at: self.last_message_at,
            last_message: self.messages.last().map(Message::rendered),
            unread: self.unread_for(user),
        })
    }

    fn next_seq(&self) -> u64 {
        u64::try_from(self.messages.len())
            .unwrap_or(u64::MAX)
            .saturating_add(1)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn setup() -> (Conversation, UserId, UserId) {
        let a = UserId::new();
        let b = UserId::new();
        let conv = Conversation::new(ConversationId::new(), PairKey::new(a, b), Utc::now());
        (conv, a, b)
    }

    fn send(conv: &mut Conversation, from: UserId, text: &str) -> Message {
        let Ok(msg) = conv.append(from, text.to_string(), 1000, Utc::now()) else {
            panic!("append failed");
        };
        msg
    }

    #[test]
    fn append_assigns_increasing_seq() {
        let (mut conv, a, b) = setup();
        let m1 = send(&mut conv, a, "hi");
        let m2 = send(&mut conv, b, "hey");
        assert_eq!(m1.seq, 1);
        assert_eq!(m2.seq, 2);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn created_at_never_goes_backwards() {
        let (mut conv, a, b) = setup();
        let now = Utc::now();
        let Ok(first) = conv.append(a, "one".to_string(), 1000, now) else {
            panic!("append failed");
        };
        let earlier = now - chrono::Duration::seconds(5);
        let Ok(second) = conv.append(b, "two".to_string(), 1000, earlier) else {
            panic!("append failed");
        };
        assert!(second.created_at >= first.created_at);
        assert!(second.seq > first.seq);
    }

    #[test]
    fn outsider_cannot_append() {
        let (mut conv, _, _) = setup();
        let result = conv.append(UserId::new(), "hi".to_string(), 1000, Utc::now());
        assert!(matches!(result, Err(GatewayError::NotParticipant { .. })));
    }

    #[test]
    fn unread_increments_for_recipient_only() {
        let (mut conv, a, b) = setup();
        send(&mut conv, a, "1");
        send(&mut conv, a, "2");
        assert_eq!(conv.unread_for(b), 2);
        assert_eq!(conv.unread_for(a), 0);
    }

    #[test]
    fn mark_read_through_latest_resets_to_zero() {
        let (mut conv, a, b) = setup();
        send(&mut conv, a, "1");
        let last = send(&mut conv, a, "2");
        assert_eq!(conv.mark_read(b, last.id).ok(), Some(0));
        assert_eq!(conv.unread_for(b), 0);
    }

    #[test]
    fn mark_read_partially_and_never_backwards() {
        let (mut conv, a, b) = setup();
        let first = send(&mut conv, a, "1");
        let second = send(&mut conv, a, "2");
        send(&mut conv, a, "3");
        assert_eq!(conv.mark_read(b, second.id).ok(), Some(1));
        // Moving the pointer back does not resurrect read messages.
        assert_eq!(conv.mark_read(b, first.id).ok(), Some(1));
    }

    #[test]
    fn cursor_resumes_after_message() {
        let (mut conv, a, _) = setup();
        let m1 = send(&mut conv, a, "1");
        send(&mut conv, a, "2");
        let Ok(start) = conv.position_after(Some(m1.id)) else {
            panic!("cursor should resolve");
        };
        let page = conv.page(start, 10);
        assert_eq!(page.len(), 1);
        assert_eq!(page.first().map(|m| m.seq), Some(2));
    }

    #[test]
    fn unknown_cursor_is_rejected() {
        let (conv, _, _) = setup();
        assert!(conv.position_after(Some(MessageId::new())).is_err());
    }

    #[test]
    fn tombstone_keeps_position() {
        let (mut conv, a, b) = setup();
        let m1 = send(&mut conv, a, "oops");
        send(&mut conv, b, "reply");
        assert!(conv.tombstone(a, m1.id).is_ok());
        let page = conv.page(0, 10);
        assert_eq!(page.len(), 2);
        let Some(first) = page.first() else {
            panic!("missing first message");
        };
        assert!(first.deleted);
        assert!(first.text.is_empty());
        assert_eq!(first.seq, 1);
    }

    #[test]
    fn only_sender_can_tombstone() {
        let (mut conv, a, b) = setup();
        let m1 = send(&mut conv, a, "mine");
        assert!(conv.tombstone(b, m1.id).is_err());
    }

    #[test]
    fn summary_shows_other_user() {
        let (mut conv, a, b) = setup();
        send(&mut conv, a, "hello");
        let Some(summary) = conv.summary_for(b) else {
            panic!("b is a participant");
        };
        assert_eq!(summary.other_user_id, a);
        assert_eq!(summary.unread, 1);
        assert!(conv.summary_for(UserId::new()).is_none());
    }
}
