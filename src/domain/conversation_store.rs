//! Concurrent conversation storage and lazy message feeds.
//!
//! Conversations live in a `RwLock<HashMap<...>>` with a per-conversation
//! [`tokio::sync::RwLock`]. Appends only need per-conversation ordering, so
//! two conversations never contend, and concurrent appends to the same
//! conversation are serialized by its write lock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::Stream;
use tokio::sync::RwLock;

use super::conversation::{Conversation, ConversationSummary};
use super::{ConversationId, Message, MessageId, PairKey, UserId};
use crate::error::GatewayError;

/// Central store for all conversations.
#[derive(Debug)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<ConversationId, Arc<RwLock<Conversation>>>>,
    max_message_chars: usize,
}

impl ConversationStore {
    /// Creates an empty store enforcing the given message length limit.
    #[must_use]
    pub fn new(max_message_chars: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_message_chars,
        }
    }

    /// Message length limit in characters.
    #[must_use]
    pub const fn max_message_chars(&self) -> usize {
        self.max_message_chars
    }

    /// Creates the conversation for a new match.
    pub async fn create(&self, participants: PairKey, now: DateTime<Utc>) -> ConversationId {
        let id = ConversationId::new();
        let conversation = Conversation::new(id, participants, now);
        self.conversations
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(conversation)));
        id
    }

    /// Returns the per-conversation lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConversationNotFound`] if it does not exist.
    pub async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Arc<RwLock<Conversation>>, GatewayError> {
        let map = self.conversations.read().await;
        map.get(&conversation_id)
            .cloned()
            .ok_or(GatewayError::ConversationNotFound(*conversation_id.as_uuid()))
    }

    /// Returns the participants of a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConversationNotFound`] if it does not exist.
    pub async fn participants(
        &self,
        conversation_id: ConversationId,
    ) -> Result<PairKey, GatewayError> {
        let lock = self.get(conversation_id).await?;
        let participants = lock.read().await.participants;
        Ok(participants)
    }

    /// Appends an approved message.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`]
    /// or [`GatewayError::Validation`].
    pub async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Message, GatewayError> {
        let lock = self.get(conversation_id).await?;
        let mut conversation = lock.write().await;
        conversation.append(sender_id, text, self.max_message_chars, now)
    }

    /// Opens a lazy, ascending feed of messages after `since`.
    ///
    /// The feed resolves the cursor eagerly (so a bad cursor fails here) but
    /// reads messages only as they are pulled. Messages appended after the
    /// feed was opened are picked up too.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`] or [`GatewayError::Validation`]
    /// for a cursor that is not in this conversation.
    pub async fn list_messages(
        &self,
        conversation_id: ConversationId,
        since: Option<MessageId>,
    ) -> Result<MessageFeed, GatewayError> {
        let lock = self.get(conversation_id).await?;
        let position = lock.read().await.position_after(since)?;
        Ok(MessageFeed {
            conversation: lock,
            position,
        })
    }

    /// Advances a participant's read pointer; returns the new unread count.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`]
    /// or [`GatewayError::MessageNotFound`].
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        up_to: MessageId,
    ) -> Result<u32, GatewayError> {
        let lock = self.get(conversation_id).await?;
        let mut conversation = lock.write().await;
        conversation.mark_read(user_id, up_to)
    }

    /// Tombstones a message.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::MessageNotFound`]
    /// or [`GatewayError::NotParticipant`].
    pub async fn delete_message(
        &self,
        conversation_id: ConversationId,
        requester: UserId,
        message_id: MessageId,
    ) -> Result<Message, GatewayError> {
        let lock = self.get(conversation_id).await?;
        let mut conversation = lock.write().await;
        conversation.tombstone(requester, message_id)
    }

    /// Chat list for a user, most recent activity first.
    pub async fn conversations_for(&self, user_id: UserId) -> Vec<ConversationSummary> {
        let locks: Vec<Arc<RwLock<Conversation>>> =
            self.conversations.read().await.values().cloned().collect();
        let mut summaries = Vec::new();
        for lock in locks {
            if let Some(summary) = lock.read().await.summary_for(user_id) {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| {
            let a_key = a.last_message_at.unwrap_or(a.created_at);
            let b_key = b.last_message_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key)
        });
        summaries
    }

    /// Returns the number of conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Returns `true` if there are no conversations.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

/// Lazy, restartable, ascending view over one conversation's log.
///
/// Holds only the conversation handle and a position; each pull takes the
/// read lock briefly. To restart after a disconnect, reopen the feed with the
/// last message id seen as the cursor.
#[derive(Debug)]
pub struct MessageFeed {
    conversation: Arc<RwLock<Conversation>>,
    position: usize,
}

impl MessageFeed {
    /// Pulls up to `limit` further messages.
    pub async fn next_page(&mut self, limit: usize) -> Vec<Message> {
        let page = self.conversation.read().await.page(self.position, limit);
        self.position = self.position.saturating_add(page.len());
        page
    }

    /// Pulls every remaining message.
    pub async fn collect_remaining(&mut self) -> Vec<Message> {
        self.next_page(usize::MAX).await
    }

    /// Converts the feed into a message-at-a-time [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Message> {
        futures_util::stream::unfold(self, |mut feed| async move {
            let mut page = feed.next_page(1).await;
            page.pop().map(|msg| (msg, feed))
        })
    }
}
