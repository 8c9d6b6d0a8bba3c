//! Chat service: participant-checked access to conversations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    ConversationId, ConversationStore, ConversationSummary, DomainEvent, EventBus, Message,
    MessageFeed, MessageId, UserDirectory, UserId,
};
use crate::error::GatewayError;

/// Upper bound for one page of messages.
pub const MAX_PAGE_SIZE: usize = 200;

/// One page of a conversation's log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessagePage {
    /// Messages in ascending `(created_at, seq)` order.
    pub messages: Vec<Message>,
    /// Cursor to pass as `since` for the next page.
    pub next_cursor: Option<MessageId>,
    /// Whether more messages follow this page.
    pub has_more: bool,
}

/// Wraps the [`ConversationStore`] with access checks and event emission.
#[derive(Debug, Clone)]
pub struct ChatService {
    conversations: Arc<ConversationStore>,
    directory: Arc<UserDirectory>,
    event_bus: EventBus,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(
        conversations: Arc<ConversationStore>,
        directory: Arc<UserDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            conversations,
            directory,
            event_bus,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    async fn ensure_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<(), GatewayError> {
        let participants = self.conversations.participants(conversation_id).await?;
        if participants.contains(user_id) {
            Ok(())
        } else {
            Err(GatewayError::NotParticipant {
                user_id: *user_id.as_uuid(),
                conversation_id: *conversation_id.as_uuid(),
            })
        }
    }

    /// Appends an approved message and notifies both participants.
    ///
    /// # Errors
    ///
    /// Propagates the store's errors.
    pub async fn deliver(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Message, GatewayError> {
        let message = self
            .conversations
            .append_message(conversation_id, sender_id, text, now)
            .await?;
        let participants = self.conversations.participants(conversation_id).await?;
        if let Some(recipient_id) = participants.other(sender_id) {
            let _ = self.event_bus.publish(DomainEvent::MessageCreated {
                message: message.clone(),
                recipient_id,
            });
        }
        tracing::debug!(%conversation_id, message_id = %message.id, seq = message.seq, "message delivered");
        Ok(message)
    }

    /// Opens a lazy feed of messages after `since` for a participant.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`]
    /// or [`GatewayError::Validation`] for an unknown cursor.
    pub async fn open_feed(
        &self,
        conversation_id: ConversationId,
        viewer: UserId,
        since: Option<MessageId>,
    ) -> Result<MessageFeed, GatewayError> {
        self.ensure_participant(conversation_id, viewer).await?;
        self.conversations.list_messages(conversation_id, since).await
    }

    /// Returns one page of messages after `since`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open_feed`].
    pub async fn list_messages(
        &self,
        conversation_id: ConversationId,
        viewer: UserId,
        since: Option<MessageId>,
        limit: usize,
    ) -> Result<MessagePage, GatewayError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut feed = self.open_feed(conversation_id, viewer, since).await?;
        let messages = feed.next_page(limit).await;
        let has_more = !feed.next_page(1).await.is_empty();
        let next_cursor = messages.last().map(|m| m.id).or(since);
        Ok(MessagePage {
            messages,
            next_cursor,
            has_more,
        })
    }

    /// Marks messages read up to `up_to`; returns the new unread count.
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
        let unread = self
            .conversations
            .mark_read(conversation_id, user_id, up_to)
            .await?;
        let _ = self.event_bus.publish(DomainEvent::MessagesRead {
            conversation_id,
            user_id,
            up_to,
            unread,
            timestamp: Utc::now(),
        });
        Ok(unread)
    }

    /// Tombstones a message sent by `requester`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::MessageNotFound`]
    /// or [`GatewayError::NotParticipant`] for anyone but the sender.
    pub async fn delete_message(
        &self,
        conversation_id: ConversationId,
        requester: UserId,
        message_id: MessageId,
    ) -> Result<Message, GatewayError> {
        let message = self
            .conversations
            .delete_message(conversation_id, requester, message_id)
            .await?;
        let _ = self.event_bus.publish(DomainEvent::MessageDeleted {
            conversation_id,
            message_id,
            sender_id: requester,
            timestamp: Utc::now(),
        });
        tracing::debug!(%conversation_id, %message_id, "message deleted");
        Ok(message)
    }

    /// Chat list of a user, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for an unknown user.
    pub async fn conversations_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationSummary>, GatewayError> {
        let _ = self.directory.get(user_id).await?;
        Ok(self.conversations.conversations_for(user_id).await)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PairKey;

    async fn setup() -> (ChatService, ConversationId, UserId, UserId, EventBus) {
        let bus = EventBus::new(64);
        let store = Arc::new(ConversationStore::new(1000));
        let service = ChatService::new(
            Arc::clone(&store),
            Arc::new(UserDirectory::new()),
            bus.clone(),
        );
        let a = UserId::new();
        let b = UserId::new();
        let id = store.create(PairKey::new(a, b), Utc::now()).await;
        (service, id, a, b, bus)
    }

    #[tokio::test]
    async fn outsider_cannot_read() {
        let (svc, id, _a, _b, _bus) = setup().await;
        let result = svc.list_messages(id, UserId::new(), None, 50).await;
        assert!(matches!(result, Err(GatewayError::NotParticipant { .. })));
    }

    #[tokio::test]
    async fn paging_with_cursor() {
        let (svc, id, a, b, _bus) = setup().await;
        for i in 0..5 {
            let sender = if i % 2 == 0 { a } else { b };
            let _ = svc.deliver(id, sender, format!("m{i}"), Utc::now()).await;
        }
        let Ok(first) = svc.list_messages(id, a, None, 3).await else {
            panic!("page");
        };
        assert_eq!(first.messages.len(), 3);
        assert!(first.has_more);

        let Ok(second) = svc.list_messages(id, b, first.next_cursor, 3).await else {
            panic!("page");
        };
        let texts: Vec<&str> = second.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4"]);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn deliver_notifies_recipient() {
        let (svc, id, a, b, bus) = setup().await;
        let mut rx = bus.subscribe();
        let _ = svc.deliver(id, a, "hello".to_string(), Utc::now()).await;
        let Ok(DomainEvent::MessageCreated { recipient_id, message }) = rx.recv().await else {
            panic!("expected message event");
        };
        assert_eq!(recipient_id, b);
        assert_eq!(message.text, "hello");
    }

    #[tokio::test]
    async fn read_resets_unread_and_delete_tombstones() {
        let (svc, id, a, b, _bus) = setup().await;
        let Ok(first) = svc.deliver(id, a, "one".to_string(), Utc::now()).await else {
            panic!("deliver");
        };
        let Ok(second) = svc.deliver(id, a, "two".to_string(), Utc::now()).await else {
            panic!("deliver");
        };

        assert_eq!(svc.mark_read(id, b, first.id).await.ok(), Some(1));
        assert_eq!(svc.mark_read(id, b, second.id).await.ok(), Some(0));

        let denied = svc.delete_message(id, b, first.id).await;
        assert!(matches!(denied, Err(GatewayError::NotParticipant { .. })));
        let Ok(deleted) = svc.delete_message(id, a, first.id).await else {
            panic!("sender may delete");
        };
        assert!(deleted.deleted);
        assert!(deleted.text.is_empty());

        let Ok(page) = svc.list_messages(id, b, None, 10).await else {
            panic!("page");
        };
        assert_eq!(page.messages.len(), 2);
        assert!(page.messages.first().is_some_and(|m| m.deleted));
    }
}
