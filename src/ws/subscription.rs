//! Per-connection subscription manager.
//!
//! Tracks which users and conversations a WebSocket client follows and
//! filters bus events server-side.

use std::collections::HashSet;

use crate::domain::{ConversationId, DomainEvent, UserId};

/// Manages the subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    user_ids: HashSet<UserId>,
    conversation_ids: HashSet<ConversationId>,
    /// Wildcard `"*"`; the explicit sets are ignored while it is on.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds users and conversations to the filter.
    pub fn subscribe(&mut self, users: &[UserId], conversations: &[ConversationId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.user_ids.extend(users.iter().copied());
        self.conversation_ids.extend(conversations.iter().copied());
    }

    /// Removes users and conversations from the filter.
    pub fn unsubscribe(&mut self, users: &[UserId], conversations: &[ConversationId]) {
        for id in users {
            self.user_ids.remove(id);
        }
        for id in conversations {
            self.conversation_ids.remove(id);
        }
    }

    /// Returns `true` if the event should be forwarded: the wildcard is on,
    /// a followed user is in its audience, or it belongs to a followed
    /// conversation.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        if event
            .conversation_id()
            .is_some_and(|id| self.conversation_ids.contains(&id))
        {
            return true;
        }
        event.audience().iter().any(|u| self.user_ids.contains(u))
    }

    /// Number of explicit subscriptions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len() + self.conversation_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
