//! Conversation tips with a bounded wait and a local fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use super::chat_service::ChatService;
use crate::domain::{ConversationId, UserDirectory, UserId};
use crate::error::GatewayError;
use crate::suggestion::{
    InterestTips, Speaker, SuggestionContext, SuggestionGenerator, TranscriptLine,
};

/// Number of trailing messages handed to the generator.
const TRANSCRIPT_WINDOW: usize = 10;

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// The configured generator answered in time.
    Generator,
    /// Local tips were used instead.
    Fallback,
}

/// A suggestion for one participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Suggestion {
    /// Suggested text.
    pub text: String,
    /// Origin of the text.
    pub source: SuggestionSource,
}

/// Produces conversation tips. Never touches message delivery.
#[derive(Debug, Clone)]
pub struct SuggestionService {
    generator: Arc<dyn SuggestionGenerator>,
    chat: ChatService,
    directory: Arc<UserDirectory>,
    timeout: Duration,
}

impl SuggestionService {
    /// Creates a new `SuggestionService`.
    #[must_use]
    pub fn new(
        generator: Arc<dyn SuggestionGenerator>,
        chat: ChatService,
        directory: Arc<UserDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            chat,
            directory,
            timeout,
        }
    }

    /// Suggests what `viewer` could say next in the conversation.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`]
    /// or [`GatewayError::UserNotFound`]. Generator failures never surface;
    /// they fall back to local tips.
    pub async fn suggest(
        &self,
        conversation_id: ConversationId,
        viewer: UserId,
    ) -> Result<Suggestion, GatewayError> {
        let context = self.context(conversation_id, viewer).await?;

        match tokio::time::timeout(self.timeout, self.generator.generate(&context)).await {
            Ok(Ok(text)) => Ok(Suggestion {
                text,
                source: SuggestionSource::Generator,
            }),
            Ok(Err(err)) => {
                tracing::warn!(%conversation_id, error = %err, "suggestion generator failed");
                Ok(Self::fallback(&context))
            }
            Err(_) => {
                tracing::warn!(%conversation_id, timeout = ?self.timeout, "suggestion generator timed out");
                Ok(Self::fallback(&context))
            }
        }
    }

    fn fallback(context: &SuggestionContext) -> Suggestion {
        Suggestion {
            text: InterestTips::tip(context),
            source: SuggestionSource::Fallback,
        }
    }

    async fn context(
        &self,
        conversation_id: ConversationId,
        viewer: UserId,
    ) -> Result<SuggestionContext, GatewayError> {
        let mut feed = self.chat.open_feed(conversation_id, viewer, None).await?;
        let messages = feed.collect_remaining().await;

        let participants = self.chat.store().participants(conversation_id).await?;
        let other = participants
            .other(viewer)
            .ok_or(GatewayError::NotParticipant {
                user_id: *viewer.as_uuid(),
                conversation_id: *conversation_id.as_uuid(),
            })?;
        let me = self.directory.snapshot(viewer).await?;
        let them = self.directory.snapshot(other).await?;

        let visible: Vec<_> = messages.iter().filter(|m| !m.deleted).collect();
        let recent = visible
            .iter()
            .skip(visible.len().saturating_sub(TRANSCRIPT_WINDOW))
            .map(|m| TranscriptLine {
                speaker: if m.sender_id == viewer {
                    Speaker::Me
                } else {
                    Speaker::Them
                },
                text: m.text.clone(),
            })
            .collect();

        Ok(SuggestionContext {
            shared_interests: me.profile.shared_interests(&them.profile),
            my_name: me.profile.name,
            their_name: them.profile.name,
            their_interests: them.profile.interests,
            their_bio: them.profile.bio,
            recent,
        })
    }
}
