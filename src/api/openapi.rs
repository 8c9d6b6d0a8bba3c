//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{conversations, messages, swipes, system, users};
use crate::domain;
use crate::error::{ErrorBody, ErrorResponse};
use crate::service;

/// OpenAPI 3.1 description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "spark-gateway",
        description = "Matching, swiping and moderated chat over REST and WebSocket."
    ),
    paths(
        system::health_handler,
        system::policy_handler,
        users::register_user,
        users::get_user,
        users::update_user,
        users::list_candidates,
        users::list_unsure,
        users::get_cooldown,
        users::list_matches,
        users::list_conversations,
        users::get_strikes,
        swipes::swipe,
        messages::submit_message,
        messages::get_submission,
        conversations::list_messages,
        conversations::mark_read,
        conversations::delete_message,
        conversations::suggest,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        system::PolicyResponse,
        dto::RegisterUserRequest,
        dto::UserResponse,
        dto::SwipeRequest,
        dto::CooldownResponse,
        dto::SubmitMessageRequest,
        dto::MarkReadRequest,
        dto::MarkReadResponse,
        domain::Profile,
        domain::Preferences,
        domain::ProfileUpdate,
        domain::Location,
        domain::Sex,
        domain::InterestedIn,
        domain::SwipeDirection,
        domain::SwipeDecision,
        domain::PairKey,
        domain::Match,
        domain::Message,
        domain::ModerationStatus,
        domain::Submission,
        domain::ConversationSummary,
        service::SwipeOutcome,
        service::CandidateCard,
        service::StrikeStatus,
        service::MessagePage,
        service::Suggestion,
        service::SuggestionSource,
    )),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Users", description = "Registration, profiles and discovery"),
        (name = "Swipes", description = "Swipe admission and cooldowns"),
        (name = "Messages", description = "Moderated message submission"),
        (name = "Conversations", description = "History, read receipts and tips"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/swipe"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/messages"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert_eq!(paths.len(), 17);
    }
}
