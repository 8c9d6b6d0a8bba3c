//! Conversation handlers: history, read receipts, deletion, tips.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{ActorParams, MarkReadRequest, MarkReadResponse, MessagesQuery};
use crate::app_state::AppState;
use crate::domain::{ConversationId, Message, MessageId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{MessagePage, Suggestion};

/// `GET /conversations/{id}/messages` — Page through history.
///
/// # Errors
///
/// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`],
/// or [`GatewayError::Validation`] for an unknown `since` cursor.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    tag = "Conversations",
    summary = "List messages",
    description = "Ascending by (created_at, seq). Pass the last id seen as `since` to resume; deleted messages appear with empty text.",
    params(("id" = uuid::Uuid, Path, description = "Conversation UUID"), MessagesQuery),
    responses(
        (status = 200, description = "Message page", body = MessagePage),
        (status = 400, description = "Unknown cursor", body = ErrorResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let page = state
        .chat_service
        .list_messages(
            ConversationId::from(id),
            query.user_id,
            query.since,
            query.limit,
        )
        .await?;
    Ok(Json(page))
}

/// `POST /conversations/{id}/read` — Advance the read pointer.
///
/// # Errors
///
/// [`GatewayError::ConversationNotFound`], [`GatewayError::NotParticipant`]
/// or [`GatewayError::MessageNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/read",
    tag = "Conversations",
    summary = "Mark messages read",
    params(("id" = uuid::Uuid, Path, description = "Conversation UUID")),
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Unread count after the update", body = MarkReadResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Conversation or message not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let conversation_id = ConversationId::from(id);
    let unread = state
        .chat_service
        .mark_read(conversation_id, req.user_id, req.up_to)
        .await?;
    Ok(Json(MarkReadResponse {
        conversation_id,
        unread,
    }))
}

/// `DELETE /conversations/{id}/messages/{message_id}` — Tombstone a message.
///
/// # Errors
///
/// [`GatewayError::NotParticipant`] unless the caller sent the message.
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{id}/messages/{message_id}",
    tag = "Conversations",
    summary = "Delete a message",
    description = "Only the sender may delete. The entry keeps its place in the log with its text removed; deleting twice is a no-op.",
    params(
        ("id" = uuid::Uuid, Path, description = "Conversation UUID"),
        ("message_id" = uuid::Uuid, Path, description = "Message UUID"),
        ActorParams,
    ),
    responses(
        (status = 200, description = "Tombstoned message", body = Message),
        (status = 403, description = "Not the sender", body = ErrorResponse),
        (status = 404, description = "Conversation or message not found", body = ErrorResponse),
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Query(actor): Query<ActorParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = state
        .chat_service
        .delete_message(
            ConversationId::from(id),
            actor.user_id,
            MessageId::from(message_id),
        )
        .await?;
    Ok(Json(message))
}

/// `GET /conversations/{id}/suggestion` — Conversation tip.
///
/// # Errors
///
/// [`GatewayError::ConversationNotFound`] or [`GatewayError::NotParticipant`].
/// Generator outages are absorbed by the local fallback.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/suggestion",
    tag = "Conversations",
    summary = "Suggest what to say",
    params(("id" = uuid::Uuid, Path, description = "Conversation UUID"), ActorParams),
    responses(
        (status = 200, description = "Suggestion", body = Suggestion),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn suggest(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(actor): Query<ActorParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let suggestion = state
        .suggestion_service
        .suggest(ConversationId::from(id), actor.user_id)
        .await?;
    Ok(Json(suggestion))
}

/// Conversation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations/{id}/messages", get(list_messages))
        .route("/conversations/{id}/read", post(mark_read))
        .route(
            "/conversations/{id}/messages/{message_id}",
            delete(delete_message),
        )
        .route("/conversations/{id}/suggestion", get(suggest))
}
