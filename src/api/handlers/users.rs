//! User handlers: registration, profile, deck, and per-user listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{CooldownResponse, LimitParams, RegisterUserRequest, UserResponse};
use crate::app_state::AppState;
use crate::domain::{ConversationSummary, Match, ProfileUpdate, SwipeDecision, UserId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{CandidateCard, StrikeStatus};

/// `POST /users` — Register a user.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for an invalid profile.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Register a user",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid profile or preferences", body = ErrorResponse),
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = state
        .profile_service
        .register(req.profile, req.preferences.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// `GET /users/{id}` — Fetch a user.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Get a user",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = state.profile_service.get_profile(UserId::from(id)).await?;
    Ok(Json(UserResponse::from(user)))
}

/// `PATCH /users/{id}` — Partially update a profile.
///
/// # Errors
///
/// [`GatewayError::UserNotFound`] or [`GatewayError::Validation`].
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Update a profile",
    description = "Absent fields are left unchanged; `null` clears `bio` and `location`. The merged profile is validated before anything is written.",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = state
        .profile_service
        .update_profile(UserId::from(id), update)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// `GET /users/{id}/candidates` — Discovery deck.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown viewer.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/candidates",
    tag = "Users",
    summary = "Discovery deck",
    description = "Active users passing the viewer's age, sex and distance preferences that the viewer has not liked or passed yet, nearest first.",
    params(("id" = uuid::Uuid, Path, description = "Viewer UUID"), LimitParams),
    responses(
        (status = 200, description = "Candidates", body = Vec<CandidateCard>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_candidates(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let deck = state
        .profile_service
        .candidates(UserId::from(id), params.clamped())
        .await?;
    Ok(Json(deck))
}

/// `GET /users/{id}/swipes/unsure` — Decisions left unsure.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/swipes/unsure",
    tag = "Swipes",
    summary = "Unsure decisions",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Unsure decisions, oldest first", body = Vec<SwipeDecision>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_unsure(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let decisions = state
        .swipe_service
        .unsure_decisions(UserId::from(id))
        .await?;
    Ok(Json(decisions))
}

/// `GET /users/{id}/cooldown` — Swipe cooldown state.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/cooldown",
    tag = "Swipes",
    summary = "Swipe cooldown",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Cooldown state", body = CooldownResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_cooldown(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = UserId::from(id);
    let next_eligible_at = state.swipe_service.cooldown(user_id, Utc::now()).await?;
    Ok(Json(CooldownResponse {
        user_id,
        can_swipe: next_eligible_at.is_none(),
        next_eligible_at,
    }))
}

/// `GET /users/{id}/matches` — Matches, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/matches",
    tag = "Users",
    summary = "Matches",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Matches", body = Vec<Match>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = UserId::from(id);
    let _ = state.profile_service.get_profile(user_id).await?;
    let matches = state
        .swipe_service
        .match_engine()
        .matches_for(user_id)
        .await;
    Ok(Json(matches))
}

/// `GET /users/{id}/conversations` — Chat list.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/conversations",
    tag = "Conversations",
    summary = "Chat list",
    description = "Conversations with last message and unread count, most recent activity first.",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Conversations", body = Vec<ConversationSummary>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let summaries = state
        .chat_service
        .conversations_for(UserId::from(id))
        .await?;
    Ok(Json(summaries))
}

/// `GET /users/{id}/strikes` — Moderation standing.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] for an unknown user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/strikes",
    tag = "Users",
    summary = "Strike status",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Strikes and ban flag", body = StrikeStatus),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_strikes(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let status = state.strike_ledger.status(UserId::from(id)).await?;
    Ok(Json(status))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{id}", get(get_user).patch(update_user))
        .route("/users/{id}/candidates", get(list_candidates))
        .route("/users/{id}/swipes/unsure", get(list_unsure))
        .route("/users/{id}/cooldown", get(get_cooldown))
        .route("/users/{id}/matches", get(list_matches))
        .route("/users/{id}/conversations", get(list_conversations))
        .route("/users/{id}/strikes", get(get_strikes))
}
