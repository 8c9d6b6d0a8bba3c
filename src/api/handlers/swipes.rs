//! Swipe handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::SwipeRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::SwipeOutcome;

/// `POST /swipe` — Like, pass, or mark a profile unsure.
///
/// # Errors
///
/// [`GatewayError::Validation`] (self-swipe), [`GatewayError::UserNotFound`],
/// [`GatewayError::Banned`] or [`GatewayError::Cooldown`].
#[utoipa::path(
    post,
    path = "/api/v1/swipe",
    tag = "Swipes",
    summary = "Swipe on a profile",
    description = "Accepted at most once per cooldown window. A repeat swipe on an already decided profile returns the prior decision with `duplicate = true`. A like that completes a mutual pair returns the new match.",
    request_body = SwipeRequest,
    responses(
        (status = 200, description = "Swipe outcome", body = SwipeOutcome),
        (status = 400, description = "Self-swipe", body = ErrorResponse),
        (status = 403, description = "Actor is banned", body = ErrorResponse),
        (status = 404, description = "Unknown actor or target", body = ErrorResponse),
        (status = 429, description = "Cooldown active; see Retry-After", body = ErrorResponse),
    )
)]
pub async fn swipe(
    State(state): State<AppState>,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state
        .swipe_service
        .attempt_swipe(req.actor_id, req.target_id, req.direction, Utc::now())
        .await?;
    Ok(Json(outcome))
}

/// Swipe routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/swipe", post(swipe))
}
