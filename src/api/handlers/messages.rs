//! Message submission and submission status handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{SubmitMessageRequest, SubmitParams};
use crate::app_state::AppState;
use crate::domain::{ModerationStatus, Submission, SubmissionId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /messages` — Submit a message for moderation.
///
/// Without `?wait=true` the call returns `202 Accepted` as soon as the
/// message is staged. With it, the call blocks until the verdict and
/// returns `201 Created` for an approved message or `422` for a rejected
/// one.
///
/// # Errors
///
/// See the response table.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Submit a message",
    params(SubmitParams),
    request_body = SubmitMessageRequest,
    responses(
        (status = 201, description = "Approved and delivered (wait=true)", body = Submission),
        (status = 202, description = "Staged for moderation", body = Submission),
        (status = 400, description = "Empty or oversized text", body = ErrorResponse),
        (status = 403, description = "Sender banned or not a participant", body = ErrorResponse),
        (status = 404, description = "Unknown sender or conversation", body = ErrorResponse),
        (status = 422, description = "Rejected by moderation", body = ErrorResponse),
    )
)]
pub async fn submit_message(
    State(state): State<AppState>,
    Query(params): Query<SubmitParams>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let staged = state
        .moderation_gate
        .submit(req.conversation_id, req.sender_id, req.text, Utc::now())
        .await?;

    if !params.wait {
        return Ok((StatusCode::ACCEPTED, Json(staged)));
    }

    let done = state.moderation_gate.wait_for_verdict(staged.id).await?;
    match done.status {
        ModerationStatus::Approved => Ok((StatusCode::CREATED, Json(done))),
        ModerationStatus::Rejected => Err(GatewayError::ModerationRejected(
            done.rejection_reason.unwrap_or_default(),
        )),
        ModerationStatus::Pending => Ok((StatusCode::ACCEPTED, Json(done))),
    }
}

/// `GET /submissions/{id}` — Submission status.
///
/// # Errors
///
/// Returns [`GatewayError::SubmissionNotFound`] for unknown or expired ids.
#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}",
    tag = "Messages",
    summary = "Submission status",
    params(("id" = uuid::Uuid, Path, description = "Submission UUID")),
    responses(
        (status = 200, description = "Submission", body = Submission),
        (status = 404, description = "Unknown or expired submission", body = ErrorResponse),
    )
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let submission = state
        .moderation_gate
        .submission(SubmissionId::from(id))
        .await?;
    Ok(Json(submission))
}

/// Message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(submit_message))
        .route("/submissions/{id}", get(get_submission))
}
