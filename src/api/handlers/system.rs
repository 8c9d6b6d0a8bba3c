//! System endpoints: health check and effective policy.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    ws_subscribers: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of live event subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ws_subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// Effective matching and chat policy.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyResponse {
    swipe_cooldown_secs: u64,
    ban_threshold: u32,
    max_message_chars: usize,
    banned_pattern_count: usize,
    moderation_timeout_ms: u64,
    suggestion_timeout_ms: u64,
}

/// `GET /config/policy` — Effective policy.
#[utoipa::path(
    get,
    path = "/config/policy",
    tag = "System",
    summary = "Effective policy",
    description = "Cooldown, ban threshold, message limits and collaborator timeouts in force.",
    responses(
        (status = 200, description = "Policy", body = PolicyResponse),
    )
)]
pub async fn policy_handler(State(state): State<AppState>) -> impl IntoResponse {
    let policy = &state.policy;
    Json(PolicyResponse {
        swipe_cooldown_secs: policy.swipe_cooldown.as_secs(),
        ban_threshold: policy.ban_threshold,
        max_message_chars: policy.max_message_chars,
        banned_pattern_count: policy.banned_patterns.len(),
        moderation_timeout_ms: u64::try_from(policy.moderation_timeout.as_millis())
            .unwrap_or(u64::MAX),
        suggestion_timeout_ms: u64::try_from(policy.suggestion_timeout.as_millis())
            .unwrap_or(u64::MAX),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/policy", get(policy_handler))
}
