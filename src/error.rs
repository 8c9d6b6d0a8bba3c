//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Every failure is scoped to the request that caused it.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "swipe cooldown active; retry after 12000 ms",
///     "details": "12000"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
/// | 4000–4999 | Policy          | 403 / 422 / 429            |
///
/// Lost races (a duplicate swipe, a match that already exists) are not
/// errors; they come back as ordinary success values.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed (client-correctable).
    #[error("invalid request: {0}")]
    Validation(String),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Conversation with the given ID was not found.
    #[error("conversation not found: {0}")]
    ConversationNotFound(uuid::Uuid),

    /// Message with the given ID was not found.
    #[error("message not found: {0}")]
    MessageNotFound(uuid::Uuid),

    /// Submission with the given ID was not found.
    #[error("submission not found: {0}")]
    SubmissionNotFound(uuid::Uuid),

    /// Swipe attempted before the actor's cooldown window elapsed.
    #[error("swipe cooldown active; retry after {retry_after_ms} ms")]
    Cooldown {
        /// Milliseconds until the actor may swipe again.
        retry_after_ms: u64,
    },

    /// The user is banned; no further swipes or messages are accepted.
    #[error("user {0} is banned")]
    Banned(uuid::Uuid),

    /// Message blocked by moderation; the sender must edit and resubmit.
    #[error("message rejected by moderation: {0}")]
    ModerationRejected(String),

    /// The user is not a participant of the conversation (or not the
    /// author of the message).
    #[error("user {user_id} may not act on conversation {conversation_id}")]
    NotParticipant {
        /// Acting user.
        user_id: uuid::Uuid,
        /// Target conversation.
        conversation_id: uuid::Uuid,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::UserNotFound(_) => 2001,
            Self::ConversationNotFound(_) => 2002,
            Self::MessageNotFound(_) => 2003,
            Self::SubmissionNotFound(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Cooldown { .. } => 4001,
            Self::Banned(_) => 4002,
            Self::ModerationRejected(_) => 4003,
            Self::NotParticipant { .. } => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_)
            | Self::ConversationNotFound(_)
            | Self::MessageNotFound(_)
            | Self::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Banned(_) | Self::NotParticipant { .. } => StatusCode::FORBIDDEN,
            Self::ModerationRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the client may retry the same request later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Cooldown { .. } | Self::PersistenceError(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after_ms = match &self {
            Self::Cooldown { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: retry_after_ms.map(|ms| ms.to_string()),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if let Some(ms) = retry_after_ms {
            let secs = ms.div_ceil(1000).max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
