//! Messaging DTOs: submissions, history paging, read receipts.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ConversationId, MessageId, UserId};

/// Request body for `POST /messages`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitMessageRequest {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// Message text.
    pub text: String,
}

/// `?wait=` on `POST /messages`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmitParams {
    /// Block until the moderation verdict is in.
    #[serde(default)]
    pub wait: bool,
}

/// Query for `GET /conversations/{id}/messages`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Reading participant.
    #[param(value_type = uuid::Uuid)]
    pub user_id: UserId,
    /// Last message id already seen; omitted to start from the beginning.
    #[serde(default)]
    #[param(value_type = Option<uuid::Uuid>)]
    pub since: Option<MessageId>,
    /// Page size (1-200). Defaults to 50.
    #[serde(default = "default_page_size")]
    pub limit: usize,
}

/// Request body for `POST /conversations/{id}/read`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    /// Reading participant.
    pub user_id: UserId,
    /// Last message read.
    pub up_to: MessageId,
}

/// Response body for `POST /conversations/{id}/read`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    /// Conversation.
    pub conversation_id: ConversationId,
    /// Unread messages remaining for the reader.
    pub unread: u32,
}

fn default_page_size() -> usize {
    50
}
