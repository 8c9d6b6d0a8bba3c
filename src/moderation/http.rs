//! HTTP adapter for an external content moderation service.

use async_trait::async_trait;
use serde::Serialize;

use super::{ContentModerator, ModerationError, ModerationVerdict};

#[derive(Debug, Serialize)]
struct ModerateRequest<'a> {
    text: &'a str,
}

/// Calls `POST {endpoint}` with `{"text": ...}` and expects a
/// [`ModerationVerdict`] JSON body back.
///
/// `reqwest::Client` is `Clone + Send + Sync`, so no external locking is
/// needed. The caller bounds the call with its own timeout.
#[derive(Debug, Clone)]
pub struct HttpModerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpModerator {
    /// Creates an adapter for the given endpoint URL.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ContentModerator for HttpModerator {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, len = text.len()))]
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ModerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ModerateRequest { text })
            .send()
            .await
            .map_err(|e| ModerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModerationError::Status(status.as_u16()));
        }

        response
            .json::<ModerationVerdict>()
            .await
            .map_err(|e| ModerationError::Malformed(e.to_string()))
    }
}
