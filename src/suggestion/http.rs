//! HTTP adapter for an external AI suggestion generator.

use async_trait::async_trait;
use serde::Deserialize;

use super::{SuggestionContext, SuggestionError, SuggestionGenerator};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Calls `POST {endpoint}` with the [`SuggestionContext`] as JSON and
/// expects `{"text": ...}` back.
#[derive(Debug, Clone)]
pub struct HttpSuggester {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSuggester {
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
impl SuggestionGenerator for HttpSuggester {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn generate(&self, context: &SuggestionContext) -> Result<String, SuggestionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(context)
            .send()
            .await
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::Status(status.as_u16()));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;
        let text = body.text.trim();
        if text.is_empty() {
            return Err(SuggestionError::Empty);
        }
        Ok(text.to_string())
    }
}
