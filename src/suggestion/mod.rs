//! Conversation suggestion collaborators.
//!
//! Suggestions are advisory text (openers, follow-up tips) produced by an
//! external AI generator. They are never on the message delivery path: the
//! service falls back to local [`InterestTips`] whenever the generator is
//! slow or failing.

pub mod http;
pub mod tips;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpSuggester;
pub use tips::InterestTips;

/// Who said a line in the recent transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The user asking for a suggestion.
    Me,
    /// The other participant.
    Them,
}

/// One line of recent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Author relative to the viewer.
    pub speaker: Speaker,
    /// Message text.
    pub text: String,
}

/// Everything a generator may use to tailor a suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionContext {
    /// Viewer's display name.
    pub my_name: String,
    /// Other participant's display name.
    pub their_name: String,
    /// Interests both users listed.
    pub shared_interests: Vec<String>,
    /// Other participant's interests.
    pub their_interests: Vec<String>,
    /// Other participant's bio, if any.
    pub their_bio: Option<String>,
    /// Most recent messages, oldest first.
    pub recent: Vec<TranscriptLine>,
}

/// Failure obtaining a suggestion.
#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    /// Transport-level failure.
    #[error("suggestion request failed: {0}")]
    Transport(String),
    /// The generator answered with a non-success status.
    #[error("suggestion service returned HTTP {0}")]
    Status(u16),
    /// The generator returned nothing usable.
    #[error("empty suggestion")]
    Empty,
}

/// Port for an AI text generator.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync + fmt::Debug {
    /// Produces one suggestion for the given context.
    ///
    /// # Errors
    ///
    /// Returns a [`SuggestionError`] when no suggestion could be produced.
    async fn generate(&self, context: &SuggestionContext) -> Result<String, SuggestionError>;
}
