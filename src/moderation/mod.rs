//! Content moderation collaborators.
//!
//! The gate in [`crate::service::ModerationGate`] screens every outgoing
//! message in two steps: a synchronous [`ContentFilter`] pass over local
//! banned-content patterns, then an asynchronous call to a
//! [`ContentModerator`]. The moderator is an external service; this module
//! defines the port and its adapters.

pub mod filter;
pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use filter::ContentFilter;
pub use http::HttpModerator;

/// Verdict returned by a content moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the text may be delivered.
    pub allowed: bool,
    /// Why it was blocked, when it was.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ModerationVerdict {
    /// An approving verdict.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// A blocking verdict with a reason.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Failure talking to a moderation backend.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// Transport-level failure.
    #[error("moderation request failed: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("moderation service returned HTTP {0}")]
    Status(u16),
    /// The backend answered with something that is not a verdict.
    #[error("malformed moderation response: {0}")]
    Malformed(String),
}

/// Port for an external content moderation service.
#[async_trait]
pub trait ContentModerator: Send + Sync + fmt::Debug {
    /// Screens `text` and returns a verdict.
    ///
    /// # Errors
    ///
    /// Returns a [`ModerationError`] when no verdict could be obtained; the
    /// gate treats that as a rejection.
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ModerationError>;
}

/// Moderator used when no external service is configured. Approves
/// everything; the local pattern pre-check still runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllModerator;

#[async_trait]
impl ContentModerator for AllowAllModerator {
    async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, ModerationError> {
        Ok(ModerationVerdict::allow())
    }
}
