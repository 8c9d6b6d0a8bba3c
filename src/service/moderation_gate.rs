//! Moderation gate: stages outgoing messages until a verdict is in.
//!
//! ```text
//! submit ──► checks ──► pattern pre-check ──► staged (pending) ──► returns
//!                              │                     │
//!                        strike + 422          spawned verdict task
//!                                                    │ timeout-bounded call
//!                                     ┌──────────────┴──────────────┐
//!                                  allowed                 blocked / error / timeout
//!                            deliver + approve               reject + strike
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};

use super::chat_service::ChatService;
use super::strike_ledger::StrikeLedger;
use crate::domain::message::validate_text;
use crate::domain::{ConversationId, DomainEvent, EventBus, Submission, SubmissionId, UserDirectory, UserId};
use crate::error::GatewayError;
use crate::moderation::{ContentFilter, ContentModerator};

const REASON_PATTERN: &str = "message contains banned content";
const REASON_TIMEOUT: &str = "moderation timed out";
const REASON_UNAVAILABLE: &str = "moderation unavailable";
const REASON_BLOCKED: &str = "blocked by moderation";
const REASON_SENDER_BANNED: &str = "sender is banned";

type SubmissionMap = HashMap<SubmissionId, watch::Sender<Submission>>;

enum Verdict {
    Allowed,
    Blocked(String),
}

/// Holds every message between submission and verdict.
///
/// Each submission is a [`watch`] channel: readers see the latest state,
/// and [`Self::wait_for_verdict`] resolves as soon as the status becomes
/// final. The external call happens in a spawned task with no lock held
/// across the await, so a slow moderator delays only its own submission.
#[derive(Debug, Clone)]
pub struct ModerationGate {
    submissions: Arc<RwLock<SubmissionMap>>,
    directory: Arc<UserDirectory>,
    chat: ChatService,
    strikes: StrikeLedger,
    moderator: Arc<dyn ContentModerator>,
    filter: Arc<ContentFilter>,
    event_bus: EventBus,
    timeout: Duration,
}

impl ModerationGate {
    /// Creates a gate.
    #[must_use]
    pub fn new(
        directory: Arc<UserDirectory>,
        chat: ChatService,
        strikes: StrikeLedger,
        moderator: Arc<dyn ContentModerator>,
        filter: ContentFilter,
        event_bus: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            submissions: Arc::new(RwLock::new(HashMap::new())),
            directory,
            chat,
            strikes,
            moderator,
            filter: Arc::new(filter),
            event_bus,
            timeout,
        }
    }

    /// Submits a message for moderation and returns the pending submission.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::UserNotFound`] / [`GatewayError::Banned`] for the sender.
    /// - [`GatewayError::ConversationNotFound`] / [`GatewayError::NotParticipant`].
    /// - [`GatewayError::Validation`] for blank or oversized text (no strike).
    /// - [`GatewayError::ModerationRejected`] when the text matches a banned
    ///   pattern; a strike is recorded.
    pub async fn submit(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Submission, GatewayError> {
        self.directory.ensure_active(sender_id).await?;

        let participants = self.chat.store().participants(conversation_id).await?;
        if !participants.contains(sender_id) {
            return Err(GatewayError::NotParticipant {
                user_id: *sender_id.as_uuid(),
                conversation_id: *conversation_id.as_uuid(),
            });
        }

        validate_text(&text, self.chat.store().max_message_chars())?;

        if let Some(pattern) = self.filter.first_match(&text) {
            tracing::debug!(%sender_id, %conversation_id, pattern, "pre-check blocked message");
            let status = self.strikes.record_strike(sender_id, REASON_PATTERN).await?;
            tracing::debug!(%sender_id, strikes = status.strikes, banned = status.banned, "pattern strike");
            return Err(GatewayError::ModerationRejected(REASON_PATTERN.to_string()));
        }

        let submission = Submission::pending(conversation_id, sender_id, text, now);
        let (tx, _rx) = watch::channel(submission.clone());
        self.submissions.write().await.insert(submission.id, tx);

        let gate = self.clone();
        let staged = submission.clone();
        tokio::spawn(async move { gate.resolve(staged).await });

        tracing::debug!(submission_id = %submission.id, %conversation_id, %sender_id, "submission staged");
        Ok(submission)
    }

    async fn verdict_for(&self, text: &str, submission_id: SubmissionId) -> Verdict {
        match tokio::time::timeout(self.timeout, self.moderator.moderate(text)).await {
            Ok(Ok(verdict)) if verdict.allowed => Verdict::Allowed,
            Ok(Ok(verdict)) => {
                Verdict::Blocked(verdict.reason.unwrap_or_else(|| REASON_BLOCKED.to_string()))
            }
            Ok(Err(err)) => {
                tracing::warn!(%submission_id, error = %err, "moderation call failed");
                Verdict::Blocked(REASON_UNAVAILABLE.to_string())
            }
            Err(_) => {
                tracing::warn!(%submission_id, timeout = ?self.timeout, "moderation timed out");
                Verdict::Blocked(REASON_TIMEOUT.to_string())
            }
        }
    }

    async fn resolve(&self, staged: Submission) {
        let submission_id = staged.id;
        let verdict = self.verdict_for(&staged.text, submission_id).await;

        let banned = self
            .directory
            .is_banned(staged.sender_id)
            .await
            .unwrap_or(true);
        if banned {
            self.reject(&staged, REASON_SENDER_BANNED.to_string()).await;
            return;
        }

        match verdict {
            Verdict::Allowed => {
                let now = Utc::now();
                match self
                    .chat
                    .deliver(staged.conversation_id, staged.sender_id, staged.text.clone(), now)
                    .await
                {
                    Ok(message) => {
                        self.update(submission_id, |s| s.approve(message.id, now)).await;
                        let _ = self.event_bus.publish(DomainEvent::SubmissionApproved {
                            submission_id,
                            conversation_id: staged.conversation_id,
                            sender_id: staged.sender_id,
                            message_id: message.id,
                            timestamp: now,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(%submission_id, error = %err, "approved message could not be delivered");
                        self.reject(&staged, err.to_string()).await;
                    }
                }
            }
            Verdict::Blocked(reason) => {
                if let Err(err) = self.strikes.record_strike(staged.sender_id, &reason).await {
                    tracing::warn!(%submission_id, error = %err, "strike not recorded");
                }
                self.reject(&staged, reason).await;
            }
        }
    }

    async fn reject(&self, staged: &Submission, reason: String) {
        let now = Utc::now();
        let stored = reason.clone();
        self.update(staged.id, |s| s.reject(stored, now)).await;
        let _ = self.event_bus.publish(DomainEvent::SubmissionRejected {
            submission_id: staged.id,
            conversation_id: staged.conversation_id,
            sender_id: staged.sender_id,
            reason,
            timestamp: now,
        });
        tracing::debug!(submission_id = %staged.id, "submission rejected");
    }

    async fn update(&self, submission_id: SubmissionId, apply: impl FnOnce(&mut Submission)) {
        let map = self.submissions.read().await;
        if let Some(tx) = map.get(&submission_id) {
            tx.send_modify(apply);
        }
    }

    /// Current state of a submission.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SubmissionNotFound`] for unknown or pruned ids.
    pub async fn submission(&self, submission_id: SubmissionId) -> Result<Submission, GatewayError> {
        let map = self.submissions.read().await;
        map.get(&submission_id)
            .map(|tx| tx.borrow().clone())
            .ok_or(GatewayError::SubmissionNotFound(*submission_id.as_uuid()))
    }

    /// Waits until the submission has a verdict and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SubmissionNotFound`] for unknown ids, or if
    /// the submission was pruned while waiting.
    pub async fn wait_for_verdict(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Submission, GatewayError> {
        let mut rx = {
            let map = self.submissions.read().await;
            map.get(&submission_id)
                .map(watch::Sender::subscribe)
                .ok_or(GatewayError::SubmissionNotFound(*submission_id.as_uuid()))?
        };
        let finished = rx
            .wait_for(Submission::is_final)
            .await
            .map_err(|_| GatewayError::SubmissionNotFound(*submission_id.as_uuid()))?;
        Ok(finished.clone())
    }

    /// Drops finalized submissions decided before `older_than`; returns how
    /// many were removed. Pending submissions are always kept.
    pub async fn prune_finalized(&self, older_than: DateTime<Utc>) -> usize {
        let mut map = self.submissions.write().await;
        let before = map.len();
        map.retain(|_, tx| {
            let s = tx.borrow();
            !s.is_final() || s.decided_at.is_some_and(|at| at >= older_than)
        });
        before.saturating_sub(map.len())
    }

    /// Number of tracked submissions.
    pub async fn len(&self) -> usize {
        self.submissions.read().await.len()
    }

    /// Returns `true` if no submissions are tracked.
    pub async fn is_empty(&self) -> bool {
        self.submissions.read().await.is_empty()
    }
}
