//! Strike ledger: moderation offences and the sticky ban flag.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DomainEvent, EventBus, UserDirectory, UserId};
use crate::error::GatewayError;

/// A user's standing after a strike or on query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StrikeStatus {
    /// Strikes recorded so far.
    pub strikes: u32,
    /// Whether the user is banned.
    pub banned: bool,
}

/// Counts moderation strikes and bans users at the threshold.
///
/// Strike counts live on the [`crate::domain::User`] record, so the
/// increment happens under that user's write lock and never races with
/// another strike for the same user.
#[derive(Debug, Clone)]
pub struct StrikeLedger {
    directory: Arc<UserDirectory>,
    event_bus: EventBus,
    ban_threshold: u32,
}

impl StrikeLedger {
    /// Creates a ledger banning at `ban_threshold` strikes.
    #[must_use]
    pub fn new(directory: Arc<UserDirectory>, event_bus: EventBus, ban_threshold: u32) -> Self {
        Self {
            directory,
            event_bus,
            ban_threshold: ban_threshold.max(1),
        }
    }

    /// Strike count at which a user is banned.
    #[must_use]
    pub const fn ban_threshold(&self) -> u32 {
        self.ban_threshold
    }

    /// Records one strike. The ban flag, once set, is never cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if the user does not exist.
    pub async fn record_strike(
        &self,
        user_id: UserId,
        reason: &str,
    ) -> Result<StrikeStatus, GatewayError> {
        let user_lock = self.directory.get(user_id).await?;
        let mut user = user_lock.write().await;
        let was_banned = user.banned;
        user.strikes = user.strikes.saturating_add(1);
        if user.strikes >= self.ban_threshold {
            user.banned = true;
        }
        let now = Utc::now();
        user.updated_at = now;
        let status = StrikeStatus {
            strikes: user.strikes,
            banned: user.banned,
        };
        drop(user);

        let _ = self.event_bus.publish(DomainEvent::StrikeRecorded {
            user_id,
            strikes: status.strikes,
            banned: status.banned,
            reason: reason.to_string(),
            timestamp: now,
        });

        if status.banned && !was_banned {
            tracing::info!(%user_id, strikes = status.strikes, "user banned");
        } else {
            tracing::debug!(%user_id, strikes = status.strikes, reason, "strike recorded");
        }
        Ok(status)
    }

    /// Current standing of a user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if the user does not exist.
    pub async fn status(&self, user_id: UserId) -> Result<StrikeStatus, GatewayError> {
        let user = self.directory.snapshot(user_id).await?;
        Ok(StrikeStatus {
            strikes: user.strikes,
            banned: user.banned,
        })
    }
}
