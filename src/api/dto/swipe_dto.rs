//! Swipe DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{SwipeDirection, UserId};

/// Request body for `POST /swipe`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SwipeRequest {
    /// Who swipes.
    pub actor_id: UserId,
    /// Whose profile.
    pub target_id: UserId,
    /// Decision.
    pub direction: SwipeDirection,
}

/// Response body for `GET /users/{id}/cooldown`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CooldownResponse {
    /// User.
    pub user_id: UserId,
    /// Whether a swipe would be accepted now.
    pub can_swipe: bool,
    /// End of the running cooldown window, if any.
    pub next_eligible_at: Option<DateTime<Utc>>,
}
