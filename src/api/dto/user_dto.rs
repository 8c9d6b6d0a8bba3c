//! User-related DTOs: registration and standing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Preferences, Profile, User, UserId};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    /// Public profile.
    pub profile: Profile,
    /// Discovery preferences; defaults apply when omitted.
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// A user as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// User identifier.
    pub user_id: UserId,
    /// Public profile.
    pub profile: Profile,
    /// Discovery preferences.
    pub preferences: Preferences,
    /// Moderation strikes.
    pub strikes: u32,
    /// Ban flag.
    pub banned: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            profile: user.profile,
            preferences: user.preferences,
            strikes: user.strikes,
            banned: user.banned,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
