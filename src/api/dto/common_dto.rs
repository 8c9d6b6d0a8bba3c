//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::UserId;

/// `?limit=` for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of items (1-100). Defaults to 20.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl LimitParams {
    /// Clamps `limit` to `1..=100`.
    #[must_use]
    pub fn clamped(&self) -> usize {
        usize::try_from(self.limit.clamp(1, 100)).unwrap_or(20)
    }
}

/// `?user_id=` naming the acting participant.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActorParams {
    /// Acting user.
    #[param(value_type = uuid::Uuid)]
    pub user_id: UserId,
}

fn default_limit() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(LimitParams { limit: 0 }.clamped(), 1);
        assert_eq!(LimitParams { limit: 500 }.clamped(), 100);
        assert_eq!(LimitParams { limit: 7 }.clamped(), 7);
    }
}
