//! Swipe decisions, canonical pair keys, and matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ConversationId, UserId};

/// Direction of a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Interested; may form a match.
    Like,
    /// Not interested.
    Pass,
    /// Undecided; kept aside for a later re-decision.
    Unsure,
}

impl SwipeDirection {
    /// Returns the direction as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Pass => "pass",
            Self::Unsure => "unsure",
        }
    }
}

/// A recorded swipe. Immutable once recorded, except that an
/// [`SwipeDirection::Unsure`] decision may be replaced once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SwipeDecision {
    /// Who swiped.
    pub actor_id: UserId,
    /// Whose profile was swiped.
    pub target_id: UserId,
    /// The decision.
    pub direction: SwipeDirection,
    /// Server timestamp of the decision.
    pub decided_at: DateTime<Utc>,
}

/// Unordered pair of users canonicalized as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct PairKey {
    /// Lower user id.
    pub low: UserId,
    /// Higher user id.
    pub high: UserId,
}

impl PairKey {
    /// Canonicalizes the pair; argument order does not matter.
    #[must_use]
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Returns `true` if the user is one of the two.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// Returns the member of the pair that is not `user`, or `None` if
    /// `user` is not in the pair.
    #[must_use]
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// A mutual like. Exists at most once per unordered pair and always has
/// exactly one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Match {
    /// The conversation created together with the match.
    pub conversation_id: ConversationId,
    /// The matched users.
    pub users: PairKey,
    /// Formation timestamp.
    pub created_at: DateTime<Utc>,
}
