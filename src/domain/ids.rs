//! Type-safe identifiers.
//!
//! Every identifier is a newtype around [`uuid::Uuid`] (v4) so that a user
//! id can never be passed where a conversation or message id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Identifier of a registered user.
    ///
    /// Totally ordered so that an unordered pair of users can be
    /// canonicalized as `(min, max)`.
    UserId
}

uuid_id! {
    /// Identifier of a conversation. A conversation exists exactly when its
    /// match does, so this also identifies the match.
    ConversationId
}

uuid_id! {
    /// Identifier of a persisted message. Doubles as the incremental-sync
    /// cursor for a conversation.
    MessageId
}

uuid_id! {
    /// Identifier of a message submission awaiting (or past) moderation.
    SubmissionId
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(MessageId::default(), MessageId::default());
    }

    #[test]
    fn display_is_uuid_format() {
        let s = ConversationId::new().to_string();
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn serializes_as_bare_string() {
        let uuid = uuid::Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn ordering_follows_uuid() {
        let low = UserId::from_uuid(uuid::Uuid::from_u128(1));
        let high = UserId::from_uuid(uuid::Uuid::from_u128(2));
        assert!(low < high);
        assert_eq!(low.min(high), low);
    }
}
