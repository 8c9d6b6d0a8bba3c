//! Domain layer: core types, concurrent stores, and the event system.
//!
//! This module contains the server-side domain model: identifiers, users,
//! swipe decisions and matches, conversations and their message logs, the
//! stores that hold them under fine-grained locks, and the event bus that
//! broadcasts every state change.

pub mod conversation;
pub mod conversation_store;
pub mod event;
pub mod event_bus;
pub mod geo;
pub mod ids;
pub mod message;
pub mod submission;
pub mod swipe;
pub mod swipe_ledger;
pub mod user;
pub mod user_directory;

pub use conversation::{Conversation, ConversationSummary};
pub use conversation_store::{ConversationStore, MessageFeed};
pub use event::DomainEvent;
pub use event_bus::EventBus;
pub use ids::{ConversationId, MessageId, SubmissionId, UserId};
pub use message::{Message, ModerationStatus};
pub use submission::Submission;
pub use swipe::{Match, PairKey, SwipeDecision, SwipeDirection};
pub use swipe_ledger::{Admission, SwipeLedger};
pub use user::{InterestedIn, Location, Preferences, Profile, ProfileUpdate, Sex, User};
pub use user_directory::UserDirectory;
