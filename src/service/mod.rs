//! Service layer: business logic orchestration.
//!
//! Each service owns `Arc` handles to the domain stores it needs and the
//! [`super::domain::EventBus`], validates at the boundary, and emits an
//! event after every state change.

pub mod chat_service;
pub mod match_engine;
pub mod moderation_gate;
pub mod profile_service;
pub mod strike_ledger;
pub mod suggestion_service;
pub mod swipe_service;

pub use chat_service::{ChatService, MessagePage};
pub use match_engine::{MatchEngine, MatchOutcome};
pub use moderation_gate::ModerationGate;
pub use profile_service::{CandidateCard, ProfileService};
pub use strike_ledger::{StrikeLedger, StrikeStatus};
pub use suggestion_service::{Suggestion, SuggestionService, SuggestionSource};
pub use swipe_service::{SwipeOutcome, SwipeService};
