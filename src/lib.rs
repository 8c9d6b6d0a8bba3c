//! # spark-gateway
//!
//! REST API and WebSocket gateway for real-time matching, swiping and
//! moderated chat.
//!
//! Users swipe on each other's profiles under a per-user cooldown; two
//! mutual likes form exactly one match and one conversation. Outgoing
//! messages pass a moderation gate before they become visible, and
//! rejected messages accumulate strikes until the sender is banned.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── ProfileService · SwipeService · MatchEngine (service/)
//!     ├── ModerationGate · StrikeLedger · ChatService (service/)
//!     ├── SuggestionService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── UserDirectory · SwipeLedger · ConversationStore (domain/)
//!     ├── ContentModerator · SuggestionGenerator (moderation/, suggestion/)
//!     │
//!     └── PostgreSQL event log (persistence/, optional)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod moderation;
pub mod persistence;
pub mod service;
pub mod suggestion;
pub mod ws;
