//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain types that already carry `Serialize` and `ToSchema` (matches,
//! messages, submissions) are returned as-is; DTOs exist for request bodies,
//! query strings and reshaped responses.

pub mod common_dto;
pub mod message_dto;
pub mod swipe_dto;
pub mod user_dto;

pub use common_dto::*;
pub use message_dto::*;
pub use swipe_dto::*;
pub use user_dto::*;
