//! REST endpoint handlers organized by resource.

pub mod conversations;
pub mod messages;
pub mod swipes;
pub mod system;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(swipes::routes())
        .merge(messages::routes())
        .merge(conversations::routes())
}
