//! Persistence layer: optional PostgreSQL event log.
//!
//! All live state is in memory; the event log is an append-only audit
//! trail fed from the [`crate::domain::EventBus`] by a background
//! recorder. The concrete store uses `sqlx::PgPool`.

pub mod models;
pub mod postgres;
pub mod recorder;

use async_trait::async_trait;

use crate::domain::DomainEvent;
use crate::error::GatewayError;

pub use models::StoredEvent;
pub use postgres::PostgresEventLog;
pub use recorder::{spawn_cleanup, spawn_event_recorder};

/// Append-only destination for domain events.
#[async_trait]
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Appends one event and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the write fails.
    async fn append(&self, event: &DomainEvent) -> Result<i64, GatewayError>;
}
