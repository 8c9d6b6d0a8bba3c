//! Database models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event type discriminator (e.g. `"match_created"`).
    pub event_type: String,
    /// Conversation the event belongs to, else the first user it concerns.
    pub subject_id: Option<Uuid>,
    /// JSONB payload with the serialized event.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}
