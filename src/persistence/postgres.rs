//! PostgreSQL implementation of the event log.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::EventSink;
use super::models::StoredEvent;
use crate::config::GatewayConfig;
use crate::domain::DomainEvent;
use crate::error::GatewayError;

fn db_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings from `config` and applies the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(db_error)?;

        Ok(Self::new(pool))
    }

    /// Appends an event to the log.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &DomainEvent) -> Result<i64, GatewayError> {
        let payload = serde_json::to_value(event).map_err(db_error)?;
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (event_type, subject_id, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event.event_type_str())
        .bind(event.subject_id())
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// subject (a conversation or user id).
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        subject_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, GatewayError> {
        if let Some(subject) = subject_id {
            sqlx::query_as::<_, StoredEvent>(
                "SELECT id, event_type, subject_id, payload, created_at FROM events \
                 WHERE created_at > $1 AND subject_id = $2 ORDER BY id ASC",
            )
            .bind(after)
            .bind(subject)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, StoredEvent>(
                "SELECT id, event_type, subject_id, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY id ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_error)
    }

    /// Deletes events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_older_than(&self, days: u64) -> Result<u64, GatewayError> {
        let cutoff = i64::try_from(days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let result = sqlx::query("DELETE FROM events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl EventSink for PostgresEventLog {
    async fn append(&self, event: &DomainEvent) -> Result<i64, GatewayError> {
        self.save_event(event).await
    }
}
