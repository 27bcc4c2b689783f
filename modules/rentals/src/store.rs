use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{OutboxMessage, RentalRecord, RentalRequest};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Relational store for rentals and their pending payment messages
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Insert the rental and its outbox message atomically
    ///
    /// Returns the id of the new rental row.
    async fn record_rental(
        &self,
        rental: &RentalRequest,
        outbox: &OutboxMessage,
    ) -> Result<i64, StoreError>;

    /// Oldest outbox messages not yet published, at most `limit`
    async fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError>;

    async fn mark_published(&self, message_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgRentalStore {
    pool: PgPool,
}

impl PgRentalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    message_id: Uuid,
    subject: String,
    headers: serde_json::Value,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for OutboxMessage {
    type Error = StoreError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: row.message_id,
            subject: row.subject,
            headers: serde_json::from_value(row.headers)?,
            payload: row.payload,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RentalStore for PgRentalStore {
    async fn record_rental(
        &self,
        rental: &RentalRequest,
        outbox: &OutboxMessage,
    ) -> Result<i64, StoreError> {
        let headers = serde_json::to_value(&outbox.headers)?;
        let mut tx = self.pool.begin().await?;

        let (rental_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO rentals (name, email, model, year, rental_duration, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&rental.name)
        .bind(&rental.email)
        .bind(&rental.model)
        .bind(rental.year)
        .bind(rental.rental_duration)
        .bind(rental.requested_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO rentals_events_outbox (message_id, subject, headers, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(outbox.message_id)
        .bind(&outbox.subject)
        .bind(headers)
        .bind(&outbox.payload)
        .bind(outbox.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            rental_id,
            message_id = %outbox.message_id,
            "Rental recorded with outbox message"
        );

        Ok(rental_id)
    }

    async fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT message_id, subject, headers, payload, created_at
            FROM rentals_events_outbox
            WHERE published_at IS NULL
            ORDER BY id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutboxMessage::try_from).collect()
    }

    async fn mark_published(&self, message_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE rentals_events_outbox
            SET published_at = NOW()
            WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Default)]
struct InMemoryState {
    rentals: Vec<RentalRecord>,
    outbox: Vec<(OutboxMessage, Option<DateTime<Utc>>)>,
}

/// Store keeping rentals and outbox messages in process memory
#[derive(Clone, Default)]
pub struct InMemoryRentalStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRentalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rentals(&self) -> Vec<RentalRecord> {
        self.lock().rentals.clone()
    }

    /// Publication time of every outbox message, keyed by message id
    pub fn outbox_status(&self) -> HashMap<Uuid, Option<DateTime<Utc>>> {
        self.lock()
            .outbox
            .iter()
            .map(|(message, published_at)| (message.message_id, *published_at))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RentalStore for InMemoryRentalStore {
    async fn record_rental(
        &self,
        rental: &RentalRequest,
        outbox: &OutboxMessage,
    ) -> Result<i64, StoreError> {
        let mut state = self.lock();
        let id = state.rentals.len() as i64 + 1;

        state.rentals.push(RentalRecord {
            id,
            name: rental.name.clone(),
            email: rental.email.clone(),
            model: rental.model.clone(),
            year: rental.year,
            rental_duration: rental.rental_duration,
            date: rental.requested_at,
        });
        state.outbox.push((outbox.clone(), None));

        Ok(id)
    }

    async fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .lock()
            .outbox
            .iter()
            .filter(|(_, published_at)| published_at.is_none())
            .map(|(message, _)| message.clone())
            .take(limit)
            .collect())
    }

    async fn mark_published(&self, message_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some((_, published_at)) = state
            .outbox
            .iter_mut()
            .find(|(message, _)| message.message_id == message_id)
        {
            *published_at = Some(Utc::now());
        }
        Ok(())
    }
}
