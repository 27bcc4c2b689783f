use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::PaymentResult;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Document sink receiving one upsert per processed payment
#[async_trait]
pub trait PaymentSink: Send + Sync {
    /// Write the payment document, replacing any previous version with the same payment id
    async fn upsert(&self, result: &PaymentResult) -> Result<(), SinkError>;
}

/// Document store on a Postgres JSONB table
#[derive(Clone)]
pub struct PgPaymentSink {
    pool: PgPool,
}

impl PgPaymentSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentSink for PgPaymentSink {
    async fn upsert(&self, result: &PaymentResult) -> Result<(), SinkError> {
        let document = serde_json::to_value(result)?;

        sqlx::query(
            r#"
            INSERT INTO payment_documents (payment_id, status, document, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (payment_id) DO UPDATE
            SET status = EXCLUDED.status,
                document = EXCLUDED.document,
                updated_at = NOW()
            "#,
        )
        .bind(&result.payment_id)
        .bind(result.status.as_str())
        .bind(document)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            payment_id = %result.payment_id,
            status = result.status.as_str(),
            "Payment document upserted"
        );

        Ok(())
    }
}

/// Sink keeping documents in process memory, keyed by payment id
#[derive(Clone, Default)]
pub struct InMemoryPaymentSink {
    documents: Arc<Mutex<HashMap<String, PaymentResult>>>,
}

impl InMemoryPaymentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, payment_id: &str) -> Option<PaymentResult> {
        self.lock().get(payment_id).cloned()
    }

    pub fn documents(&self) -> Vec<PaymentResult> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PaymentResult>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PaymentSink for InMemoryPaymentSink {
    async fn upsert(&self, result: &PaymentResult) -> Result<(), SinkError> {
        self.lock()
            .insert(result.payment_id.clone(), result.clone());
        Ok(())
    }
}
