use std::sync::Arc;

use chrono::SubsecRound;
use event_bus::{BusMessage, ProcessingError};

use crate::metrics::Metrics;
use crate::models::{OutboxMessage, RentalRequest};
use crate::store::RentalStore;

/// Rental recorded by [`RentalProcessor::handle`]
#[derive(Debug, Clone)]
pub struct RecordedRental {
    pub rental_id: i64,
    pub outbox: OutboxMessage,
}

/// Handles rental-queue messages
///
/// Parses the body as a [`RentalRequest`] and writes the rental row and its
/// payment-queue outbox message in one transaction. Publishing is left to
/// the outbox relay, so nothing reaches the payment queue unless the rental
/// was committed.
pub struct RentalProcessor {
    store: Arc<dyn RentalStore>,
    payment_subject: String,
    metrics: Metrics,
}

impl RentalProcessor {
    pub fn new(
        store: Arc<dyn RentalStore>,
        payment_subject: impl Into<String>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            payment_subject: payment_subject.into(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn handle(&self, msg: &BusMessage) -> Result<RecordedRental, ProcessingError> {
        let mut rental: RentalRequest = serde_json::from_slice(&msg.payload)
            .map_err(|e| ProcessingError::MalformedMessage(format!("malformed message: {}", e)))?;
        // TIMESTAMPTZ keeps microseconds; the payload must carry the stored value
        rental.requested_at = rental.requested_at.trunc_subsecs(6);

        let outbox = OutboxMessage::payment_request(&rental, self.payment_subject.as_str())
            .map_err(|e| ProcessingError::UnexpectedException(e.to_string()))?;

        let rental_id = self
            .store
            .record_rental(&rental, &outbox)
            .await
            .map_err(|e| ProcessingError::StorePersistenceFailure(e.to_string()))?;

        self.metrics.rentals_recorded_total.inc();
        tracing::info!(
            rental_id,
            message_id = %outbox.message_id,
            model = %rental.model,
            "Rental recorded"
        );

        Ok(RecordedRental { rental_id, outbox })
    }
}
