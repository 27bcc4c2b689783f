use std::sync::Arc;

use chrono::Utc;
use event_bus::{BusMessage, ProcessingError};

use crate::decision::StatusDecider;
use crate::metrics::Metrics;
use crate::models::{PaymentRequest, PaymentResult};
use crate::notification::{NotificationOutcome, NotificationPublisher};
use crate::sink::PaymentSink;

/// Handles payment-queue messages
///
/// Per message:
/// 1. Parses the body as a [`PaymentRequest`]
/// 2. Assigns a status through the injected [`StatusDecider`]
/// 3. On approval, stamps `approved_at` and fans out a best-effort notification
/// 4. Upserts the [`PaymentResult`] into the document sink
///
/// Any error is returned to the caller, which dead-letters the message.
/// A notification already sent is not compensated.
pub struct PaymentProcessor {
    decider: Arc<dyn StatusDecider>,
    sink: Arc<dyn PaymentSink>,
    notifier: NotificationPublisher,
    metrics: Metrics,
}

impl PaymentProcessor {
    pub fn new(
        decider: Arc<dyn StatusDecider>,
        sink: Arc<dyn PaymentSink>,
        notifier: NotificationPublisher,
        metrics: Metrics,
    ) -> Self {
        Self {
            decider,
            sink,
            notifier,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn handle(&self, msg: &BusMessage) -> Result<PaymentResult, ProcessingError> {
        let request: PaymentRequest = serde_json::from_slice(&msg.payload).map_err(|e| {
            ProcessingError::MalformedMessage(format!("could not deserialize: {}", e))
        })?;

        let status = self.decider.decide(&request);
        let result = PaymentResult::assign(request, status, Utc::now());

        self.metrics
            .payments_status_total
            .with_label_values(&[status.as_str()])
            .inc();

        tracing::info!(
            payment_id = %result.payment_id,
            status = status.as_str(),
            model = %result.request.model,
            "Payment status assigned"
        );

        if result.is_approved() {
            let outcome = match self.notifier.notify_best_effort(&result).await {
                NotificationOutcome::Sent => "sent",
                NotificationOutcome::Failed { .. } => "failed",
            };
            self.metrics
                .payments_notifications_total
                .with_label_values(&[outcome])
                .inc();
        }

        self.sink
            .upsert(&result)
            .await
            .map_err(|e| ProcessingError::StorePersistenceFailure(e.to_string()))?;

        tracing::info!(
            payment_id = %result.payment_id,
            status = status.as_str(),
            "Payment document persisted"
        );

        Ok(result)
    }
}
