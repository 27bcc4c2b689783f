use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use event_bus::{json_headers, EventBus, ProcessingError};

use crate::models::PaymentResult;

/// Human-readable text attached to every approval notification
pub const APPROVED_MESSAGE: &str = "Payment approved successfully.";

/// Result of a best-effort notification publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed { error: String },
}

/// At-most-once fan-out of approved payments to the notification queue
///
/// A failed or timed out publish is logged and reported as
/// [`NotificationOutcome::Failed`]; it never fails the payment message that
/// triggered it, and nothing is retried.
#[derive(Clone)]
pub struct NotificationPublisher {
    bus: Arc<dyn EventBus>,
    subject: String,
    timeout: Duration,
}

impl NotificationPublisher {
    pub fn new(bus: Arc<dyn EventBus>, subject: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bus,
            subject: subject.into(),
            timeout,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Metadata sent next to the notification body
    pub fn headers(result: &PaymentResult) -> HashMap<String, String> {
        let mut headers = json_headers();
        headers.insert("paymentId".to_string(), result.payment_id.clone());
        headers.insert("type".to_string(), "notification".to_string());
        headers.insert("message".to_string(), APPROVED_MESSAGE.to_string());
        headers
    }

    pub async fn notify_best_effort(&self, result: &PaymentResult) -> NotificationOutcome {
        let payload = match serde_json::to_vec(result) {
            Ok(payload) => payload,
            Err(e) => return self.failed(result, e.to_string()),
        };

        let publish = self
            .bus
            .publish_with_headers(&self.subject, Self::headers(result), payload);

        match tokio::time::timeout(self.timeout, publish).await {
            Ok(Ok(())) => {
                tracing::info!(
                    payment_id = %result.payment_id,
                    subject = %self.subject,
                    "Message sent to notification queue"
                );
                NotificationOutcome::Sent
            }
            Ok(Err(e)) => self.failed(result, e.to_string()),
            Err(_) => self.failed(
                result,
                format!("publish timed out after {}ms", self.timeout.as_millis()),
            ),
        }
    }

    fn failed(&self, result: &PaymentResult, detail: String) -> NotificationOutcome {
        let error = ProcessingError::DownstreamPublishFailure(detail);
        tracing::error!(
            payment_id = %result.payment_id,
            subject = %self.subject,
            error_kind = error.kind(),
            error = %error,
            "Failed to send message to notification queue"
        );
        NotificationOutcome::Failed {
            error: error.to_string(),
        }
    }
}
