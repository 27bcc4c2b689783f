//! Message settlement: completing or dead-lettering a received message
//!
//! Every consumer follows the same rule: a handler either succeeds and the
//! message is completed, or fails with a [`ProcessingError`] and the message
//! is dead-lettered with the error text as the reason. No variant is retried
//! by the application; transient failures rely on the broker redelivering.

use crate::{dlq::dead_letter, BusMessage, EventBus};

/// Failure taxonomy shared by all consumers
///
/// The `Display` output of each variant is the dead-letter reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    /// Body could not be parsed into the expected message type
    #[error("{0}")]
    MalformedMessage(String),

    /// A downstream publish failed; only logged when that publish is best effort
    #[error("downstream publish failure: {0}")]
    DownstreamPublishFailure(String),

    /// The relational store or document sink rejected the write
    #[error("store persistence failure: {0}")]
    StorePersistenceFailure(String),

    /// Anything not anticipated above
    #[error("{0}")]
    UnexpectedException(String),
}

impl ProcessingError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::MalformedMessage(_) => "malformed_message",
            ProcessingError::DownstreamPublishFailure(_) => "downstream_publish_failure",
            ProcessingError::StorePersistenceFailure(_) => "store_persistence_failure",
            ProcessingError::UnexpectedException(_) => "unexpected_exception",
        }
    }
}

/// Terminal state of a received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Completed,
    DeadLettered { reason: String },
}

impl Disposition {
    pub fn is_completed(&self) -> bool {
        matches!(self, Disposition::Completed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Completed => "completed",
            Disposition::DeadLettered { .. } => "dead_lettered",
        }
    }
}

/// Complete or dead-letter a message according to its handler's outcome
///
/// If the dead-letter publish itself fails the error is logged and the
/// message is still reported as dead-lettered; the broker's redelivery is
/// the only remaining safety net.
pub async fn settle<T>(
    bus: &dyn EventBus,
    msg: &BusMessage,
    result: Result<T, ProcessingError>,
) -> Disposition {
    match result {
        Ok(_) => {
            tracing::debug!(subject = %msg.subject, "Message completed");
            Disposition::Completed
        }
        Err(error) => {
            let reason = error.to_string();
            tracing::error!(
                subject = %msg.subject,
                error_kind = error.kind(),
                error = %reason,
                "Message processing failed, sending to DLQ"
            );

            if let Err(e) = dead_letter(bus, msg, &reason).await {
                tracing::error!(
                    subject = %msg.subject,
                    error = %e,
                    "Failed to publish message to DLQ"
                );
            }

            Disposition::DeadLettered { reason }
        }
    }
}
