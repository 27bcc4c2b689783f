use event_bus::{settle, BusMessage, BusResult, Disposition, EventBus};
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::handlers::PaymentProcessor;

/// Start the consumer task for the payment queue
///
/// The subscription is established before this function returns, so
/// messages published afterwards are guaranteed to reach the task. Messages
/// are processed one at a time to completion.
pub async fn start_payment_consumer(
    bus: Arc<dyn EventBus>,
    processor: Arc<PaymentProcessor>,
    subject: String,
) -> BusResult<JoinHandle<()>> {
    let mut stream = bus.subscribe(&subject).await?;
    tracing::info!(subject = %subject, "Subscribed to payment queue");

    Ok(tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            let span = tracing::info_span!(
                "process_payment",
                subject = %msg.subject,
                message_type = %msg.header("type").unwrap_or("unknown"),
            );

            process_message(bus.as_ref(), &processor, &msg)
                .instrument(span)
                .await;
        }

        tracing::warn!(subject = %subject, "Payment consumer stopped");
    }))
}

/// Run one payment-queue message to a terminal state
pub async fn process_message(
    bus: &dyn EventBus,
    processor: &PaymentProcessor,
    msg: &BusMessage,
) -> Disposition {
    tracing::debug!(
        payload_bytes = msg.payload.len(),
        content_type = %msg.header(event_bus::CONTENT_TYPE_HEADER).unwrap_or("none"),
        "Payment message received"
    );

    let result = processor.handle(msg).await;
    let disposition = settle(bus, msg, result).await;

    processor
        .metrics()
        .payments_messages_total
        .with_label_values(&[disposition.label()])
        .inc();

    disposition
}
