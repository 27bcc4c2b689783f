use event_bus::{settle, BusMessage, BusResult, Disposition, EventBus};
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::handlers::RentalProcessor;

/// Start the consumer task for the rental queue
///
/// Subscribes before returning; each message is settled before the next one
/// is read.
pub async fn start_rental_consumer(
    bus: Arc<dyn EventBus>,
    processor: Arc<RentalProcessor>,
    subject: String,
) -> BusResult<JoinHandle<()>> {
    let mut stream = bus.subscribe(&subject).await?;
    tracing::info!(subject = %subject, "Subscribed to rental queue");

    Ok(tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            let span = tracing::info_span!(
                "process_rental",
                subject = %msg.subject,
                label = %msg.header("label").unwrap_or("none"),
            );

            process_message(bus.as_ref(), &processor, &msg)
                .instrument(span)
                .await;
        }

        tracing::warn!(subject = %subject, "Rental consumer stopped");
    }))
}

pub async fn process_message(
    bus: &dyn EventBus,
    processor: &RentalProcessor,
    msg: &BusMessage,
) -> Disposition {
    tracing::debug!(
        payload_bytes = msg.payload.len(),
        content_type = %msg.header(event_bus::CONTENT_TYPE_HEADER).unwrap_or("none"),
        "Rental message received"
    );

    let result = processor.handle(msg).await;
    let disposition = settle(bus, msg, result).await;

    processor
        .metrics()
        .rentals_messages_total
        .with_label_values(&[disposition.label()])
        .inc();

    disposition
}
