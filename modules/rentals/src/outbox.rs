use event_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::Metrics;
use crate::store::{RentalStore, StoreError};

/// Largest batch taken from the outbox per relay pass
pub const RELAY_BATCH_SIZE: i64 = 100;

/// Background task relaying outbox messages to the bus
///
/// Runs [`publish_pending`] on every tick. A message whose publish fails
/// stays pending and is retried on the next tick, so delivery to the payment
/// queue is at-least-once.
pub async fn run_outbox_relay(
    store: Arc<dyn RentalStore>,
    bus: Arc<dyn EventBus>,
    metrics: Metrics,
    poll_interval: Duration,
) {
    tracing::info!(
        interval_ms = poll_interval.as_millis() as u64,
        "Starting outbox relay"
    );

    let mut interval = tokio::time::interval(poll_interval);
    let mut tick_count: u64 = 0;

    loop {
        interval.tick().await;
        tick_count += 1;

        match publish_pending(store.as_ref(), bus.as_ref(), &metrics, RELAY_BATCH_SIZE).await {
            Ok(count) if count > 0 => {
                tracing::info!("Relay tick {}: published {} outbox messages", tick_count, count);
            }
            Ok(_) => {
                if tick_count <= 3 || tick_count % 600 == 0 {
                    tracing::debug!("Relay tick {}: no pending outbox messages", tick_count);
                }
            }
            Err(e) => {
                tracing::error!("Relay tick {}: outbox relay failed: {}", tick_count, e);
            }
        }
    }
}

/// Publish up to `limit` pending outbox messages, oldest first
///
/// Stops at the first publish failure so later messages never overtake an
/// earlier one. Returns the number of messages published and marked. A
/// published message that cannot be marked stays pending and the pass ends
/// with the store error.
pub async fn publish_pending(
    store: &dyn RentalStore,
    bus: &dyn EventBus,
    metrics: &Metrics,
    limit: i64,
) -> Result<usize, StoreError> {
    let pending = store.fetch_unpublished(limit).await?;
    let mut published = 0;

    for message in pending {
        let payload = serde_json::to_vec(&message.payload)?;

        if let Err(e) = bus
            .publish_with_headers(&message.subject, message.headers.clone(), payload)
            .await
        {
            metrics.outbox_publish_failures_total.inc();
            tracing::error!(
                message_id = %message.message_id,
                subject = %message.subject,
                error = %e,
                "Failed to publish outbox message, will retry"
            );
            break;
        }

        if let Err(e) = store.mark_published(message.message_id).await {
            tracing::error!(
                message_id = %message.message_id,
                subject = %message.subject,
                error = %e,
                "Failed to mark outbox message published, it will be re-published"
            );
            return Err(e);
        }
        metrics.outbox_published_total.inc();
        published += 1;

        tracing::info!(
            message_id = %message.message_id,
            subject = %message.subject,
            "Message sent to payment queue"
        );
    }

    Ok(published)
}
