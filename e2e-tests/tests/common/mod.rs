//! In-process wiring of intake, rental processor and payment processor on one bus

#![allow(dead_code)]

use axum::Router;
use event_bus::{BusMessage, EventBus};
use futures::stream::BoxStream;
use futures::StreamExt;
use payments_rs::{FixedStatusDecider, InMemoryPaymentSink, NotificationPublisher, PaymentProcessor, PaymentStatus};
use rentals_rs::{InMemoryRentalStore, RentalProcessor};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const RENTAL_QUEUE: &str = "fila-locacao-auto";
pub const PAYMENT_QUEUE: &str = "payment-queue";
pub const NOTIFICATION_QUEUE: &str = "notification-queue";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub struct Pipeline {
    pub intake: Router,
    pub rentals: InMemoryRentalStore,
    pub payments: InMemoryPaymentSink,
    tasks: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Start both consumers and the outbox relay with a fixed payment decision
    pub async fn start(bus: Arc<dyn EventBus>, status: PaymentStatus) -> Self {
        init_tracing();

        let intake = rental_intake::router(Arc::new(rental_intake::AppState {
            bus: bus.clone(),
            rental_queue: RENTAL_QUEUE.to_string(),
            metrics: rental_intake::Metrics::new().expect("intake metrics"),
        }));

        let rentals = InMemoryRentalStore::new();
        let rental_metrics = rentals_rs::Metrics::new().expect("rental metrics");
        let rental_processor = Arc::new(RentalProcessor::new(
            Arc::new(rentals.clone()),
            PAYMENT_QUEUE,
            rental_metrics.clone(),
        ));
        let rental_consumer =
            rentals_rs::start_rental_consumer(bus.clone(), rental_processor, RENTAL_QUEUE.to_string())
                .await
                .expect("rental consumer");
        let relay = tokio::spawn(rentals_rs::run_outbox_relay(
            Arc::new(rentals.clone()),
            bus.clone(),
            rental_metrics,
            Duration::from_millis(20),
        ));

        let payments = InMemoryPaymentSink::new();
        let payment_processor = Arc::new(PaymentProcessor::new(
            Arc::new(FixedStatusDecider(status)),
            Arc::new(payments.clone()),
            NotificationPublisher::new(bus.clone(), NOTIFICATION_QUEUE, Duration::from_secs(1)),
            payments_rs::Metrics::new().expect("payment metrics"),
        ));
        let payment_consumer =
            payments_rs::start_payment_consumer(bus, payment_processor, PAYMENT_QUEUE.to_string())
                .await
                .expect("payment consumer");

        Self {
            intake,
            rentals,
            payments,
            tasks: vec![rental_consumer, relay, payment_consumer],
        }
    }

    /// Wait until the payment sink holds `count` documents
    pub async fn wait_for_payments(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.payments.len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.payments.len() >= count
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub async fn next_within(
    stream: &mut BoxStream<'static, BusMessage>,
    wait: Duration,
) -> Option<BusMessage> {
    tokio::time::timeout(wait, stream.next()).await.ok().flatten()
}
