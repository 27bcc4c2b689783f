//! Integration tests for the payment processor
//!
//! Runs payment-queue messages through `process_message` against the
//! in-memory bus and sink. The Postgres sink test needs DATABASE_URL and is
//! ignored by default.

use async_trait::async_trait;
use event_bus::{
    dead_letter_subject, BusError, BusMessage, BusResult, EventBus, InMemoryBus,
    DEAD_LETTER_REASON_HEADER,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use payments_rs::{
    process_message, start_payment_consumer, FixedStatusDecider, InMemoryPaymentSink, Metrics,
    NotificationPublisher, PaymentProcessor, PaymentResult, PaymentSink, PaymentStatus,
    SinkError, APPROVED_MESSAGE,
};
use serde_json::json;
use serial_test::serial;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const PAYMENT_QUEUE: &str = "payment-queue";
const NOTIFICATION_QUEUE: &str = "notification-queue";

fn payment_message(body: serde_json::Value) -> BusMessage {
    BusMessage::new(PAYMENT_QUEUE.to_string(), serde_json::to_vec(&body).unwrap())
        .with_headers(event_bus::json_headers())
}

fn rental_body() -> serde_json::Value {
    json!({
        "nome": "Ana",
        "email": "ana@x.com",
        "modelo": "Civic",
        "ano": 2022,
        "tempoAluguel": 7,
        "data": "2026-03-01T10:00:00Z"
    })
}

fn processor(
    bus: Arc<dyn EventBus>,
    status: PaymentStatus,
    sink: Arc<dyn PaymentSink>,
) -> PaymentProcessor {
    PaymentProcessor::new(
        Arc::new(FixedStatusDecider(status)),
        sink,
        NotificationPublisher::new(bus, NOTIFICATION_QUEUE, Duration::from_millis(500)),
        Metrics::new().unwrap(),
    )
}

async fn next_within(
    stream: &mut BoxStream<'static, BusMessage>,
    wait: Duration,
) -> Option<BusMessage> {
    tokio::time::timeout(wait, stream.next()).await.ok().flatten()
}

/// Sink that rejects every write
struct FailingSink;

#[async_trait]
impl PaymentSink for FailingSink {
    async fn upsert(&self, _result: &PaymentResult) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("connection refused".to_string()))
    }
}

/// Bus that refuses publishes on one subject and delegates everything else
struct RefusingBus {
    inner: InMemoryBus,
    refused_subject: String,
}

#[async_trait]
impl EventBus for RefusingBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.publish_with_headers(subject, HashMap::new(), payload)
            .await
    }

    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        if subject == self.refused_subject {
            return Err(BusError::PublishError(format!("{subject} unavailable")));
        }
        self.inner.publish_with_headers(subject, headers, payload).await
    }

    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        self.inner.subscribe(subject).await
    }
}

#[tokio::test]
async fn test_approved_payment_notifies_once_and_persists() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(InMemoryPaymentSink::new());
    let processor = processor(bus.clone(), PaymentStatus::Approved, sink.clone());

    let mut notifications = bus.subscribe(NOTIFICATION_QUEUE).await.unwrap();
    let mut dlq = bus.subscribe(&dead_letter_subject(PAYMENT_QUEUE)).await.unwrap();

    let disposition = process_message(&*bus, &processor, &payment_message(rental_body())).await;
    assert!(disposition.is_completed());

    let notification = next_within(&mut notifications, Duration::from_millis(200))
        .await
        .expect("approval notification");
    assert_eq!(notification.header("type"), Some("notification"));
    assert_eq!(notification.header("message"), Some(APPROVED_MESSAGE));

    let body: PaymentResult = serde_json::from_slice(&notification.payload).unwrap();
    assert_eq!(body.status, PaymentStatus::Approved);
    assert!(body.approved_at.is_some());
    assert_eq!(body.request.name, "Ana");
    assert_eq!(body.request.model, "Civic");
    assert_eq!(notification.header("paymentId"), Some(body.payment_id.as_str()));

    assert!(next_within(&mut notifications, Duration::from_millis(50)).await.is_none());
    assert!(next_within(&mut dlq, Duration::from_millis(50)).await.is_none());

    let stored = sink.get(&body.payment_id).expect("document in sink");
    assert_eq!(stored, body);

    let rendered = processor.metrics().render().unwrap();
    assert!(rendered.contains("payments_notifications_total{outcome=\"sent\"} 1"));
    assert!(rendered.contains("payments_messages_total{disposition=\"completed\"} 1"));
}

#[tokio::test]
async fn test_non_approved_payments_do_not_notify() {
    for status in [PaymentStatus::Rejected, PaymentStatus::UnderReview] {
        let bus = Arc::new(InMemoryBus::new());
        let sink = Arc::new(InMemoryPaymentSink::new());
        let processor = processor(bus.clone(), status, sink.clone());
        let mut notifications = bus.subscribe(NOTIFICATION_QUEUE).await.unwrap();

        let disposition =
            process_message(&*bus, &processor, &payment_message(rental_body())).await;

        assert!(disposition.is_completed());
        assert!(next_within(&mut notifications, Duration::from_millis(50)).await.is_none());

        let documents = sink.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].status, status);
        assert!(documents[0].approved_at.is_none());
    }
}

#[tokio::test]
async fn test_invalid_json_is_dead_lettered_without_sink_write() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(InMemoryPaymentSink::new());
    let processor = processor(bus.clone(), PaymentStatus::Approved, sink.clone());

    let mut dlq = bus.subscribe(&dead_letter_subject(PAYMENT_QUEUE)).await.unwrap();
    let mut notifications = bus.subscribe(NOTIFICATION_QUEUE).await.unwrap();

    let msg = BusMessage::new(PAYMENT_QUEUE.to_string(), b"{not json".to_vec());
    let disposition = process_message(&*bus, &processor, &msg).await;
    assert!(!disposition.is_completed());

    let dead = next_within(&mut dlq, Duration::from_millis(200))
        .await
        .expect("dead-lettered message");
    assert_eq!(dead.payload, b"{not json".to_vec());
    assert!(dead
        .header(DEAD_LETTER_REASON_HEADER)
        .unwrap()
        .starts_with("could not deserialize"));

    assert!(sink.is_empty());
    assert!(next_within(&mut notifications, Duration::from_millis(50)).await.is_none());
}

#[tokio::test]
async fn test_missing_field_is_dead_lettered() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(InMemoryPaymentSink::new());
    let processor = processor(bus.clone(), PaymentStatus::Rejected, sink.clone());
    let mut dlq = bus.subscribe(&dead_letter_subject(PAYMENT_QUEUE)).await.unwrap();

    let mut body = rental_body();
    body.as_object_mut().unwrap().remove("email");

    let disposition = process_message(&*bus, &processor, &payment_message(body)).await;

    assert!(!disposition.is_completed());
    assert!(next_within(&mut dlq, Duration::from_millis(200)).await.is_some());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_sink_failure_dead_letters_message() {
    let bus = Arc::new(InMemoryBus::new());
    let processor = processor(bus.clone(), PaymentStatus::Rejected, Arc::new(FailingSink));
    let mut dlq = bus.subscribe(&dead_letter_subject(PAYMENT_QUEUE)).await.unwrap();

    let disposition = process_message(&*bus, &processor, &payment_message(rental_body())).await;

    assert!(!disposition.is_completed());
    let dead = next_within(&mut dlq, Duration::from_millis(200))
        .await
        .expect("dead-lettered message");
    assert!(dead
        .header(DEAD_LETTER_REASON_HEADER)
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_notification_failure_still_completes() {
    let bus = Arc::new(RefusingBus {
        inner: InMemoryBus::new(),
        refused_subject: NOTIFICATION_QUEUE.to_string(),
    });
    let sink = Arc::new(InMemoryPaymentSink::new());
    let processor = processor(bus.clone(), PaymentStatus::Approved, sink.clone());
    let mut dlq = bus.subscribe(&dead_letter_subject(PAYMENT_QUEUE)).await.unwrap();

    let disposition = process_message(&*bus, &processor, &payment_message(rental_body())).await;

    assert!(disposition.is_completed());
    assert!(next_within(&mut dlq, Duration::from_millis(50)).await.is_none());

    let documents = sink.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].status, PaymentStatus::Approved);

    let rendered = processor.metrics().render().unwrap();
    assert!(rendered.contains("payments_notifications_total{outcome=\"failed\"} 1"));
}

#[tokio::test]
async fn test_consumer_task_processes_published_messages() {
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
    let sink = Arc::new(InMemoryPaymentSink::new());
    let processor = Arc::new(processor(bus.clone(), PaymentStatus::UnderReview, sink.clone()));

    let handle = start_payment_consumer(bus.clone(), processor, PAYMENT_QUEUE.to_string())
        .await
        .unwrap();

    for _ in 0..3 {
        bus.publish_with_headers(
            PAYMENT_QUEUE,
            event_bus::json_headers(),
            serde_json::to_vec(&rental_body()).unwrap(),
        )
        .await
        .unwrap();
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while sink.len() < 3 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert_eq!(sink.len(), 3);
}

#[tokio::test]
#[serial]
#[ignore] // Requires Postgres at DATABASE_URL
async fn test_postgres_sink_upserts_document() {
    use payments_rs::PgPaymentSink;
    use sqlx::postgres::PgPoolOptions;

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(PgPaymentSink::new(pool.clone()));
    let processor = processor(bus.clone(), PaymentStatus::Approved, sink);

    let result = processor
        .handle(&payment_message(rental_body()))
        .await
        .expect("payment handled");

    let (status, document): (String, serde_json::Value) = sqlx::query_as(
        "SELECT status, document FROM payment_documents WHERE payment_id = $1",
    )
    .bind(&result.payment_id)
    .fetch_one(&pool)
    .await
    .expect("document row");

    assert_eq!(status, "Approved");
    assert_eq!(document["paymentId"], json!(result.payment_id));
    assert_eq!(document["nome"], json!("Ana"));

    sqlx::query("DELETE FROM payment_documents WHERE payment_id = $1")
        .bind(&result.payment_id)
        .execute(&pool)
        .await
        .expect("cleanup");
}
