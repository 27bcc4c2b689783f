pub mod config;
pub mod consumer_task;
pub mod decision;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod routes;
pub mod sink;

pub use consumer_task::{process_message, start_payment_consumer};
pub use decision::{FixedStatusDecider, RandomStatusDecider, SeededStatusDecider, StatusDecider};
pub use handlers::PaymentProcessor;
pub use metrics::Metrics;
pub use models::{PaymentRequest, PaymentResult, PaymentStatus};
pub use notification::{NotificationOutcome, NotificationPublisher, APPROVED_MESSAGE};
pub use sink::{InMemoryPaymentSink, PaymentSink, PgPaymentSink, SinkError};
