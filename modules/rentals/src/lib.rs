pub mod config;
pub mod consumer_task;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod outbox;
pub mod routes;
pub mod store;

pub use consumer_task::{process_message, start_rental_consumer};
pub use handlers::{RecordedRental, RentalProcessor};
pub use metrics::Metrics;
pub use models::{OutboxMessage, RentalRecord, RentalRequest};
pub use outbox::{publish_pending, run_outbox_relay, RELAY_BATCH_SIZE};
pub use store::{InMemoryRentalStore, PgRentalStore, RentalStore, StoreError};
