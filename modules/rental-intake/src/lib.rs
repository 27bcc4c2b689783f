pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;

pub use error::ApiError;
pub use handlers::{QUEUED_MESSAGE, RENTAL_LABEL};
pub use metrics::Metrics;
pub use models::{IntakeRequest, RentalRequest};
pub use routes::{router, AppState};
