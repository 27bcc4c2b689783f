//! # EventBus Abstraction
//!
//! Queue plumbing shared by the intake endpoint and the two processors.
//!
//! ## Implementations
//!
//! - **NatsBus**: Production implementation backed by a NATS server
//! - **InMemoryBus**: Test/dev implementation using in-memory channels
//!
//! ## Message settlement
//!
//! A consumer hands the outcome of its handler to [`settle`]. Successful
//! handling completes the message; any [`ProcessingError`] moves the original
//! payload to `<subject>.dlq` with the error text as the dead-letter reason.
//! The application never retries; redelivery is left to the broker.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_bus::{EventBus, InMemoryBus, NatsBus};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Production: NATS
//! let nats_client = async_nats::connect("nats://localhost:4222").await?;
//! let bus: Arc<dyn EventBus> = Arc::new(NatsBus::new(nats_client));
//!
//! // Dev/Test: In-Memory
//! let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
//!
//! let mut headers = HashMap::new();
//! headers.insert("content-type".to_string(), "application/json".to_string());
//! bus.publish_with_headers("payment-queue", headers, br#"{"nome":"Ana"}"#.to_vec())
//!     .await?;
//!
//! let mut stream = bus.subscribe("payment-queue").await?;
//! while let Some(msg) = futures::StreamExt::next(&mut stream).await {
//!     println!("Received: {} bytes on {}", msg.payload.len(), msg.subject);
//! }
//! # Ok(())
//! # }
//! ```

mod dlq;
mod inmemory_bus;
mod nats_bus;
mod settlement;

pub use dlq::{
    dead_letter, dead_letter_subject, DEAD_LETTERED_AT_HEADER, DEAD_LETTER_REASON_HEADER,
    DEAD_LETTER_SOURCE_HEADER,
};
pub use inmemory_bus::InMemoryBus;
pub use nats_bus::NatsBus;
pub use settlement::{settle, Disposition, ProcessingError};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::fmt;

/// Header carrying the payload media type
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// Media type of every payload exchanged on the bus
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A message received from the event bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The subject/queue this message was published to
    pub subject: String,
    /// The message payload (raw bytes)
    pub payload: Vec<u8>,
    /// String metadata attached by the publisher
    pub headers: Option<HashMap<String, String>>,
    /// Optional reply-to subject (for request-response patterns)
    pub reply_to: Option<String>,
}

impl BusMessage {
    /// Create a new bus message
    pub fn new(subject: String, payload: Vec<u8>) -> Self {
        Self {
            subject,
            payload,
            headers: None,
            reply_to: None,
        }
    }

    /// Add headers to the message
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a reply-to subject
    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(String::as_str)
    }
}

/// Errors that can occur when using the event bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    PublishError(String),

    #[error("failed to subscribe to subject: {0}")]
    SubscribeError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid subject pattern: {0}")]
    InvalidSubject(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Core publish-subscribe abstraction
///
/// Implementations deliver whatever the underlying broker gives for free.
/// Ordering, redelivery and acknowledgement policies stay with the broker.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message without metadata
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Publish a message with string metadata
    ///
    /// Headers travel next to the body so downstream consumers can filter
    /// on them without parsing the payload.
    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()>;

    /// Subscribe to messages matching a subject pattern
    ///
    /// # Arguments
    /// * `subject` - The subject pattern to subscribe to (supports wildcards: `*`, `>`)
    ///   - `*` matches a single token (e.g., `rentals.*.requested`)
    ///   - `>` matches one or more tokens (e.g., `rentals.>`)
    ///
    /// # Example
    /// ```rust,no_run
    /// # use event_bus::{EventBus, InMemoryBus};
    /// # use futures::StreamExt;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let bus = InMemoryBus::new();
    /// let mut stream = bus.subscribe("fila-locacao-auto").await?;
    /// while let Some(msg) = stream.next().await {
    ///     // Process message
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>>;
}

impl fmt::Debug for dyn EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus")
    }
}

/// Headers every JSON payload carries
pub fn json_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        CONTENT_TYPE_HEADER.to_string(),
        JSON_CONTENT_TYPE.to_string(),
    );
    headers
}
