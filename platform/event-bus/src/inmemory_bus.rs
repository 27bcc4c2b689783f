//! In-memory implementation of the EventBus trait for testing and development

use crate::{BusMessage, BusResult, EventBus};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// EventBus implementation using in-memory channels
///
/// Suitable for unit tests, local development without a broker, and the
/// in-process end-to-end scenarios. Messages are broadcast to every
/// subscriber whose pattern matches; there is no persistence and no
/// redelivery, so a message published before anyone subscribes is lost.
///
/// # Example
/// ```rust
/// use event_bus::{EventBus, InMemoryBus};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryBus::new();
///
/// // Subscribe before publishing
/// let mut stream = bus.subscribe("payment-queue").await?;
///
/// bus.publish("payment-queue", b"hello".to_vec()).await?;
///
/// let msg = stream.next().await.unwrap();
/// assert_eq!(msg.subject, "payment-queue");
/// assert_eq!(msg.payload, b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryBus {
    // One broadcast channel for all subjects; subscribers filter by pattern
    sender: Arc<broadcast::Sender<BusMessage>>,
}

impl InMemoryBus {
    /// Create a new in-memory event bus
    ///
    /// The bus buffers up to 1000 messages per lagging subscriber.
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create a new in-memory event bus with a custom buffer size
    pub fn with_capacity(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Check if a subject matches a subscription pattern
    ///
    /// Supports NATS-style wildcards:
    /// - `*` matches exactly one token
    /// - `>` matches one or more tokens
    fn matches_pattern(subject: &str, pattern: &str) -> bool {
        let subject_tokens: Vec<&str> = subject.split('.').collect();
        let pattern_tokens: Vec<&str> = pattern.split('.').collect();

        let mut s_idx = 0;
        let mut p_idx = 0;

        while s_idx < subject_tokens.len() && p_idx < pattern_tokens.len() {
            let pattern_token = pattern_tokens[p_idx];

            if pattern_token == ">" {
                return true;
            } else if pattern_token == "*" || subject_tokens[s_idx] == pattern_token {
                s_idx += 1;
                p_idx += 1;
            } else {
                return false;
            }
        }

        // Both must be exhausted for a full match (unless pattern ended with `>`)
        s_idx == subject_tokens.len() && p_idx == pattern_tokens.len()
    }

    fn broadcast(&self, msg: BusMessage) {
        // No receivers is fine: the message is simply dropped
        let _ = self.sender.send(msg);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.broadcast(BusMessage::new(subject.to_string(), payload));
        Ok(())
    }

    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        let msg = BusMessage::new(subject.to_string(), payload).with_headers(headers);
        self.broadcast(msg);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let mut receiver = self.sender.subscribe();
        let pattern = pattern.to_string();

        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if Self::matches_pattern(&msg.subject, &pattern) {
                            yield msg;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            pattern = %pattern,
                            skipped = skipped,
                            "InMemoryBus subscriber lagged, messages skipped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}
