//! NATS-based implementation of the EventBus trait

use crate::{BusError, BusMessage, BusResult, EventBus};
use async_nats::{Client, HeaderMap};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;

/// EventBus implementation backed by a NATS server
///
/// Wraps an `async_nats::Client`. Bus headers map one-to-one onto NATS
/// message headers.
///
/// # Example
/// ```rust,no_run
/// use event_bus::{EventBus, NatsBus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let nats_client = async_nats::connect("nats://localhost:4222").await?;
/// let bus = NatsBus::new(nats_client);
///
/// bus.publish("fila-locacao-auto", b"{}".to_vec()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NatsBus {
    client: Client,
}

impl NatsBus {
    /// Create a new NatsBus from an already-connected client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying NATS client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn to_nats_headers(headers: &HashMap<String, String>) -> HeaderMap {
    let mut nats_headers = HeaderMap::new();
    for (key, value) in headers {
        nats_headers.insert(key.as_str(), value.as_str());
    }
    nats_headers
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        self.client
            .publish_with_headers(subject.to_string(), to_nats_headers(&headers), payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        let stream = subscriber.map(|nats_msg| {
            let mut msg = BusMessage::new(nats_msg.subject.to_string(), nats_msg.payload.to_vec());

            if let Some(reply) = nats_msg.reply {
                msg = msg.with_reply_to(reply.to_string());
            }

            if let Some(nats_headers) = nats_msg.headers {
                let mut headers = HashMap::new();
                for (key, values) in nats_headers.iter() {
                    // Take the first value for each header
                    if let Some(value) = values.first() {
                        headers.insert(key.to_string(), value.to_string());
                    }
                }
                if !headers.is_empty() {
                    msg = msg.with_headers(headers);
                }
            }

            msg
        });

        Ok(stream.boxed())
    }
}
