use std::collections::HashMap;

use chrono::Utc;

use crate::{BusMessage, BusResult, EventBus};

/// Why the message was dead-lettered
pub const DEAD_LETTER_REASON_HEADER: &str = "dead-letter-reason";
/// RFC 3339 timestamp of the dead-lettering
pub const DEAD_LETTERED_AT_HEADER: &str = "dead-lettered-at";
/// Subject the message was originally received on
pub const DEAD_LETTER_SOURCE_HEADER: &str = "dead-letter-source";

/// Dead-letter destination for a queue
pub fn dead_letter_subject(subject: &str) -> String {
    format!("{}.dlq", subject)
}

/// Move an unprocessable message to its dead-letter destination
///
/// The original payload and headers are kept byte-for-byte; the reason,
/// source subject and time are added as headers. The message is never
/// retried by the application.
pub async fn dead_letter(bus: &dyn EventBus, msg: &BusMessage, reason: &str) -> BusResult<()> {
    let mut headers: HashMap<String, String> = msg.headers.clone().unwrap_or_default();
    headers.insert(DEAD_LETTER_REASON_HEADER.to_string(), reason.to_string());
    headers.insert(DEAD_LETTER_SOURCE_HEADER.to_string(), msg.subject.clone());
    headers.insert(DEAD_LETTERED_AT_HEADER.to_string(), Utc::now().to_rfc3339());

    let subject = dead_letter_subject(&msg.subject);
    bus.publish_with_headers(&subject, headers, msg.payload.clone())
        .await?;

    tracing::error!(
        subject = %msg.subject,
        dlq_subject = %subject,
        reason = %reason,
        "Message moved to DLQ"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBus;
    use futures::StreamExt;
    use std::time::Duration;

    #[test]
    fn test_dead_letter_subject() {
        assert_eq!(dead_letter_subject("payment-queue"), "payment-queue.dlq");
    }

    #[tokio::test]
    async fn test_dead_letter_preserves_payload_and_headers() {
        let bus = InMemoryBus::new();
        let mut dlq = bus.subscribe("payment-queue.dlq").await.unwrap();

        let mut headers = crate::json_headers();
        headers.insert("type".to_string(), "payment".to_string());
        let msg = BusMessage::new("payment-queue".to_string(), b"not json".to_vec())
            .with_headers(headers);

        dead_letter(&bus, &msg, "could not deserialize").await.unwrap();

        let dead = tokio::time::timeout(Duration::from_secs(1), dlq.next())
            .await
            .expect("timeout")
            .expect("stream ended");

        assert_eq!(dead.payload, b"not json");
        assert_eq!(dead.header("type"), Some("payment"));
        assert_eq!(dead.header(DEAD_LETTER_REASON_HEADER), Some("could not deserialize"));
        assert_eq!(dead.header(DEAD_LETTER_SOURCE_HEADER), Some("payment-queue"));
        assert!(dead.header(DEAD_LETTERED_AT_HEADER).is_some());
    }
}
