use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Body of a rental-queue message, as stamped by the intake endpoint
///
/// The same JSON shape is forwarded to the payment queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    #[serde(rename = "nome", alias = "name", alias = "Nome")]
    pub name: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(rename = "modelo", alias = "model", alias = "Modelo")]
    pub model: String,
    #[serde(rename = "ano", alias = "year", alias = "Ano")]
    pub year: i32,
    #[serde(rename = "tempoAluguel", alias = "rentalDuration", alias = "TempoAluguel")]
    pub rental_duration: i32,
    #[serde(rename = "data", alias = "requestedAt", alias = "Data")]
    pub requested_at: DateTime<Utc>,
}

impl RentalRequest {
    /// Metadata published next to the payment request
    pub fn payment_headers(&self) -> HashMap<String, String> {
        let mut headers = event_bus::json_headers();
        headers.insert("type".to_string(), "payment".to_string());
        headers.insert("name".to_string(), self.name.clone());
        headers.insert("email".to_string(), self.email.clone());
        headers.insert("model".to_string(), self.model.clone());
        headers.insert("year".to_string(), self.year.to_string());
        headers.insert(
            "rentalDuration".to_string(),
            self.rental_duration.to_string(),
        );
        headers.insert(
            "timestamp".to_string(),
            self.requested_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        headers
    }
}

/// A payment-queue message waiting in the outbox
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub message_id: Uuid,
    pub subject: String,
    pub headers: HashMap<String, String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    /// Outbox entry forwarding `rental` to the payment queue
    pub fn payment_request(
        rental: &RentalRequest,
        subject: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            subject: subject.into(),
            headers: rental.payment_headers(),
            payload: serde_json::to_value(rental)?,
            created_at: Utc::now(),
        })
    }
}

/// Rental row as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct RentalRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub model: String,
    pub year: i32,
    pub rental_duration: i32,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rental() -> RentalRequest {
        serde_json::from_value(json!({
            "nome": "Ana",
            "email": "ana@x.com",
            "modelo": "Civic",
            "ano": 2022,
            "tempoAluguel": 7,
            "data": "2026-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_accepts_english_aliases() {
        let parsed: RentalRequest = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana@x.com",
            "model": "Civic",
            "year": 2022,
            "rentalDuration": 7,
            "requestedAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(parsed, rental());
    }

    #[test]
    fn test_accepts_pascal_case_keys() {
        let parsed: RentalRequest = serde_json::from_value(json!({
            "Nome": "Ana",
            "Email": "ana@x.com",
            "Modelo": "Civic",
            "Ano": 2022,
            "TempoAluguel": 7,
            "Data": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(parsed, rental());
    }

    #[test]
    fn test_rejects_missing_date() {
        let result = serde_json::from_value::<RentalRequest>(json!({
            "nome": "Ana",
            "email": "ana@x.com",
            "modelo": "Civic",
            "ano": 2022,
            "tempoAluguel": 7
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_payment_headers() {
        let headers = rental().payment_headers();

        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["type"], "payment");
        assert_eq!(headers["name"], "Ana");
        assert_eq!(headers["model"], "Civic");
        assert_eq!(headers["year"], "2022");
        assert_eq!(headers["rentalDuration"], "7");
        assert_eq!(headers["timestamp"], "2026-03-01T10:00:00.000Z");
    }

    #[test]
    fn test_outbox_payload_keeps_wire_names() {
        let message = OutboxMessage::payment_request(&rental(), "payment-queue").unwrap();

        assert_eq!(message.subject, "payment-queue");
        assert_eq!(message.payload["nome"], "Ana");
        assert_eq!(message.payload["tempoAluguel"], 7);
        assert_eq!(message.payload["data"], "2026-03-01T10:00:00Z");
    }
}
