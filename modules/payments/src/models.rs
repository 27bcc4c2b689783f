use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// INCOMING MESSAGE PAYLOADS
// ============================================================================

/// Body of a payment-queue message
///
/// Carries every rental field forward unchanged. Wire names follow the
/// rental intake contract; English aliases are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
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

// ============================================================================
// OUTGOING PAYLOADS
// ============================================================================

/// Outcome of the payment decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Approved,
    Rejected,
    UnderReview,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Approved,
        PaymentStatus::Rejected,
        PaymentStatus::UnderReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Rejected => "Rejected",
            PaymentStatus::UnderReview => "UnderReview",
        }
    }
}

/// Payment document written to the sink and, on approval, sent to the
/// notification queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub payment_id: String,
    #[serde(flatten)]
    pub request: PaymentRequest,
    pub status: PaymentStatus,
    /// Set iff `status` is `Approved`
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl PaymentResult {
    /// Build a result for a freshly decided request
    pub fn assign(request: PaymentRequest, status: PaymentStatus, decided_at: DateTime<Utc>) -> Self {
        let approved_at = match status {
            PaymentStatus::Approved => Some(decided_at),
            PaymentStatus::Rejected | PaymentStatus::UnderReview => None,
        };

        Self {
            payment_id: Uuid::new_v4().to_string(),
            request,
            status,
            approved_at,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == PaymentStatus::Approved
    }
}
