use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body accepted by `POST /api/locacao`
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeRequest {
    #[serde(rename = "nome", alias = "name")]
    pub name: String,
    pub email: String,
    #[serde(rename = "modelo", alias = "model")]
    pub model: String,
    #[serde(rename = "ano", alias = "year")]
    pub year: i32,
    #[serde(rename = "tempoAluguel", alias = "rentalDuration")]
    pub rental_duration: i32,
}

impl IntakeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("nome must not be empty".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("email must not be empty".to_string());
        }
        if !self.email.contains('@') {
            return Err("email must contain '@'".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("modelo must not be empty".to_string());
        }
        if self.year <= 0 {
            return Err("ano must be a positive integer".to_string());
        }
        if self.rental_duration <= 0 {
            return Err("tempoAluguel must be a positive integer".to_string());
        }
        Ok(())
    }

    /// Stamp the request with its intake time
    pub fn into_rental(self, requested_at: DateTime<Utc>) -> RentalRequest {
        RentalRequest {
            name: self.name,
            email: self.email,
            model: self.model,
            year: self.year,
            rental_duration: self.rental_duration,
            requested_at,
        }
    }
}

/// Body of the rental-queue message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "ano")]
    pub year: i32,
    #[serde(rename = "tempoAluguel")]
    pub rental_duration: i32,
    #[serde(rename = "data")]
    pub requested_at: DateTime<Utc>,
}
