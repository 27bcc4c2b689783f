use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::IntakeRequest;
use crate::routes::AppState;

/// Label attached to every rental-queue message
pub const RENTAL_LABEL: &str = "locacao";

pub const QUEUED_MESSAGE: &str = "Rental request queued successfully";

/// POST /api/locacao
pub async fn create_rental(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IntakeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let result = queue_rental(&state, payload).await;
    state.metrics.record(match &result {
        Ok(_) => "queued",
        Err(ApiError::BadRequest(_)) => "invalid",
        Err(_) => "failed",
    });
    result
}

async fn queue_rental(
    state: &AppState,
    payload: Result<Json<IntakeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate().map_err(ApiError::BadRequest)?;

    let rental = request.into_rental(Utc::now());
    let body = serde_json::to_vec(&rental)?;

    let mut headers = event_bus::json_headers();
    headers.insert("label".to_string(), RENTAL_LABEL.to_string());

    state
        .bus
        .publish_with_headers(&state.rental_queue, headers, body)
        .await?;

    tracing::info!(
        subject = %state.rental_queue,
        model = %rental.model,
        requested_at = %rental.requested_at,
        "Rental request queued"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": QUEUED_MESSAGE })),
    ))
}
