use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use event_bus::EventBus;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::create_rental;
use crate::metrics::Metrics;

pub struct AppState {
    pub bus: Arc<dyn EventBus>,
    pub rental_queue: String,
    pub metrics: Metrics,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/locacao", post(create_rental))
        .route("/api/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "module": "rental-intake",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn render_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics error: {e}")),
    }
}
