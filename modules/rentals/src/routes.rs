use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct MetricsState {
    pub metrics: Metrics,
}

pub fn router(metrics: Metrics) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(Arc::new(MetricsState { metrics }))
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
        "module": "rentals",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn render_metrics(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics error: {e}")),
    }
}

