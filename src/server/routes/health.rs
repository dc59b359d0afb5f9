use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::server::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Always healthy; the model and the image hosts are not contacted.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "glasses-overlay-api",
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
