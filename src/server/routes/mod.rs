pub mod glasses;
pub mod health;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::server::state::AppState;

#[derive(Serialize)]
struct ApiInfo {
    name: &'static str,
    version: &'static str,
    endpoints: BTreeMap<&'static str, &'static str>,
}

async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "Glasses Overlay API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: BTreeMap::from([
            ("POST /add-glasses", "Add glasses to an image from URL"),
            ("GET /health", "Health check endpoint"),
            ("GET /output/{file}", "Download a generated image"),
        ]),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(api_info))
}
