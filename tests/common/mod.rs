#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::Engine;
use glasses_overlay::server::{build_router, AppState};
use glasses_overlay::{Compositor, GeminiClient, ImageFetcher, LocalArtifactStore, ServiceConfig};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "gemini-test";

/// A few bytes that start with the PNG signature.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

/// A few bytes that start with the JPEG SOI marker.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

pub fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}

pub fn stream_path() -> String {
    format!("/v1beta/models/{}:streamGenerateContent", TEST_MODEL)
}

pub fn encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// A `generateContent` response carrying one inline image.
pub fn image_response(data: &[u8]) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"inlineData": {"mimeType": "image/png", "data": encode(data)}}]
            },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

pub fn text_response(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Writes the glasses overlay into `dir` and returns its path.
pub fn write_glasses(dir: &Path) -> PathBuf {
    let path = dir.join("glasses.png");
    std::fs::write(&path, PNG_BYTES).unwrap();
    path
}

pub fn test_config(model_base_url: &str, glasses: &Path, output_dir: &Path) -> ServiceConfig {
    ServiceConfig {
        api_key: Some(TEST_API_KEY.to_string()),
        model_name: TEST_MODEL.to_string(),
        gemini_base_url: model_base_url.to_string(),
        glasses_path: glasses.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        public_url: Some("https://glasses.example.com".to_string()),
        ..ServiceConfig::default()
    }
}

pub fn build_compositor(config: &ServiceConfig) -> Compositor<GeminiClient, LocalArtifactStore> {
    let model = GeminiClient::new(config.gemini_settings().unwrap()).unwrap();
    let fetcher = ImageFetcher::new(config.download_timeout()).unwrap();
    Compositor::new(
        model,
        LocalArtifactStore::new(config.output_dir.clone()),
        fetcher,
    )
}

/// Same router the service binary serves.
pub fn build_test_app(config: ServiceConfig) -> Router {
    let compositor = build_compositor(&config);
    build_router(AppState::new(config, compositor))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Names of the files currently in `dir`.
pub fn files_in(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
