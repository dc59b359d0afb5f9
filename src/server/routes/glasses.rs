use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::core::compositor::glasses_overlay_job;
use crate::domain::model::{CompositeReport, ImageSource};
use crate::server::error::{AppError, AppResult};
use crate::server::state::AppState;
use crate::utils::error::OverlayError;
use crate::utils::validation::validate_url;

#[derive(Debug, Deserialize)]
pub struct GlassesRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlassesResponse {
    pub success: bool,
    pub message: String,
    pub image_url: Option<String>,
    pub local_path: Option<String>,
}

impl GlassesResponse {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            image_url: None,
            local_path: None,
        }
    }
}

/// `POST /add-glasses`: only a malformed request is an HTTP error; every
/// processing failure is a 200 with `success: false`.
async fn add_glasses(
    State(state): State<AppState>,
    payload: Result<Json<GlassesRequest>, JsonRejection>,
) -> AppResult<Json<GlassesResponse>> {
    let Json(request) = payload?;
    let url = validate_url("image_url", &request.image_url)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    tracing::info!("Adding glasses to {}", url);
    let job = glasses_overlay_job(
        ImageSource::Url(url),
        state.config.glasses_path.clone(),
        None,
    );

    let response = match state.compositor.run(&job).await {
        Ok(report) => succeeded(&state, &report),
        Err(err) => {
            tracing::warn!("Glasses request failed: {}", err);
            GlassesResponse::failed(failure_message(&err))
        }
    };
    Ok(Json(response))
}

fn succeeded(state: &AppState, report: &CompositeReport) -> GlassesResponse {
    match report.first_artifact() {
        Some(artifact) => GlassesResponse {
            success: true,
            message: "Glasses added successfully!".to_string(),
            image_url: Some(format!(
                "{}/output/{}",
                state.config.public_base_url(),
                artifact.file_name
            )),
            local_path: Some(artifact.path.display().to_string()),
        },
        None => GlassesResponse::failed(failure_message(&OverlayError::NoImageGenerated {
            text: None,
        })),
    }
}

fn failure_message(err: &OverlayError) -> String {
    match err {
        OverlayError::DownloadError { source, .. } => {
            format!("Failed to download image: {}", source)
        }
        other => format!("Error processing image: {}", other),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/add-glasses", post(add_glasses))
}
