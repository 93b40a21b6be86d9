//! Text-to-image stage handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use mvforge_comfy::{select_output, SelectionPolicy};
use mvforge_core::JobId;
use mvforge_pipeline::StageRequest;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub job_id: JobId,
    pub filename: String,
    pub image: String,
}

/// `POST /api/v1/generate`
///
/// Runs the text-to-image workflow and responds with the URL of the
/// saved image. The save node's output comes last in the result
/// document, so the last reference is the one to return.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".into()));
    }

    let stage = StageRequest::TextToImage {
        prompt: request.prompt,
        negative_prompt: request.negative_prompt,
    };
    let outcome = state
        .pipeline
        .run_stage(&stage, &CancellationToken::new())
        .await?;

    let image = select_output(
        &outcome.result,
        state.pipeline.output_base_url(),
        &SelectionPolicy::Last,
    )?;

    tracing::info!(job_id = %outcome.job_id, filename = %image.filename, "Image generated");

    Ok(Json(GenerateResponse {
        status: "completed",
        job_id: outcome.job_id,
        filename: image.filename,
        image: image.url,
    }))
}
