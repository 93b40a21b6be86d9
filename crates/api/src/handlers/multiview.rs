//! Image-to-multiview stage handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use mvforge_core::{JobId, ViewAngle};
use mvforge_pipeline::{label_views, view_filename, StageRequest};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MultiviewRequest {
    /// File name of a previously generated image in the output directory.
    pub reference_filename: String,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ViewImage {
    pub view: ViewAngle,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MultiviewResponse {
    pub status: &'static str,
    pub job_id: JobId,
    pub views: Vec<ViewImage>,
}

/// `POST /api/v1/generate/multiview`
///
/// Runs the multiview workflow against a previously generated reference
/// image, then renames the three view renders to carry explicit
/// front/back/left labels so downstream consumers never depend on
/// generation order.
pub async fn generate_multiview(
    State(state): State<AppState>,
    Json(request): Json<MultiviewRequest>,
) -> AppResult<Json<MultiviewResponse>> {
    let filename = request.reference_filename.trim();
    if filename.is_empty() {
        return Err(AppError::BadRequest(
            "reference_filename must not be empty".into(),
        ));
    }
    // The reference must name a file directly inside the output
    // directory; reject anything that could escape it.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::BadRequest(
            "reference_filename must be a bare file name".into(),
        ));
    }

    let reference_path = state.config.output_dir.join(filename);
    if !tokio::fs::try_exists(&reference_path).await.unwrap_or(false) {
        return Err(AppError::BadRequest(format!(
            "reference image {filename} not found"
        )));
    }

    let stage = StageRequest::Multiview {
        reference_image: reference_path.display().to_string(),
        prompt: request.prompt,
    };
    let outcome = state
        .pipeline
        .run_stage(&stage, &CancellationToken::new())
        .await?;

    let labeled = label_views(&outcome.outputs)?;

    let mut views = Vec::with_capacity(labeled.len());
    for (view, reference) in labeled {
        let new_name = view_filename(&reference.filename, view);
        let old_path = state.config.output_dir.join(reference.relative_path());
        let new_path = state.config.output_dir.join(&new_name);
        tokio::fs::rename(&old_path, &new_path).await?;

        tracing::debug!(
            view = %view,
            from = %reference.filename,
            to = %new_name,
            "View render labeled",
        );

        views.push(ViewImage {
            view,
            url: format!("{}/{}", state.pipeline.output_base_url(), new_name),
            filename: new_name,
        });
    }

    tracing::info!(job_id = %outcome.job_id, views = views.len(), "Multiview set generated");

    Ok(Json(MultiviewResponse {
        status: "completed",
        job_id: outcome.job_id,
        views,
    }))
}
