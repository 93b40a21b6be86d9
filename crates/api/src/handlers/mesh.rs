//! Multiview-to-mesh stage handler.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use mvforge_comfy::{select_output, SelectionPolicy};
use mvforge_core::{JobId, ViewAngle};
use mvforge_pipeline::StageRequest;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeshResponse {
    pub status: &'static str,
    pub job_id: JobId,
    pub filename: String,
    pub model: String,
}

/// `POST /api/v1/generate/mesh`
///
/// Accepts `front`, `back`, and `left` image uploads as multipart form
/// fields, runs the mesh workflow, and copies the exported GLB under a
/// unique name so repeated generations never collide. Uploads are
/// staged in the upload directory only for the duration of the stage
/// and removed afterwards, on success and failure alike.
pub async fn generate_mesh(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<MeshResponse>> {
    let mut uploads: HashMap<ViewAngle, PathBuf> = HashMap::new();
    let staged = stage_uploads(&state, multipart, &mut uploads).await;

    let response = match staged {
        Ok(()) => run_mesh_stage(&state, &uploads).await,
        Err(e) => Err(e),
    };

    // Staged files are queue inputs only; remove whatever was written
    // so the upload directory never accumulates.
    for path in uploads.values() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
        }
    }

    response
}

/// Write each view upload into the staging directory.
async fn stage_uploads(
    state: &AppState,
    mut multipart: Multipart,
    uploads: &mut HashMap<ViewAngle, PathBuf>,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let view = match name.as_str() {
            "front" => ViewAngle::Front,
            "back" => ViewAngle::Back,
            "left" => ViewAngle::Left,
            _ => continue,
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read {name} upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest(format!("{name} upload is empty")));
        }

        let path = state
            .config
            .upload_dir
            .join(format!("{}_{}.png", view, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(view = %view, path = %path.display(), size = bytes.len(), "View upload staged");
        uploads.insert(view, path);
    }

    Ok(())
}

/// Run the mesh workflow and copy the exported GLB under a unique name.
async fn run_mesh_stage(
    state: &AppState,
    uploads: &HashMap<ViewAngle, PathBuf>,
) -> AppResult<Json<MeshResponse>> {
    let path_for = |view: ViewAngle| -> AppResult<String> {
        uploads
            .get(&view)
            .map(|path| path.display().to_string())
            .ok_or_else(|| AppError::BadRequest(format!("missing {view} image upload")))
    };

    let stage = StageRequest::Mesh {
        front_image: path_for(ViewAngle::Front)?,
        back_image: path_for(ViewAngle::Back)?,
        left_image: path_for(ViewAngle::Left)?,
    };
    let outcome = state
        .pipeline
        .run_stage(&stage, &CancellationToken::new())
        .await?;

    let exported = select_output(
        &outcome.result,
        state.pipeline.output_base_url(),
        &SelectionPolicy::Last,
    )?;

    // Copy the export under a unique name; the queue reuses its own
    // counter-based names across runs.
    let source = state.config.output_dir.join(exported.relative_path());
    let unique = format!("Hy3D_textured_{}.glb", uuid::Uuid::new_v4().simple());
    let dest = state.config.model_dir().join(&unique);
    tokio::fs::copy(&source, &dest).await?;

    tracing::info!(job_id = %outcome.job_id, model = %unique, "Mesh generated");

    Ok(Json(MeshResponse {
        status: "completed",
        job_id: outcome.job_id,
        model: format!("{}/files/{}", state.config.public_base_url, unique),
        filename: unique,
    }))
}
