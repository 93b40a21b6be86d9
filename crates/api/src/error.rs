use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mvforge_comfy::{OutputError, PollError};
use mvforge_pipeline::{StageError, ViewLabelError};

/// Application-level error type for HTTP handlers.
///
/// Wraps pipeline and queue errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A stage failed while rendering, submitting, or polling.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// A completed job carried no usable output reference.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The multiview stage produced the wrong number of outputs.
    #[error(transparent)]
    View(#[from] ViewLabelError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A filesystem operation on generated/uploaded files failed.
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Stage(stage) => match stage {
                StageError::Poll(PollError::Timeout { .. }) => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "POLL_TIMEOUT",
                    self.to_string(),
                ),
                StageError::Poll(PollError::Cancelled { .. }) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CANCELLED",
                    self.to_string(),
                ),
                StageError::Poll(_) => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", self.to_string())
                }
                StageError::Submit(_) => {
                    (StatusCode::BAD_GATEWAY, "SUBMIT_FAILED", self.to_string())
                }
                StageError::Template(e) => {
                    tracing::error!(error = %e, "Template rendering failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "TEMPLATE_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Output(OutputError::NotFound) => {
                (StatusCode::BAD_GATEWAY, "NO_OUTPUT", self.to_string())
            }

            AppError::View(_) => (StatusCode::BAD_GATEWAY, "VIEW_MISMATCH", self.to_string()),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),

            AppError::Io(e) => {
                tracing::error!(error = %e, "File operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
