//! HTTP client for the queue's submission endpoint.
//!
//! Wraps the `/prompt` endpoint using [`reqwest`]. Submission is a single
//! request with no automatic retry: the remote side is not known to be
//! idempotent, so a blind retry could queue duplicate work.

use mvforge_core::JobId;

/// HTTP client for a single ComfyUI-compatible server.
///
/// Holds no per-job state; a single instance may serve any number of
/// concurrent submissions and polls.
pub struct ComfyClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from workflow submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The queue returned a non-2xx status code.
    #[error("Queue API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The submission response parsed as JSON but carried no `prompt_id`.
    #[error("Submission response missing prompt_id field")]
    MissingJobId,

    /// The submission response carried an empty `prompt_id`.
    #[error("Submission response contained an empty prompt_id")]
    EmptyJobId,
}

impl ComfyClient {
    /// Create a new client for a queue server.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8188`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize(base_url.into()),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across multiple servers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: normalize(base_url.into()),
        }
    }

    /// Base HTTP URL of the queue server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Submit a workflow graph for execution.
    ///
    /// Sends `POST /prompt` with the graph wrapped in a `prompt` field and
    /// a fresh `client_id` (UUID v4). The graph is treated as an opaque
    /// document; no structure beyond valid JSON is assumed.
    ///
    /// Returns the server-assigned job identifier, guaranteed non-empty.
    pub async fn submit(&self, workflow: &serde_json::Value) -> Result<JobId, SubmitError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SubmitError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let raw = body
            .get("prompt_id")
            .and_then(serde_json::Value::as_str)
            .ok_or(SubmitError::MissingJobId)?;
        let job_id = JobId::new(raw).ok_or(SubmitError::EmptyJobId)?;

        tracing::info!(job_id = %job_id, "Workflow submitted to queue");

        Ok(job_id)
    }
}

/// Strip a trailing slash so URL joins stay predictable.
fn normalize(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = ComfyClient::new("http://localhost:8188/");
        assert_eq!(client.base_url(), "http://localhost:8188");
    }

    #[test]
    fn base_url_without_slash_is_unchanged() {
        let client = ComfyClient::new("http://localhost:8188");
        assert_eq!(client.base_url(), "http://localhost:8188");
    }
}
