//! Bounded polling of the history endpoint.
//!
//! [`ComfyClient::await_result`] re-reads `GET /history/{id}` at a fixed
//! interval until the job's entry appears. Attempts are strictly
//! sequential; the call occupies its task for the full wait, so callers
//! wanting concurrency spawn one task per job.
//!
//! Each attempt is classified rather than swallowed: a missing key is
//! `Pending`, transport errors and 5xx responses are transient (bounded
//! by a consecutive-failure budget), and a non-404 client error is a
//! terminal rejection.

use std::time::Duration;

use mvforge_core::JobId;
use tokio_util::sync::CancellationToken;

use crate::client::ComfyClient;
use crate::history::JobResult;

/// Tunable parameters for one polling call.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status reads.
    pub interval: Duration,
    /// Upper bound on total wait. `None` polls until cancelled.
    pub timeout: Option<Duration>,
    /// Consecutive hard failures tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: None,
            max_consecutive_failures: 5,
        }
    }
}

/// Errors from a polling call.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// No result appeared within the configured timeout.
    #[error("No result for job {job_id} within {waited:?}")]
    Timeout {
        /// The job being polled.
        job_id: JobId,
        /// Total time spent waiting.
        waited: Duration,
    },

    /// The cancellation token fired before a result appeared.
    #[error("Polling cancelled for job {job_id}")]
    Cancelled { job_id: JobId },

    /// Too many consecutive attempts failed hard (transport error,
    /// malformed body, or 5xx response).
    #[error("{failures} consecutive poll failures for job {job_id}, last: {last}")]
    Transient {
        job_id: JobId,
        failures: u32,
        last: String,
    },

    /// The history endpoint rejected the request with a non-transient
    /// client error. The job is treated as failed.
    #[error("History endpoint rejected job {job_id} ({status}): {body}")]
    Rejected {
        job_id: JobId,
        status: u16,
        body: String,
    },
}

/// Outcome of a single status read.
#[derive(Debug)]
pub(crate) enum Attempt {
    Ready(Box<JobResult>),
    Pending,
    Transient(String),
    Rejected { status: u16, body: String },
}

/// Classify a 2xx history response body for the given job.
///
/// The body is expected to be a JSON object keyed by job id. A missing
/// key means the job is still pending; a malformed body or an entry that
/// does not deserialize is a transient failure.
pub(crate) fn classify_history_body(job_id: &JobId, body: &str) -> Attempt {
    let document: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return Attempt::Transient(format!("malformed history body: {e}")),
    };

    let Some(entry) = document.get(job_id.as_str()) else {
        return Attempt::Pending;
    };

    match serde_json::from_value::<JobResult>(entry.clone()) {
        Ok(result) => Attempt::Ready(Box::new(result)),
        Err(e) => Attempt::Transient(format!("undecodable history entry: {e}")),
    }
}

impl ComfyClient {
    /// Read the history endpoint once and classify the outcome.
    async fn poll_once(&self, job_id: &JobId) -> Attempt {
        let url = format!("{}/history/{}", self.base_url(), job_id);
        let response = match self.http().get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transient(format!("request failed: {e}")),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // Some servers 404 unknown ids instead of returning an
            // empty mapping. Equivalent to "not yet".
            return Attempt::Pending;
        }
        if status.is_client_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Attempt::Rejected {
                status: status.as_u16(),
                body,
            };
        }
        if !status.is_success() {
            return Attempt::Transient(format!("HTTP {status}"));
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => return Attempt::Transient(format!("unreadable body: {e}")),
        };
        classify_history_body(job_id, &body)
    }

    /// Wait for a job's result to appear in the history store.
    ///
    /// Polls until the entry is present (returned immediately, no final
    /// sleep), the timeout elapses, the consecutive-failure budget is
    /// exhausted, or `cancel` fires. Re-polling an already-finished job
    /// is an idempotent read and returns the identical result.
    pub async fn await_result(
        &self,
        job_id: &JobId,
        config: &PollConfig,
        cancel: &CancellationToken,
    ) -> Result<JobResult, PollError> {
        let started = tokio::time::Instant::now();
        let mut consecutive_failures = 0u32;

        loop {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(PollError::Cancelled { job_id: job_id.clone() });
                }
                attempt = self.poll_once(job_id) => attempt,
            };

            match attempt {
                Attempt::Ready(result) => {
                    tracing::info!(
                        job_id = %job_id,
                        waited_ms = started.elapsed().as_millis() as u64,
                        "Job result available",
                    );
                    return Ok(*result);
                }
                Attempt::Pending => {
                    consecutive_failures = 0;
                    tracing::debug!(job_id = %job_id, "Job still pending");
                }
                Attempt::Transient(reason) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        job_id = %job_id,
                        failures = consecutive_failures,
                        reason = %reason,
                        "History poll attempt failed",
                    );
                    if consecutive_failures >= config.max_consecutive_failures {
                        return Err(PollError::Transient {
                            job_id: job_id.clone(),
                            failures: consecutive_failures,
                            last: reason,
                        });
                    }
                }
                Attempt::Rejected { status, body } => {
                    return Err(PollError::Rejected {
                        job_id: job_id.clone(),
                        status,
                        body,
                    });
                }
            }

            // Give up before a sleep that cannot finish inside the budget.
            if let Some(timeout) = config.timeout {
                if started.elapsed() + config.interval >= timeout {
                    return Err(PollError::Timeout {
                        job_id: job_id.clone(),
                        waited: started.elapsed(),
                    });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(PollError::Cancelled { job_id: job_id.clone() });
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }
}
