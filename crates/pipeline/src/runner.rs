//! Stage runner: render -> submit -> await -> extract.
//!
//! [`Pipeline`] owns the queue client and template registry and runs one
//! stage per call. It holds no per-job state, so any number of stages
//! may run concurrently from separate tasks sharing one `Arc<Pipeline>`.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use mvforge_comfy::{
    extract_outputs, ComfyClient, JobResult, OutputReference, PollConfig, PollError, SubmitError,
};
use mvforge_core::JobId;

use crate::events::PipelineEvent;
use crate::stages::StageRequest;
use crate::templates::{TemplateError, TemplateRegistry};

/// Broadcast channel capacity for pipeline events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runs generation stages against one queue server.
pub struct Pipeline {
    client: ComfyClient,
    registry: TemplateRegistry,
    poll: PollConfig,
    /// Public URL prefix where output files are served.
    output_base_url: String,
    event_tx: broadcast::Sender<PipelineEvent>,
}

/// Everything produced by one finished stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Correlation id assigned by the queue.
    pub job_id: JobId,
    /// The raw result document.
    pub result: JobResult,
    /// Output references in document order.
    pub outputs: Vec<OutputReference>,
}

/// Errors from running a stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Template lookup or rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The queue did not accept the workflow.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Polling for the result failed.
    #[error(transparent)]
    Poll(#[from] PollError),
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// * `output_base_url` - public prefix for served output files,
    ///   e.g. `http://host:8000/images`.
    pub fn new(
        client: ComfyClient,
        registry: TemplateRegistry,
        poll: PollConfig,
        output_base_url: impl Into<String>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            registry,
            poll,
            output_base_url: output_base_url.into(),
            event_tx,
        }
    }

    /// Subscribe to stage lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.event_tx.subscribe()
    }

    /// Public URL prefix for served output files.
    pub fn output_base_url(&self) -> &str {
        &self.output_base_url
    }

    /// Run one stage to completion.
    ///
    /// Blocks the calling task for the stage's full duration. `cancel`
    /// stops the polling wait promptly; the remote job itself is not
    /// interrupted.
    pub async fn run_stage(
        &self,
        request: &StageRequest,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome, StageError> {
        let template = request.template_name();
        let workflow = self.registry.render(template, &request.params())?;

        let job_id = self.client.submit(&workflow).await?;
        tracing::info!(template, job_id = %job_id, "Stage submitted");
        let _ = self.event_tx.send(PipelineEvent::StageQueued {
            template: template.to_string(),
            job_id: job_id.clone(),
            queued_at: chrono::Utc::now(),
        });

        let result = match self.client.await_result(&job_id, &self.poll, cancel).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(template, job_id = %job_id, error = %e, "Stage failed");
                let _ = self.event_tx.send(PipelineEvent::StageFailed {
                    template: template.to_string(),
                    job_id: job_id.clone(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let outputs: Vec<OutputReference> =
            extract_outputs(&result, &self.output_base_url).collect();

        tracing::info!(
            template,
            job_id = %job_id,
            output_count = outputs.len(),
            "Stage completed",
        );
        let _ = self.event_tx.send(PipelineEvent::StageCompleted {
            template: template.to_string(),
            job_id: job_id.clone(),
            output_count: outputs.len(),
        });

        Ok(StageOutcome {
            job_id,
            result,
            outputs,
        })
    }
}
