//! Pipeline-level events.
//!
//! High-level state changes emitted while a stage runs, broadcast via a
//! [`tokio::sync::broadcast`] channel. Subscribe through
//! [`crate::Pipeline::subscribe`].

use mvforge_core::{JobId, Timestamp};
use serde::Serialize;

/// A state change for one pipeline stage.
#[derive(Debug, Clone, Serialize)]
pub enum PipelineEvent {
    /// A stage's workflow was accepted by the queue.
    StageQueued {
        template: String,
        job_id: JobId,
        queued_at: Timestamp,
    },

    /// A stage finished and its outputs were extracted.
    StageCompleted {
        template: String,
        job_id: JobId,
        output_count: usize,
    },

    /// A stage failed while polling for its result.
    StageFailed {
        template: String,
        job_id: JobId,
        error: String,
    },
}
