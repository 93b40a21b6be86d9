//! Generation pipeline: externalized workflow templates, stage
//! definitions, and a runner that chains template rendering, queue
//! submission, result polling, and output extraction.

pub mod events;
pub mod runner;
pub mod stages;
pub mod templates;
pub mod views;

pub use events::PipelineEvent;
pub use runner::{Pipeline, StageError, StageOutcome};
pub use stages::StageRequest;
pub use templates::{TemplateError, TemplateRegistry};
pub use views::{label_views, view_filename, ViewLabelError};
