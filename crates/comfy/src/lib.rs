//! REST client for a ComfyUI-compatible generation queue.
//!
//! Provides workflow submission over `POST /prompt`, bounded polling of
//! `GET /history/{id}` until a job's result appears, and extraction of
//! typed output references (served file URLs) from the result document.

pub mod client;
pub mod history;
pub mod outputs;
pub mod poll;

pub use client::{ComfyClient, SubmitError};
pub use history::JobResult;
pub use outputs::{
    extract_outputs, select_output, OutputError, OutputFile, OutputReference, SelectionPolicy,
};
pub use poll::{PollConfig, PollError};
