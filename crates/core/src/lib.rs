//! Shared domain types for the mvforge platform.

pub mod types;

pub use types::{JobId, Timestamp, ViewAngle};
