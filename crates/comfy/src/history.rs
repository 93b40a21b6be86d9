//! History entry (job result) document types.
//!
//! The history endpoint responds with a mapping from job id to entry.
//! An entry's `outputs` field maps node ids to whatever that node
//! produced; everything below the node level is kept as raw JSON and
//! interpreted lazily by [`crate::outputs`].

use serde::{Deserialize, Serialize};

/// The result document for one finished job.
///
/// Present in the history response only once the job has completed;
/// absence of the job's key means "not yet", never an error. Repeated
/// reads of the same entry are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Output documents keyed by node id, in document order.
    #[serde(default)]
    pub outputs: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_outputs_in_document_order() {
        let json = r#"{"outputs":{"9":{"images":[]},"3":{"images":[]},"12":{"images":[]}}}"#;
        let result: JobResult = serde_json::from_str(json).unwrap();
        let keys: Vec<&String> = result.outputs.keys().collect();
        assert_eq!(keys, vec!["9", "3", "12"]);
    }

    #[test]
    fn missing_outputs_field_defaults_to_empty() {
        let result: JobResult = serde_json::from_str(r#"{"prompt":[]}"#).unwrap();
        assert!(result.outputs.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"outputs":{},"status":{"completed":true},"meta":{}}"#;
        let result: JobResult = serde_json::from_str(json).unwrap();
        assert!(result.outputs.is_empty());
    }
}
