//! Extraction of output references from a job result.
//!
//! A node's output document can hold any number of list-valued fields
//! (`images`, `mesh`, ...); every list element carrying a `filename` is
//! one produced file. Extraction walks the result in document order and
//! performs no reordering or deduplication.

use serde::{Deserialize, Serialize};

use crate::history::JobResult;

/// One file descriptor inside a node's output list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    /// File name within the server's output directory.
    pub filename: String,
    /// Subdirectory under the output directory, if any.
    #[serde(default)]
    pub subfolder: Option<String>,
    /// Server-side classification (`output`, `temp`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A resolvable locator for one file produced by a completed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputReference {
    /// Id of the node that produced the file.
    pub node: String,
    /// File name as reported by the server.
    pub filename: String,
    /// Subdirectory under the server's output directory, if any.
    pub subfolder: Option<String>,
    /// Serving URL: `base_url + "/" + filename`.
    pub url: String,
}

impl OutputReference {
    /// Path of the file relative to the shared output directory.
    pub fn relative_path(&self) -> std::path::PathBuf {
        match self.subfolder.as_deref() {
            Some(sub) if !sub.is_empty() => std::path::Path::new(sub).join(&self.filename),
            _ => std::path::PathBuf::from(&self.filename),
        }
    }
}

/// How to pick a single reference when a result holds several.
///
/// Passed explicitly by callers; there is no implicit default, so the
/// choice is never an accident of document order.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPolicy {
    /// First reference in document order.
    First,
    /// Last reference in document order.
    Last,
    /// First reference produced by the named node.
    Node(String),
}

/// Errors from output selection.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The job completed but no extractable reference matched.
    #[error("Job completed without a matching output reference")]
    NotFound,
}

/// Iterate every output reference in a job result.
///
/// Lazy, finite, and restartable. Nodes are visited in document order,
/// list elements in list order; entries without a `filename` are
/// skipped. A result with no output-bearing nodes yields nothing, which
/// is not an error.
pub fn extract_outputs<'a>(
    result: &'a JobResult,
    base_url: &'a str,
) -> impl Iterator<Item = OutputReference> + 'a {
    let base = base_url.trim_end_matches('/');
    result.outputs.iter().flat_map(move |(node, output)| {
        node_files(output).map(move |file| OutputReference {
            node: node.clone(),
            url: format!("{}/{}", base, file.filename),
            filename: file.filename,
            subfolder: file.subfolder,
        })
    })
}

/// Pick one output reference according to an explicit policy.
pub fn select_output(
    result: &JobResult,
    base_url: &str,
    policy: &SelectionPolicy,
) -> Result<OutputReference, OutputError> {
    let mut outputs = extract_outputs(result, base_url);
    let selected = match policy {
        SelectionPolicy::First => outputs.next(),
        SelectionPolicy::Last => outputs.last(),
        SelectionPolicy::Node(node) => outputs.find(|reference| reference.node == *node),
    };
    selected.ok_or(OutputError::NotFound)
}

/// Yield every file descriptor in one node's output document.
fn node_files(output: &serde_json::Value) -> impl Iterator<Item = OutputFile> + '_ {
    output
        .as_object()
        .into_iter()
        .flat_map(|fields| fields.values())
        .filter_map(serde_json::Value::as_array)
        .flatten()
        .filter_map(|entry| serde_json::from_value::<OutputFile>(entry.clone()).ok())
}
