use serde::Serialize;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Server-assigned identifier for a queued generation job.
///
/// The format is owned entirely by the remote queue; the only local
/// guarantee is non-emptiness. Used as the correlation key when polling
/// the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a raw identifier, rejecting empty strings.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Camera views produced by the multiview stage.
///
/// The order of [`ViewAngle::ALL`] matches the emission order of the
/// multiview workflow's view selector (front, back, left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAngle {
    Front,
    Back,
    Left,
}

impl ViewAngle {
    /// All views in workflow emission order.
    pub const ALL: [ViewAngle; 3] = [ViewAngle::Front, ViewAngle::Back, ViewAngle::Left];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewAngle::Front => "front",
            ViewAngle::Back => "back",
            ViewAngle::Left => "left",
        }
    }
}

impl std::fmt::Display for ViewAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
