use serde::{Deserialize, Serialize};

/// Notification fanned out to observers when an artifact lands on disk.
///
/// Mirrors the acknowledgement sent to the submitting device: a status field
/// plus the server-assigned filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEvent {
    pub status: String,
    pub filename: String,
}

impl ArtifactEvent {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            filename: filename.into(),
        }
    }
}
