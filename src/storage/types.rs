use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A screenshot persisted under the storage root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}
