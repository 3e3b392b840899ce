use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};

use crate::broadcast::{ArtifactEvent, EventBroadcaster};
use crate::error_handling::types::IngestError;
use crate::ingestion::payload::{decode_image, CaptureRequest};
use crate::storage::{FileStorage, StoredArtifact};

/// The single ingestion path behind both transports.
///
/// The persistent channel and the one-shot upload endpoint hand their
/// payloads here unchanged; they differ only in how the result travels back
/// (ack frame vs. HTTP status). Validation, decoding, naming, the atomic
/// write, and the observer fan-out all live in this one place.
pub struct IngestionHandler {
    storage: Arc<FileStorage>,
    broadcaster: EventBroadcaster,
}

impl IngestionHandler {
    pub fn new(storage: Arc<FileStorage>, broadcaster: EventBroadcaster) -> Self {
        Self {
            storage,
            broadcaster,
        }
    }

    pub fn storage(&self) -> &Arc<FileStorage> {
        &self.storage
    }

    /// Validate, decode, and commit one capture; notify observers on success.
    ///
    /// A rejected payload leaves the catalog untouched. A storage failure is
    /// logged for operators and surfaced to the submitter; it is not retried
    /// here. The broadcast fires only after the artifact is durably visible.
    pub fn ingest(&self, request: CaptureRequest) -> Result<StoredArtifact, IngestError> {
        let bytes = match decode_image(&request.image) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Rejected capture payload: {}", e);
                return Err(e);
            }
        };

        let platform = request
            .device_info
            .platform
            .as_deref()
            .unwrap_or("unknown");
        let timestamp = request.timestamp.unwrap_or_else(Utc::now);

        let artifact = self
            .storage
            .store_artifact(platform, timestamp, &bytes)
            .map_err(|e| {
                error!("Capture from platform {} failed to persist: {}", platform, e);
                IngestError::StorageFailure(e)
            })?;

        info!(
            "Ingested capture from {} ({} byte(s)) as {}",
            request
                .device_info
                .device_name
                .as_deref()
                .unwrap_or(platform),
            artifact.size_bytes,
            artifact.filename
        );
        self.broadcaster
            .broadcast(ArtifactEvent::success(&artifact.filename));
        Ok(artifact)
    }
}
