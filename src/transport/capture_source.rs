use std::path::PathBuf;

use log::{debug, info};

use crate::error_handling::types::CaptureError;

/// Capability descriptor for a device agent.
///
/// Passed into the transport client at construction; the client never
/// inspects the host OS to guess what it is driving.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub platform: String,
    pub device_name: String,
    pub udid: Option<String>,
}

impl DeviceCapabilities {
    pub fn new(platform: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            device_name: device_name.into(),
            udid: None,
        }
    }

    pub fn with_udid(mut self, udid: impl Into<String>) -> Self {
        self.udid = Some(udid.into());
        self
    }
}

/// Source of raw screenshot bytes.
///
/// `release` tears down whatever device resources the source holds; the
/// transport client calls it on every disconnect path, graceful or not.
pub trait CaptureSource: Send {
    fn acquire(&mut self) -> Result<Vec<u8>, CaptureError>;
    fn release(&mut self);
}

/// Capture source that replays a prepared image file.
///
/// Stands in for a real device automation backend; the agent binary points
/// it at a PNG on disk.
pub struct FileCaptureSource {
    path: PathBuf,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileCaptureSource {
    fn acquire(&mut self) -> Result<Vec<u8>, CaptureError> {
        let bytes = std::fs::read(&self.path)?;
        if bytes.is_empty() {
            return Err(CaptureError::AcquireFailed(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        debug!("Acquired {} byte(s) from {}", bytes.len(), self.path.display());
        Ok(bytes)
    }

    fn release(&mut self) {
        info!("Capture source for {} released", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_reads_image() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"png-bytes").unwrap();

        let mut source = FileCaptureSource::new(file.path());
        assert_eq!(source.acquire().unwrap(), b"png-bytes");
    }

    #[test]
    fn test_file_source_rejects_empty_and_missing_files() {
        let file = NamedTempFile::new().unwrap();
        let mut empty = FileCaptureSource::new(file.path());
        assert!(matches!(
            empty.acquire(),
            Err(CaptureError::AcquireFailed(_))
        ));

        let mut missing = FileCaptureSource::new("/nonexistent/shot.png");
        assert!(matches!(missing.acquire(), Err(CaptureError::Io(_))));
    }
}
