use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use regex::Regex;
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::storage::namer::{artifact_name, sanitize_platform};
use crate::storage::types::StoredArtifact;

/// Extensions the catalog exposes. Everything else under the root (staging
/// files included) is invisible to listing and retrieval.
const LISTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Retrieval accepts plain filenames only: no leading dot, no separators,
/// nothing that could point outside the storage root.
const FILENAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";

/// Upper bound on same-second name disambiguation attempts.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Flat-directory artifact store.
///
/// One file per screenshot, named by the namer module. Writes are staged in a
/// hidden temp file and committed with a create-exclusive link, so a name is
/// either fully written and visible or absent; the catalog never sees a
/// half-written artifact and two concurrent writers can never claim the same
/// name.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            error!("Failed to create storage root {}: {}", root.display(), e);
            StorageError::CreateFailed
        })?;
        info!("FileStorage initialized at {}", root.display());
        Ok(Self { root })
    }

    /// Construct FileStorage using env var LUCARNE_STORAGE_DIR if set,
    /// otherwise a `screenshots` directory under the current directory.
    pub fn new_default() -> Result<Self, StorageError> {
        if let Ok(dir) = std::env::var("LUCARNE_STORAGE_DIR") {
            info!("Using FileStorage from LUCARNE_STORAGE_DIR: {}", dir);
            return Self::new(PathBuf::from(dir));
        }
        Self::new(PathBuf::from("screenshots"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Commit one decoded screenshot under the next free name for
    /// `(platform, timestamp)`.
    ///
    /// The payload is written in full to a hidden staging file first, then
    /// linked into its final name. `hard_link` fails with `AlreadyExists`
    /// instead of overwriting, so the existence check and the create are one
    /// atomic step; on a same-second collision the namer's counter suffix is
    /// bumped and the commit retried. The staging file is removed on every
    /// path out of this function.
    pub fn store_artifact(
        &self,
        platform: &str,
        timestamp: DateTime<Utc>,
        bytes: &[u8],
    ) -> Result<StoredArtifact, StorageError> {
        let platform = sanitize_platform(platform);
        let staging = self.root.join(format!(".incoming-{}", Uuid::new_v4()));

        let write_result = File::create(&staging).and_then(|mut f| f.write_all(bytes));
        if let Err(e) = write_result {
            error!("Failed to stage artifact in {}: {}", staging.display(), e);
            let _ = fs::remove_file(&staging);
            return Err(StorageError::WriteFailed);
        }

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = artifact_name(&platform, timestamp, attempt);
            let path = self.root.join(&filename);
            match fs::hard_link(&staging, &path) {
                Ok(()) => {
                    let _ = fs::remove_file(&staging);
                    let created_at = fs::metadata(&path)
                        .map(|m| file_creation_time(&m))
                        .unwrap_or_else(|_| Utc::now());
                    info!("Stored artifact {} ({} byte(s))", filename, bytes.len());
                    return Ok(StoredArtifact {
                        filename,
                        path,
                        size_bytes: bytes.len() as u64,
                        created_at,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("Name {} already taken, disambiguating", filename);
                }
                Err(e) => {
                    error!("Failed to commit artifact {}: {}", path.display(), e);
                    let _ = fs::remove_file(&staging);
                    return Err(StorageError::WriteFailed);
                }
            }
        }

        error!(
            "Exhausted {} name candidates for platform {} at {}",
            MAX_NAME_ATTEMPTS, platform, timestamp
        );
        let _ = fs::remove_file(&staging);
        Err(StorageError::WriteFailed)
    }

    /// Enumerate stored artifacts, newest first.
    ///
    /// Reads the filesystem on every call; the sort key is the file creation
    /// time (descending), with the filename as a descending tie-break so
    /// same-second artifacts order deterministically.
    pub fn list_artifacts(&self) -> Result<Vec<StoredArtifact>, StorageError> {
        let mut artifacts = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| {
            error!("Failed to read storage root {}: {}", self.root.display(), e);
            StorageError::ReadFailed
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Dir entry error: {}", e);
                StorageError::ReadFailed
            })?;
            let path = entry.path();
            let filename = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if filename.starts_with('.') {
                continue;
            }
            let listed = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| LISTED_EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !listed {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            artifacts.push(StoredArtifact {
                filename,
                size_bytes: metadata.len(),
                created_at: file_creation_time(&metadata),
                path,
            });
        }
        artifacts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        debug!("Listed {} artifact(s)", artifacts.len());
        Ok(artifacts)
    }

    /// Read the raw bytes of one stored artifact by filename.
    ///
    /// The name is validated before any filesystem access; anything that is
    /// not a plain artifact filename (separators, leading dots, traversal
    /// sequences) is rejected as invalid rather than resolved.
    pub fn read_artifact(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let valid = Regex::new(FILENAME_PATTERN)
            .map(|re| re.is_match(filename))
            .unwrap_or(false);
        if !valid || filename.contains("..") {
            warn!("Rejected artifact filename: {:?}", filename);
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        let path = self.root.join(filename);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("Read {} byte(s) from {}", bytes.len(), path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => {
                error!("Read failed {}: {}", path.display(), e);
                Err(StorageError::ReadFailed)
            }
        }
    }
}

/// Creation time of a file, falling back to mtime on filesystems that do not
/// record birth time.
fn file_creation_time(metadata: &fs::Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
