//! Artifact filename derivation.
//!
//! Names follow `screenshot_<platform>_<YYYYMMDD_HHMMSS>.png`. The timestamp
//! carries second resolution only, so concurrent captures from the same
//! platform within the same second produce the same base name; callers
//! disambiguate by bumping `attempt`, which inserts a `_<n>` counter before
//! the extension. Uniqueness on disk is enforced by the storage layer's
//! create-exclusive commit, not by the name alone.

use chrono::{DateTime, Utc};

/// All artifacts are committed as PNG, matching the agents' capture encoding.
pub const ARTIFACT_EXTENSION: &str = "png";

/// Reduce a client-supplied platform string to filename-safe characters.
///
/// Keeps ASCII alphanumerics and `-`; everything else is dropped. An empty
/// result (absent or fully invalid input) falls back to `unknown` so the
/// filename format always holds.
pub fn sanitize_platform(platform: &str) -> String {
    let cleaned: String = platform
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Derive the candidate filename for the given attempt.
///
/// Attempt 0 is the plain timestamped name; attempt `n` (n >= 1) yields the
/// `_<n+1>` disambiguation suffix.
pub fn artifact_name(platform: &str, timestamp: DateTime<Utc>, attempt: u32) -> String {
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("screenshot_{}_{}.{}", platform, stamp, ARTIFACT_EXTENSION)
    } else {
        format!(
            "screenshot_{}_{}_{}.{}",
            platform,
            stamp,
            attempt + 1,
            ARTIFACT_EXTENSION
        )
    }
}
