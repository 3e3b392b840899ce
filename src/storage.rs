//! Storage subsystem
//!
//! This module provides the filesystem-backed persistence for screenshot
//! artifacts.
//!
//! Components:
//! - `file_storage`: flat-directory store with atomic, collision-free commits
//!   and the uncached newest-first catalog.
//! - `namer`: the `screenshot_<platform>_<timestamp>` filename contract.
//! - `types`: shared artifact metadata types.

pub mod file_storage;
pub mod namer;
pub mod types;

pub use file_storage::FileStorage;
pub use types::StoredArtifact;
