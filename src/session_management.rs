//! Session management core module.
//!
//! Explicit registry of device sessions on the persistent channel, replacing
//! any ambient global connection state with add/remove operations on a
//! locked map.

use serde::{Deserialize, Serialize};

/// Submodule for session data structures.
pub mod session;
/// Submodule for the session manager implementation.
pub mod session_manager;

pub use session::DeviceSession;
pub use session_manager::SessionManager;

/// Represents the current status of a device session.
///
/// `Connected` is the only live state; `Disconnected` is terminal. A
/// reconnecting device opens a brand-new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionStatus {
    Connected,
    Disconnected,
}
