use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use log::{info, warn};
use uuid::Uuid;

use crate::session_management::session::DeviceSession;

/// Registry of live device sessions on the persistent channel.
///
/// Connection handlers register on accept and unregister on every exit path;
/// there is no other way in or out of the map, and no ambient global state.
/// A session that disconnects is gone; a reconnecting device registers a
/// brand-new one.
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, DeviceSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Add a session for a newly-accepted connection and return its handle.
    pub fn register(&self, remote_addr: SocketAddr) -> Uuid {
        let id = Uuid::new_v4();
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, DeviceSession::new(id, remote_addr));
            info!(
                "Session {} registered for {} ({} active)",
                id,
                remote_addr,
                sessions.len()
            );
        }
        id
    }

    /// Record the identity a device reported in its first capture frame.
    pub fn describe(&self, id: Uuid, platform: Option<&str>, device_name: Option<&str>) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some(session) = sessions.get_mut(&id) {
                if session.platform.is_none() {
                    session.platform = platform.map(str::to_string);
                }
                if session.device_name.is_none() {
                    session.device_name = device_name.map(str::to_string);
                }
            }
        }
    }

    /// Drop a session. Disconnection is terminal; the entry is removed.
    pub fn unregister(&self, id: Uuid) {
        if let Ok(mut sessions) = self.sessions.lock() {
            match sessions.remove(&id) {
                Some(session) => info!(
                    "Session {} closed for {} ({} active)",
                    id,
                    session.remote_addr,
                    sessions.len()
                ),
                None => warn!("Unregister for unknown session {}", id),
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<DeviceSession> {
        self.sessions
            .lock()
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
