use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::session_management::SessionStatus;

/// One connected device agent on the persistent channel.
///
/// Platform and device name are unknown at accept time; they are filled in
/// from the first capture frame that carries device info.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSession {
    pub id: Uuid,
    pub remote_addr: SocketAddr,
    pub platform: Option<String>,
    pub device_name: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl DeviceSession {
    pub fn new(id: Uuid, remote_addr: SocketAddr) -> Self {
        Self {
            id,
            remote_addr,
            platform: None,
            device_name: None,
            connected_at: Utc::now(),
            status: SessionStatus::Connected,
        }
    }
}
