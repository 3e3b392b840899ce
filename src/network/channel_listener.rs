//! # Channel Listener Module
//!
//! This module provides the persistent-channel endpoint for device agents.
//! Each accepted TCP connection carries newline-delimited JSON frames:
//! `capture` frames flow in, `ack` frames flow back to the submitting
//! device, and `artifactCreated` frames are fanned out to every connected
//! observer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ Device agents   │───▶│ ChannelListener  │───▶│ IngestionHandler │
//! │ (persistent TCP)│    │                  │    │ (shared w/ HTTP) │
//! └─────────────────┘    │ - session registry    └──────────────────┘
//!                        │ - per-conn tasks            │
//!                        │ - ack writer        EventBroadcaster ──▶ observers
//!                        └──────────────────┘
//! ```
//!
//! Every connection runs in its own task; a stalled device never blocks
//! another device's ingestion or an observer's notification. The single
//! writer task per connection multiplexes acks and broadcast frames, so a
//! given observer sees events in broadcast order.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::broadcast::EventBroadcaster;
use crate::error_handling::types::ChannelError;
use crate::ingestion::payload::CaptureAck;
use crate::ingestion::IngestionHandler;
use crate::network::frames::{write_frame, ChannelFrame};
use crate::session_management::SessionManager;

/// Persistent-channel endpoint for device agents.
pub struct ChannelListener {
    handler: Arc<IngestionHandler>,
    sessions: Arc<SessionManager>,
    broadcaster: EventBroadcaster,
}

impl ChannelListener {
    pub fn new(
        handler: Arc<IngestionHandler>,
        sessions: Arc<SessionManager>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            handler,
            sessions,
            broadcaster,
        }
    }

    /// Bind the channel socket. Split from [`serve`](Self::serve) so callers
    /// can bind port 0 and read back the assigned address.
    pub async fn bind(&self, addr: SocketAddr) -> Result<TcpListener, ChannelError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind channel listener on {}: {}", addr, e);
            ChannelError::BindError(e)
        })?;
        Ok(listener)
    }

    /// Accept connections forever, one spawned task per device.
    pub async fn serve(&self, listener: TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!("Channel listening on {}", addr),
            Err(e) => warn!("Channel listening (local addr unavailable: {})", e),
        }
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let handler = Arc::clone(&self.handler);
                    let sessions = Arc::clone(&self.sessions);
                    let broadcaster = self.broadcaster.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, peer, handler, sessions, broadcaster).await
                        {
                            error!("Channel connection error from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Drive one device connection from accept to close.
///
/// The session is registered before the first frame and unregistered on
/// every exit path. The reader half processes frames sequentially (per-device
/// capture order is the connection order); the writer half runs as its own
/// task so broadcast fan-out never waits on a device's next frame.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<IngestionHandler>,
    sessions: Arc<SessionManager>,
    broadcaster: EventBroadcaster,
) -> Result<(), ChannelError> {
    let session_id = sessions.register(peer);
    let (reader, writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let (ack_tx, mut ack_rx) = mpsc::channel::<ChannelFrame>(16);
    let mut observer = broadcaster.subscribe();
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        loop {
            tokio::select! {
                frame = ack_rx.recv() => match frame {
                    Some(frame) => {
                        if write_frame(&mut writer, &frame).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                event = observer.recv() => match event {
                    Some(event) => {
                        let frame = ChannelFrame::ArtifactCreated(event);
                        if write_frame(&mut writer, &frame).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });

    let result = read_frames(&mut reader, &ack_tx, &handler, &sessions, session_id).await;

    // Closing the ack channel lets the writer task drain and exit.
    drop(ack_tx);
    let _ = writer_task.await;
    sessions.unregister(session_id);
    result
}

async fn read_frames(
    reader: &mut BufReader<OwnedReadHalf>,
    ack_tx: &mpsc::Sender<ChannelFrame>,
    handler: &IngestionHandler,
    sessions: &SessionManager,
    session_id: Uuid,
) -> Result<(), ChannelError> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(ChannelError::SockError)?;
        if n == 0 {
            debug!("Device disconnected (session {})", session_id);
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ack = match serde_json::from_str::<ChannelFrame>(trimmed) {
            Ok(ChannelFrame::Capture(request)) => {
                sessions.describe(
                    session_id,
                    request.device_info.platform.as_deref(),
                    request.device_info.device_name.as_deref(),
                );
                match handler.ingest(request) {
                    Ok(artifact) => CaptureAck::success(artifact.filename),
                    Err(e) => CaptureAck::error(e.to_string()),
                }
            }
            Ok(_) => {
                warn!("Unexpected frame type from session {}", session_id);
                CaptureAck::error("unexpected frame on device channel")
            }
            Err(e) => {
                warn!("Failed to parse channel frame from {}: {}", session_id, e);
                CaptureAck::error(format!("parse error: {}", e))
            }
        };

        if ack_tx.send(ChannelFrame::Ack(ack)).await.is_err() {
            // Writer is gone; the connection is effectively closed.
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::payload::{encode_image, CaptureRequest, DeviceInfo};
    use crate::network::frames::read_frame;
    use crate::storage::FileStorage;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    struct TestChannel {
        _dir: TempDir,
        addr: SocketAddr,
        storage: Arc<FileStorage>,
        sessions: Arc<SessionManager>,
        broadcaster: EventBroadcaster,
    }

    async fn start_channel() -> TestChannel {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let broadcaster = EventBroadcaster::new(64);
        let sessions = Arc::new(SessionManager::new());
        let handler = Arc::new(IngestionHandler::new(
            Arc::clone(&storage),
            broadcaster.clone(),
        ));
        let listener = ChannelListener::new(handler, Arc::clone(&sessions), broadcaster.clone());

        let bound = listener
            .bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();
        tokio::spawn(async move { listener.serve(bound).await });

        TestChannel {
            _dir: dir,
            addr,
            storage,
            sessions,
            broadcaster,
        }
    }

    fn capture_line(platform: &str) -> String {
        let frame = ChannelFrame::Capture(CaptureRequest {
            image: encode_image(b"channel-capture"),
            device_info: DeviceInfo {
                platform: Some(platform.to_string()),
                device_name: Some("test-device".to_string()),
                udid: None,
            },
            timestamp: None,
        });
        format!("{}\n", serde_json::to_string(&frame).unwrap())
    }

    async fn next_ack(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> CaptureAck {
        loop {
            match read_frame(reader).await.unwrap() {
                Some(ChannelFrame::Ack(ack)) => return ack,
                Some(_) => continue,
                None => panic!("connection closed before ack"),
            }
        }
    }

    #[tokio::test]
    async fn test_capture_over_channel_is_acked_and_stored() {
        let channel = start_channel().await;

        let stream = TcpStream::connect(channel.addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half
            .write_all(capture_line("Android").as_bytes())
            .await
            .unwrap();

        let ack = next_ack(&mut reader).await;
        assert!(ack.is_success());
        let filename = ack.filename.unwrap();
        assert!(filename.starts_with("screenshot_Android_"));
        assert_eq!(
            channel.storage.read_artifact(&filename).unwrap(),
            b"channel-capture"
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_gets_error_ack_and_connection_survives() {
        let channel = start_channel().await;

        let stream = TcpStream::connect(channel.addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half.write_all(b"{not json}\n").await.unwrap();
        let ack = next_ack(&mut reader).await;
        assert!(!ack.is_success());
        assert!(channel.storage.list_artifacts().unwrap().is_empty());

        // Same connection still ingests.
        write_half
            .write_all(capture_line("iOS").as_bytes())
            .await
            .unwrap();
        let ack = next_ack(&mut reader).await;
        assert!(ack.is_success());
    }

    #[tokio::test]
    async fn test_bad_payload_is_nacked_without_artifact() {
        let channel = start_channel().await;

        let stream = TcpStream::connect(channel.addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let frame = ChannelFrame::Capture(CaptureRequest {
            image: "missing-the-delimiter".to_string(),
            device_info: DeviceInfo::default(),
            timestamp: None,
        });
        write_half
            .write_all(format!("{}\n", serde_json::to_string(&frame).unwrap()).as_bytes())
            .await
            .unwrap();

        let ack = next_ack(&mut reader).await;
        assert_eq!(ack.status, "error");
        assert!(ack.message.is_some());
        assert!(channel.storage.list_artifacts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_connections_receive_artifact_created() {
        let channel = start_channel().await;

        // Observer connects first and sends nothing.
        let observer_stream = TcpStream::connect(channel.addr).await.unwrap();
        let (observer_read, _observer_write) = observer_stream.into_split();
        let mut observer_reader = BufReader::new(observer_read);

        // Give the observer's connection task time to subscribe.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let stream = TcpStream::connect(channel.addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        write_half
            .write_all(capture_line("Android").as_bytes())
            .await
            .unwrap();
        let ack = next_ack(&mut reader).await;
        let filename = ack.filename.unwrap();

        match read_frame(&mut observer_reader).await.unwrap() {
            Some(ChannelFrame::ArtifactCreated(event)) => {
                assert_eq!(event.status, "success");
                assert_eq!(event.filename, filename);
            }
            other => panic!("expected artifactCreated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sessions_are_registered_and_released() {
        let channel = start_channel().await;
        assert_eq!(channel.sessions.active_count(), 0);

        let stream = TcpStream::connect(channel.addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(channel.sessions.active_count(), 1);

        drop(stream);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(channel.sessions.active_count(), 0);
        assert_eq!(channel.broadcaster.observer_count(), 0);
    }
}
