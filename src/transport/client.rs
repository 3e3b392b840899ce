use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error_handling::types::{CaptureError, ConnectError, SendError};
use crate::ingestion::payload::{encode_image, CaptureAck, CaptureRequest, DeviceInfo};
use crate::network::frames::{read_frame, write_frame, ChannelFrame};
use crate::transport::capture_source::{CaptureSource, DeviceCapabilities};

/// Connection lifecycle of the transport client.
///
/// `Disconnected → Connecting → Connected → Disconnected`; every failure
/// path lands back in `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Connected,
}

/// Device-side client for the collector's persistent channel.
///
/// Owns the socket and, optionally, the capture source whose resources it
/// must tear down whenever the connection goes away for any reason. One
/// `send_capture` call is exactly one capture attempt: a transport failure
/// loses the event, nothing is queued for resend.
pub struct TransportClient {
    capabilities: DeviceCapabilities,
    source: Option<Box<dyn CaptureSource>>,
    state: ClientState,
    connection: Option<(BufReader<OwnedReadHalf>, OwnedWriteHalf)>,
}

impl TransportClient {
    pub fn new(capabilities: DeviceCapabilities, source: Option<Box<dyn CaptureSource>>) -> Self {
        Self {
            capabilities,
            source,
            state: ClientState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Open the persistent channel to the collector.
    ///
    /// Failure leaves the client `Disconnected`; retry policy is the
    /// caller's.
    pub async fn connect(&mut self, server_addr: &str) -> Result<(), ConnectError> {
        if self.state == ClientState::Connected {
            return Err(ConnectError::AlreadyConnected);
        }
        if !server_addr.contains(':') {
            return Err(ConnectError::BadAddress(format!(
                "{} (expected host:port)",
                server_addr
            )));
        }

        self.state = ClientState::Connecting;
        let stream = match TcpStream::connect(server_addr).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = ClientState::Disconnected;
                return Err(ConnectError::Io(e));
            }
        };
        let (read_half, write_half) = stream.into_split();
        self.connection = Some((BufReader::new(read_half), write_half));
        self.state = ClientState::Connected;
        info!(
            "Connected to collector at {} as {} ({})",
            server_addr, self.capabilities.device_name, self.capabilities.platform
        );
        Ok(())
    }

    /// Acquire one frame from the capture source.
    pub fn acquire(&mut self) -> Result<Vec<u8>, CaptureError> {
        match self.source.as_mut() {
            Some(source) => source.acquire(),
            None => Err(CaptureError::AcquireFailed(
                "capture source released".to_string(),
            )),
        }
    }

    /// Submit one capture and wait for the collector's acknowledgement.
    ///
    /// The image is carried losslessly as a base64 data URI with the
    /// capability descriptor and timestamp attached. Broadcast frames that
    /// arrive before the ack are skipped; they are observer traffic. Any
    /// transport failure tears the connection down, capture source included.
    pub async fn send_capture(
        &mut self,
        image: &[u8],
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<CaptureAck, SendError> {
        let mut connection = self.connection.take().ok_or(SendError::NotConnected)?;

        let frame = ChannelFrame::Capture(CaptureRequest {
            image: encode_image(image),
            device_info: DeviceInfo {
                platform: Some(self.capabilities.platform.clone()),
                device_name: Some(self.capabilities.device_name.clone()),
                udid: self.capabilities.udid.clone(),
            },
            timestamp,
        });

        match exchange(&mut connection, &frame).await {
            Ok(ack) => {
                debug!("Capture acknowledged: {:?}", ack.status);
                self.connection = Some(connection);
                Ok(ack)
            }
            // An unreadable ack is a protocol wart, not a dead transport.
            Err(e @ SendError::BadAck(_)) => {
                self.connection = Some(connection);
                Err(e)
            }
            Err(e) => {
                drop(connection);
                self.teardown("transport failure during capture");
                Err(e)
            }
        }
    }

    /// Close the channel and release the capture source.
    pub async fn disconnect(&mut self) {
        if self.state == ClientState::Connected {
            self.teardown("client disconnect");
        }
    }

    /// Drop the socket, release held device resources, return to
    /// `Disconnected`. Runs on every disconnect path, not only graceful
    /// ones; idempotent.
    fn teardown(&mut self, reason: &str) {
        let had_connection = self.connection.take().is_some();
        if had_connection || self.state == ClientState::Connected {
            info!("Connection torn down: {}", reason);
        }
        if let Some(mut source) = self.source.take() {
            source.release();
        }
        self.state = ClientState::Disconnected;
    }
}

impl Drop for TransportClient {
    fn drop(&mut self) {
        self.teardown("client dropped");
    }
}

/// One request/ack round trip on an open connection.
async fn exchange(
    connection: &mut (BufReader<OwnedReadHalf>, OwnedWriteHalf),
    frame: &ChannelFrame,
) -> Result<CaptureAck, SendError> {
    let (reader, writer) = (&mut connection.0, &mut connection.1);
    write_frame(writer, frame).await?;
    loop {
        match read_frame(reader).await {
            Ok(Some(ChannelFrame::Ack(ack))) => return Ok(ack),
            Ok(Some(ChannelFrame::ArtifactCreated(_))) => continue,
            Ok(Some(_)) => {
                warn!("Unexpected frame while waiting for ack");
                continue;
            }
            Ok(None) => return Err(SendError::ConnectionClosed),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(SendError::BadAck(e.to_string()));
            }
            Err(e) => return Err(SendError::Io(e)),
        }
    }
}
